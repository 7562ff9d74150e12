use antelope_lib::HttpChainApi;
use color_eyre::{eyre::WrapErr, Report};
use env_logger::Env;
use log::info;
use structopt::StructOpt;
use unstaker::{
    accounts::AllowSet,
    config::Config,
    retry::{Pacing, SystemTimer},
    Pipeline,
};

use std::path::PathBuf;

#[derive(StructOpt)]
#[structopt(rename_all = "kebab-case")]
pub struct Cli {
    /// Path to the TOML configuration with the `[config]` table
    #[structopt(long, default_value = "config.toml")]
    config: PathBuf,

    /// Newline separated list of delegatees that may be unstaked
    #[structopt(long, default_value = "accounts.txt")]
    accounts: PathBuf,

    /// Scan and plan only, log the reductions without sending anything
    #[structopt(long)]
    dry_run: bool,
}

impl Cli {
    pub fn exec(self) -> Result<(), Report> {
        let Cli {
            config,
            accounts,
            dry_run,
        } = self;

        let config = Config::load(&config)
            .wrap_err_with(|| format!("loading {}", config.display()))?;
        let settings = config.settings()?;
        let signers = config.signers()?;
        let allow_set = AllowSet::load(&accounts)
            .wrap_err_with(|| format!("loading {}", accounts.display()))?;
        info!(
            "{} allowed accounts, unstaking from {} with {} key(s)",
            allow_set.len(),
            settings.authority,
            signers.len()
        );

        let api = HttpChainApi::new(&config.wax_node)?;
        let timer = SystemTimer;
        Pipeline::new(&api, &timer, Pacing::default()).run(
            &settings,
            &allow_set,
            signers,
            dry_run,
        )?;
        Ok(())
    }
}

fn main() -> Result<(), Report> {
    color_eyre::install()?;
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    Cli::from_args().exec()
}
