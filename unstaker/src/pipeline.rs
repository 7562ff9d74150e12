use crate::{
    accounts::AllowSet,
    builder::TransactionBuilder,
    config::Settings,
    engine::{Engine, RunSummary},
    planner::{plan, plan_reductions, Batch},
    retry::{Pacing, Timer},
    scanner::Scanner,
    Error,
};
use antelope_lib::{ChainApi, Signer};
use log::info;

/// What a run found and did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Report {
    /// Delegatees left after filtering.
    pub records: usize,
    pub batches: usize,
    /// Zeroed on dry runs.
    pub summary: RunSummary,
}

/// Scan, plan, submit, reconcile.
pub struct Pipeline<'a, A: ChainApi + ?Sized> {
    api: &'a A,
    timer: &'a dyn Timer,
    pacing: Pacing,
}

impl<'a, A: ChainApi + ?Sized> Pipeline<'a, A> {
    pub fn new(api: &'a A, timer: &'a dyn Timer, pacing: Pacing) -> Self {
        Self { api, timer, pacing }
    }

    pub fn run(
        &self,
        settings: &Settings,
        allow_set: &AllowSet,
        signers: Vec<Box<dyn Signer>>,
        dry_run: bool,
    ) -> Result<Report, Error> {
        let scope = settings.authority.to_string();
        let records = Scanner::new(self.api, self.timer, self.pacing.scan).scan(
            &scope,
            allow_set,
            &settings.thresholds,
        )?;
        info!("Found {} accounts to unstake", records.len());

        let batches = plan(&records, settings.chunk_size);
        info!("Chunks: {}", batches.len());
        let mut report = Report {
            records: records.len(),
            batches: batches.len(),
            ..Report::default()
        };
        if batches.is_empty() {
            info!("No chunks to process.");
            return Ok(report);
        }

        if dry_run {
            log_plan(&batches, settings);
            return Ok(report);
        }

        let builder = TransactionBuilder::new(
            self.api,
            self.timer,
            settings,
            signers,
            self.pacing.tx_options,
        );
        report.summary = Engine::new(self.api, builder, self.timer, self.pacing).run(&batches)?;
        info!(
            "Done: {} chunks validated, {} skipped, {} transactions pushed",
            report.summary.validated, report.summary.skipped, report.summary.pushed
        );
        Ok(report)
    }
}

fn log_plan(batches: &[Batch<'_>], settings: &Settings) {
    for (index, batch) in batches.iter().enumerate() {
        let reductions = plan_reductions(batch, &settings.thresholds);
        info!("Chunk #{}: {} actions", index, reductions.len());
        for reduction in reductions {
            info!(
                "  {} -> cpu {}, net {}",
                reduction.account, reduction.new_cpu, reduction.new_net
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{delband_row, page, settings, test_signers, ScriptedChain, SimulatedTimer};

    fn allow() -> AllowSet {
        ["aaa", "bbb", "ccc"].into_iter().collect()
    }

    #[test]
    fn nothing_found_is_not_an_error() {
        let chain = ScriptedChain::default();
        chain.push_page(Ok(page(vec![delband_row("zzz", 900, 900)], false, "")));
        let timer = SimulatedTimer::default();

        let report = Pipeline::new(&chain, &timer, Pacing::default())
            .run(&settings(2), &allow(), test_signers(), false)
            .unwrap();
        assert_eq!(report, Report::default());
        assert_eq!(chain.info_calls(), 0);
        assert!(chain.account_requests().is_empty());
    }

    #[test]
    fn dry_run_never_pushes() {
        let chain = ScriptedChain::default();
        chain.push_page(Ok(page(
            vec![
                delband_row("aaa", 500, 500),
                delband_row("bbb", 300, 300),
                delband_row("ccc", 700, 700),
            ],
            false,
            "",
        )));
        let timer = SimulatedTimer::default();

        let report = Pipeline::new(&chain, &timer, Pacing::default())
            .run(&settings(2), &allow(), test_signers(), true)
            .unwrap();
        assert_eq!(report.records, 3);
        assert_eq!(report.batches, 2);
        assert_eq!(report.summary, RunSummary::default());
        assert_eq!(chain.info_calls(), 0);
        assert!(chain.pushes().is_empty());
    }

    #[test]
    fn scans_the_authority_scope() {
        let chain = ScriptedChain::default();
        chain.push_page(Ok(page(vec![delband_row("aaa", 500, 500)], false, "")));
        chain.push_account(Ok((500, 500)));
        chain.push_account(Ok((100, 100)));
        let timer = SimulatedTimer::default();

        let report = Pipeline::new(&chain, &timer, Pacing::default())
            .run(&settings(2), &allow(), test_signers(), false)
            .unwrap();
        assert_eq!(chain.table_requests()[0].scope, "provider");
        assert_eq!(
            report.summary,
            RunSummary {
                validated: 1,
                skipped: 0,
                pushed: 1
            }
        );
    }
}
