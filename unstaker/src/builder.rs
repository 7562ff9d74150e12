use crate::{
    config::{Settings, StakeThresholds},
    planner::{plan_reductions, Batch, PlannedReduction},
    retry::{RetryPolicy, Timer},
    Error,
};
use antelope_lib::{
    serialize::{Pack, Writer},
    Action, Asset, ChainApi, Name, PackedTransaction, PermissionLevel, Signer, Transaction,
    TxOptions,
};
use log::debug;
use std::time::Duration;

/// Comfortably inside the chain's maximum transaction lifetime.
pub const TRANSACTION_LIFETIME: Duration = Duration::from_secs(55 * 60);

const SYSTEM_ACCOUNT: Name = Name::from_u64(0x5530ea0000000000); // eosio
const UNDELEGATEBW: Name = Name::from_u64(0xd4d2a8a986ca8fc0); // undelegatebw

/// Payload of `eosio::undelegatebw`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UndelegateBw {
    pub from: Name,
    pub receiver: Name,
    pub unstake_net_quantity: Asset,
    pub unstake_cpu_quantity: Asset,
}

impl Pack for UndelegateBw {
    fn pack(&self, writer: &mut Writer) {
        writer.write_name(&self.from);
        writer.write_name(&self.receiver);
        self.unstake_net_quantity.pack(writer);
        self.unstake_cpu_quantity.pack(writer);
    }
}

/// A signed transaction ready to push, with the header it was built from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedBatch {
    pub transaction: Transaction,
    pub packed: PackedTransaction,
}

pub struct TransactionBuilder<'a, A: ChainApi + ?Sized> {
    api: &'a A,
    timer: &'a dyn Timer,
    authority: Name,
    permission: Name,
    thresholds: StakeThresholds,
    signers: Vec<Box<dyn Signer>>,
    tx_options_retry: RetryPolicy,
}

impl<'a, A: ChainApi + ?Sized> TransactionBuilder<'a, A> {
    pub fn new(
        api: &'a A,
        timer: &'a dyn Timer,
        settings: &Settings,
        signers: Vec<Box<dyn Signer>>,
        tx_options_retry: RetryPolicy,
    ) -> Self {
        Self {
            api,
            timer,
            authority: settings.authority,
            permission: settings.permission,
            thresholds: settings.thresholds,
            signers,
            tx_options_retry,
        }
    }

    pub fn reductions(&self, batch: Batch<'_>) -> Vec<PlannedReduction> {
        plan_reductions(batch, &self.thresholds)
    }

    pub fn actions(&self, reductions: &[PlannedReduction]) -> Result<Vec<Action>, Error> {
        let authorization = vec![PermissionLevel {
            actor: self.authority,
            permission: self.permission,
        }];
        reductions
            .iter()
            .map(|reduction| -> Result<Action, Error> {
                let payload = UndelegateBw {
                    from: self.authority,
                    receiver: reduction.account.parse()?,
                    unstake_net_quantity: reduction.new_net.clone(),
                    unstake_cpu_quantity: reduction.new_cpu.clone(),
                };
                Ok(Action::new(
                    SYSTEM_ACCOUNT,
                    UNDELEGATEBW,
                    authorization.clone(),
                    &payload,
                ))
            })
            .collect()
    }

    /// Fresh reference block and chain id. Failures are retried per policy.
    fn tx_options(&self) -> Result<TxOptions, Error> {
        self.tx_options_retry
            .retry(self.timer, "filling tx opts", || -> Result<TxOptions, Error> {
                let info = self.api.get_info().map_err(Error::TxOptions)?;
                Ok(TxOptions::from_chain(&info.chain_id, &info.head_block_id)?)
            })
    }

    /// Builds and signs one transaction for `reductions`.
    ///
    /// Returns `None` without touching the chain when there is nothing to
    /// undelegate.
    pub fn build(&self, reductions: &[PlannedReduction]) -> Result<Option<SignedBatch>, Error> {
        if reductions.is_empty() {
            return Ok(None);
        }
        let actions = self.actions(reductions)?;
        let opts = self.tx_options()?;

        let mut transaction = Transaction::new(actions, &opts);
        transaction.set_expiration(self.timer.now(), TRANSACTION_LIFETIME)?;

        let mut packed = transaction.pack_unsigned();
        for signer in &self.signers {
            packed.sign_with(&opts.chain_id, signer.as_ref())?;
        }
        debug!(
            "built transaction with {} actions, {} signatures, expiring at {}",
            transaction.actions.len(),
            packed.signatures.len(),
            transaction.expiration
        );

        Ok(Some(SignedBatch {
            transaction,
            packed,
        }))
    }
}
