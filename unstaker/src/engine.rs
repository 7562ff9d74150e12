use crate::{
    builder::{SignedBatch, TransactionBuilder},
    planner::Batch,
    retry::{Pacing, Timer},
    Error,
};
use antelope_lib::ChainApi;
use log::{info, warn};

/// Resource weights of the reference account, compared before and after a
/// push to decide whether the batch landed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidationSnapshot {
    pub cpu_weight: i64,
    pub net_weight: i64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub validated: usize,
    pub skipped: usize,
    pub pushed: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchOutcome {
    Validated { submissions: usize },
    /// Nothing to undelegate, no transaction was sent.
    Skipped,
}

enum State {
    Built(SignedBatch),
    Submitted,
    Validating { grace_checked: bool },
    Resubmit,
    Validated,
}

/// Pushes batches one at a time and confirms each one on chain before
/// moving to the next.
pub struct Engine<'a, A: ChainApi + ?Sized> {
    api: &'a A,
    builder: TransactionBuilder<'a, A>,
    timer: &'a dyn Timer,
    pacing: Pacing,
}

impl<'a, A: ChainApi + ?Sized> Engine<'a, A> {
    pub fn new(
        api: &'a A,
        builder: TransactionBuilder<'a, A>,
        timer: &'a dyn Timer,
        pacing: Pacing,
    ) -> Self {
        Self {
            api,
            builder,
            timer,
            pacing,
        }
    }

    pub fn run(&self, batches: &[Batch<'_>]) -> Result<RunSummary, Error> {
        let mut summary = RunSummary::default();
        for (index, batch) in batches.iter().enumerate() {
            info!("Processing chunk #{}", index);
            match self.process_batch(index, batch)? {
                BatchOutcome::Validated { submissions } => {
                    summary.validated += 1;
                    summary.pushed += submissions;
                }
                BatchOutcome::Skipped => summary.skipped += 1,
            }
        }
        Ok(summary)
    }

    fn snapshot(&self, account: &str) -> Result<ValidationSnapshot, Error> {
        let info = self
            .api
            .get_account(account)
            .map_err(|source| Error::AccountLookup {
                account: account.to_string(),
                source,
            })?;
        Ok(ValidationSnapshot {
            cpu_weight: info.cpu_weight,
            net_weight: info.net_weight,
        })
    }

    pub fn process_batch(&self, index: usize, batch: Batch<'_>) -> Result<BatchOutcome, Error> {
        let reductions = self.builder.reductions(batch);
        let reference = match (batch.first(), reductions.first()) {
            (Some(first), Some(reduction)) => {
                if reduction.account != first.account {
                    warn!(
                        "Chunk #{}: {} has nothing to unstake, its weights cannot confirm the transaction",
                        index, first.account
                    );
                }
                first.account.clone()
            }
            _ => {
                info!("Chunk #{} has nothing to unstake, skipping", index);
                return Ok(BatchOutcome::Skipped);
            }
        };

        let baseline = self.snapshot(&reference)?;
        let mut submissions = 0;
        let mut state = match self.builder.build(&reductions)? {
            Some(signed) => State::Built(signed),
            None => return Ok(BatchOutcome::Skipped),
        };

        loop {
            state = match state {
                State::Built(signed) => {
                    submissions += 1;
                    let response = self
                        .api
                        .push_transaction(&signed.packed)
                        .map_err(Error::Push)?;
                    info!(
                        "Transaction ID: {}, waiting {:.1} seconds and validating...",
                        response.transaction_id,
                        self.pacing.settle.as_secs_f64()
                    );
                    State::Submitted
                }
                State::Submitted => {
                    self.timer.sleep(self.pacing.settle);
                    State::Validating {
                        grace_checked: false,
                    }
                }
                State::Validating { grace_checked } => {
                    info!("Validating...");
                    if self.snapshot(&reference)? != baseline {
                        State::Validated
                    } else {
                        warn!("Transaction failed (CPU/NET weight not changed)");
                        if grace_checked {
                            warn!("Could not validate transaction. Re-sending it.");
                            State::Resubmit
                        } else {
                            info!(
                                "Retrying validation in {:.1} seconds...",
                                self.pacing.grace.as_secs_f64()
                            );
                            self.timer.sleep(self.pacing.grace);
                            State::Validating {
                                grace_checked: true,
                            }
                        }
                    }
                }
                State::Resubmit => {
                    if !self.pacing.resubmit.allows(submissions + 1) {
                        return Err(Error::ResubmissionsExhausted {
                            batch: index,
                            submissions,
                        });
                    }
                    self.timer.sleep(self.pacing.resubmit.delay);
                    match self.builder.build(&reductions)? {
                        Some(signed) => State::Built(signed),
                        None => return Ok(BatchOutcome::Skipped),
                    }
                }
                State::Validated => {
                    info!("Transaction validated.");
                    return Ok(BatchOutcome::Validated { submissions });
                }
            };
        }
    }
}
