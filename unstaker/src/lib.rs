//! Bulk undelegation of staked bandwidth from a provider account.
//!
//! The provider's `delband` rows are scanned, filtered against an operator
//! allow list and per-resource floors, then reduced in fixed-size batches of
//! `undelegatebw` actions. Every batch is confirmed on chain before the next
//! one is sent.

pub mod accounts;
pub mod builder;
pub mod config;
pub mod engine;
pub mod pipeline;
pub mod planner;
pub mod retry;
pub mod scanner;

#[cfg(test)]
mod testing;

use antelope_lib::{asset, name, transaction, ApiError};
use thiserror::Error;

pub use pipeline::Pipeline;

#[derive(Debug, Error)]
pub enum Error {
    #[error("reading delband rows: {0}")]
    TableRows(#[source] ApiError),
    #[error("decoding delband row: {0}")]
    RowDecode(#[source] serde_json::Error),
    #[error("delegation to {account} carries a malformed weight: {source}")]
    MalformedAsset {
        account: String,
        source: asset::Error,
    },
    #[error(transparent)]
    Name(#[from] name::Error),
    #[error("fetching chain info: {0}")]
    TxOptions(#[source] ApiError),
    #[error(transparent)]
    Transaction(#[from] transaction::Error),
    #[error("looking up account {account}: {source}")]
    AccountLookup { account: String, source: ApiError },
    #[error("pushing transaction: {0}")]
    Push(#[source] ApiError),
    #[error("chunk #{batch} was not validated after {submissions} submissions")]
    ResubmissionsExhausted { batch: usize, submissions: usize },
}
