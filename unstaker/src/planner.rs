use crate::{config::StakeThresholds, scanner::DelegateeRecord};
use antelope_lib::Asset;

/// A contiguous run of scanned records handled by a single transaction.
pub type Batch<'a> = &'a [DelegateeRecord];

/// Splits `records` in order into chunks of at most `chunk_size`.
///
/// A zero `chunk_size` plans nothing.
pub fn plan(records: &[DelegateeRecord], chunk_size: usize) -> Vec<Batch<'_>> {
    if chunk_size == 0 {
        return Vec::new();
    }
    records.chunks(chunk_size).collect()
}

/// The floor is deducted as a flat amount, it is not a level to land on.
pub fn reduce(amount: i64, floor: i64) -> i64 {
    if amount > floor {
        amount - floor
    } else {
        0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedReduction {
    pub account: String,
    pub new_cpu: Asset,
    pub new_net: Asset,
}

/// Reductions for every account of `batch` that has something to undelegate,
/// in batch order.
pub fn plan_reductions(batch: Batch<'_>, thresholds: &StakeThresholds) -> Vec<PlannedReduction> {
    batch
        .iter()
        .filter_map(|record| {
            let new_cpu = reduce(record.cpu_weight.amount, thresholds.cpu_floor());
            let new_net = reduce(record.net_weight.amount, thresholds.net_floor());
            if new_cpu == 0 && new_net == 0 {
                return None;
            }
            Some(PlannedReduction {
                account: record.account.clone(),
                new_cpu: record.cpu_weight.with_amount(new_cpu),
                new_net: record.net_weight.with_amount(new_net),
            })
        })
        .collect()
}
