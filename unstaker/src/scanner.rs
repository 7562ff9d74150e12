use crate::{
    accounts::AllowSet,
    config::StakeThresholds,
    retry::{RetryPolicy, Timer},
    Error,
};
use antelope_lib::{Asset, ChainApi, TableRowsRequest};
use log::{debug, info, warn};
use serde::Deserialize;

pub const SYSTEM_CONTRACT: &str = "eosio";
pub const DELBAND_TABLE: &str = "delband";
pub const PAGE_SIZE: u32 = 10_000;

/// A delegation from the authority, as read from the `delband` table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DelegateeRecord {
    pub account: String,
    pub cpu_weight: Asset,
    pub net_weight: Asset,
}

// Weights stay strings here: a bad asset is fatal, a bad row shape is not.
#[derive(Deserialize)]
struct DelbandRow {
    to: String,
    cpu_weight: String,
    net_weight: String,
}

struct Page {
    rows: Vec<DelbandRow>,
    more: bool,
    next_key: String,
}

pub struct Scanner<'a, A: ChainApi + ?Sized> {
    api: &'a A,
    timer: &'a dyn Timer,
    retry: RetryPolicy,
}

impl<'a, A: ChainApi + ?Sized> Scanner<'a, A> {
    pub fn new(api: &'a A, timer: &'a dyn Timer, retry: RetryPolicy) -> Self {
        Self { api, timer, retry }
    }

    /// Reads every delegation made by `scope`, keeping allow-listed
    /// delegatees with at least one weight at or above its floor.
    ///
    /// Rows come back in table order.
    pub fn scan(
        &self,
        scope: &str,
        allow_set: &AllowSet,
        thresholds: &StakeThresholds,
    ) -> Result<Vec<DelegateeRecord>, Error> {
        let mut request = TableRowsRequest::new(SYSTEM_CONTRACT, scope, DELBAND_TABLE, PAGE_SIZE);
        let mut records = Vec::new();
        let mut pages = 0usize;

        loop {
            let page = self.fetch_page(&request)?;
            pages += 1;
            debug!(
                "page {} from `{}`: {} rows, more: {}",
                pages,
                request.lower_bound,
                page.rows.len(),
                page.more
            );
            if page.rows.is_empty() {
                break;
            }

            for row in page.rows {
                if let Some(record) = filter_row(row, allow_set, thresholds)? {
                    records.push(record);
                }
            }

            if !page.more {
                break;
            }
            if page.next_key.is_empty() {
                warn!("node reported more rows without a continuation key, stopping scan");
                break;
            }
            request.lower_bound = page.next_key;
        }

        info!("Scanned {} pages of {}", pages, DELBAND_TABLE);
        Ok(records)
    }

    fn fetch_page(&self, request: &TableRowsRequest) -> Result<Page, Error> {
        self.retry.retry(self.timer, "Error fetching rows", || -> Result<Page, Error> {
            let response = self
                .api
                .get_table_rows(request)
                .map_err(Error::TableRows)?;
            let rows = response
                .rows
                .into_iter()
                .map(serde_json::from_value)
                .collect::<Result<Vec<DelbandRow>, _>>()
                .map_err(Error::RowDecode)?;
            Ok(Page {
                rows,
                more: response.more,
                next_key: response.next_key,
            })
        })
    }
}

fn parse_weight(account: &str, weight: &str) -> Result<Asset, Error> {
    weight.parse().map_err(|source| Error::MalformedAsset {
        account: account.to_string(),
        source,
    })
}

fn filter_row(
    row: DelbandRow,
    allow_set: &AllowSet,
    thresholds: &StakeThresholds,
) -> Result<Option<DelegateeRecord>, Error> {
    if !allow_set.contains(&row.to) {
        return Ok(None);
    }
    let cpu_weight = parse_weight(&row.to, &row.cpu_weight)?;
    let net_weight = parse_weight(&row.to, &row.net_weight)?;

    // nothing left to reclaim
    if cpu_weight.amount < thresholds.cpu_floor() && net_weight.amount < thresholds.net_floor() {
        return Ok(None);
    }

    Ok(Some(DelegateeRecord {
        account: row.to,
        cpu_weight,
        net_weight,
    }))
}
