use antelope_lib::{
    api::PushTransactionResponse, AccountInfo, ApiError, Asset, ChainApi, ChainInfo,
    PackedTransaction, Symbol, TableRows, TableRowsRequest,
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use unstaker::retry::Timer;

pub fn wax(amount: i64) -> Asset {
    Asset::new(amount, Symbol::new(8, "WAX").unwrap())
}

pub struct FakeClock {
    now: Cell<SystemTime>,
}

impl Default for FakeClock {
    fn default() -> Self {
        Self {
            now: Cell::new(UNIX_EPOCH + Duration::from_secs(1_700_000_000)),
        }
    }
}

impl Timer for FakeClock {
    fn now(&self) -> SystemTime {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.now.set(self.now.get() + duration)
    }
}

/// Node serving a single delband page. Every push halves the weights of all
/// known accounts, so the reference check sees a change.
pub struct FakeNode {
    rows: Vec<serde_json::Value>,
    weights: RefCell<HashMap<String, (i64, i64)>>,
    pushes: RefCell<Vec<PackedTransaction>>,
}

impl FakeNode {
    pub fn new(rows: &[(&str, i64, i64)]) -> Self {
        Self {
            rows: rows
                .iter()
                .map(|(account, cpu, net)| {
                    serde_json::json!({
                        "from": "provider",
                        "to": account,
                        "net_weight": wax(*net).to_string(),
                        "cpu_weight": wax(*cpu).to_string(),
                    })
                })
                .collect(),
            weights: RefCell::new(
                rows.iter()
                    .map(|(account, cpu, net)| (account.to_string(), (*cpu, *net)))
                    .collect(),
            ),
            pushes: RefCell::new(Vec::new()),
        }
    }

    pub fn pushes(&self) -> Vec<PackedTransaction> {
        self.pushes.borrow().clone()
    }
}

impl ChainApi for FakeNode {
    fn get_table_rows(&self, _request: &TableRowsRequest) -> Result<TableRows, ApiError> {
        Ok(TableRows {
            rows: self.rows.clone(),
            more: false,
            next_key: String::new(),
        })
    }

    fn get_info(&self) -> Result<ChainInfo, ApiError> {
        Ok(ChainInfo {
            chain_id: "1064487b3cd1a897ce03ae5b6a865651747e2e152090f99c1d19d44e01aea5a4"
                .to_string(),
            head_block_id: "0f5cd9a8b2b0b3a1e7c9a8e4c2d1f0e9a1b2c3d4e5f60718293a4b5c6d7e8f90"
                .to_string(),
            head_block_num: 0x0f5cd9a8,
        })
    }

    fn get_account(&self, account: &str) -> Result<AccountInfo, ApiError> {
        let (cpu_weight, net_weight) =
            self.weights
                .borrow()
                .get(account)
                .copied()
                .ok_or_else(|| ApiError::Status {
                    status: 500,
                    body: format!("unknown account {}", account),
                })?;
        Ok(AccountInfo {
            account_name: account.to_string(),
            cpu_weight,
            net_weight,
        })
    }

    fn push_transaction(
        &self,
        transaction: &PackedTransaction,
    ) -> Result<PushTransactionResponse, ApiError> {
        for weights in self.weights.borrow_mut().values_mut() {
            *weights = (weights.0 / 2, weights.1 / 2);
        }
        let mut pushes = self.pushes.borrow_mut();
        pushes.push(transaction.clone());
        Ok(PushTransactionResponse {
            transaction_id: format!("{:064x}", pushes.len()),
        })
    }
}
