use crate::{
    config::{Settings, StakeThresholds},
    retry::Timer,
    scanner::DelegateeRecord,
};
use antelope_lib::{
    api::PushTransactionResponse, AccountInfo, ApiError, Asset, ChainApi, ChainInfo,
    PackedTransaction, PrivateKey, Signer, Symbol, TableRows, TableRowsRequest,
};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const CHAIN_ID: &str = "1064487b3cd1a897ce03ae5b6a865651747e2e152090f99c1d19d44e01aea5a4";
pub const BLOCK_ID: &str = "0f5cd9a8b2b0b3a1e7c9a8e4c2d1f0e9a1b2c3d4e5f60718293a4b5c6d7e8f90";
pub const DEV_WIF: &str = "5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD3";

/// Clock that only moves when slept on.
pub struct SimulatedTimer {
    now: Cell<SystemTime>,
    sleeps: RefCell<Vec<Duration>>,
}

impl Default for SimulatedTimer {
    fn default() -> Self {
        Self {
            now: Cell::new(UNIX_EPOCH + Duration::from_secs(1_700_000_000)),
            sleeps: RefCell::new(Vec::new()),
        }
    }
}

impl SimulatedTimer {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }
}

impl Timer for SimulatedTimer {
    fn now(&self) -> SystemTime {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
        self.sleeps.borrow_mut().push(duration);
    }
}

fn unavailable(what: &str) -> ApiError {
    ApiError::Status {
        status: 500,
        body: format!("no scripted {}", what),
    }
}

/// In-memory node answering from queued responses and recording requests.
#[derive(Default)]
pub struct ScriptedChain {
    pages: RefCell<VecDeque<Result<TableRows, ApiError>>>,
    table_requests: RefCell<Vec<TableRowsRequest>>,
    info_failures: Cell<usize>,
    info_calls: Cell<usize>,
    accounts: RefCell<VecDeque<Result<(i64, i64), ()>>>,
    account_requests: RefCell<Vec<String>>,
    pushes: RefCell<Vec<PackedTransaction>>,
    reject_pushes: Cell<bool>,
}

impl ScriptedChain {
    pub fn push_page(&self, page: Result<TableRows, ApiError>) {
        self.pages.borrow_mut().push_back(page);
    }

    pub fn table_requests(&self) -> Vec<TableRowsRequest> {
        self.table_requests.borrow().clone()
    }

    /// The next `n` chain info calls fail.
    pub fn fail_info(&self, n: usize) {
        self.info_failures.set(n);
    }

    pub fn info_calls(&self) -> usize {
        self.info_calls.get()
    }

    /// Queues the `(cpu_weight, net_weight)` of the next account read.
    pub fn push_account(&self, weights: Result<(i64, i64), ()>) {
        self.accounts.borrow_mut().push_back(weights);
    }

    pub fn account_requests(&self) -> Vec<String> {
        self.account_requests.borrow().clone()
    }

    pub fn reject_pushes(&self) {
        self.reject_pushes.set(true);
    }

    pub fn pushes(&self) -> Vec<PackedTransaction> {
        self.pushes.borrow().clone()
    }
}

impl ChainApi for ScriptedChain {
    fn get_table_rows(&self, request: &TableRowsRequest) -> Result<TableRows, ApiError> {
        self.table_requests.borrow_mut().push(request.clone());
        self.pages
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(unavailable("page")))
    }

    fn get_info(&self) -> Result<ChainInfo, ApiError> {
        self.info_calls.set(self.info_calls.get() + 1);
        if self.info_failures.get() > 0 {
            self.info_failures.set(self.info_failures.get() - 1);
            return Err(unavailable("info"));
        }
        Ok(ChainInfo {
            chain_id: CHAIN_ID.to_string(),
            head_block_id: BLOCK_ID.to_string(),
            head_block_num: 0x0f5cd9a8,
        })
    }

    fn get_account(&self, account: &str) -> Result<AccountInfo, ApiError> {
        self.account_requests.borrow_mut().push(account.to_string());
        match self.accounts.borrow_mut().pop_front() {
            Some(Ok((cpu_weight, net_weight))) => Ok(AccountInfo {
                account_name: account.to_string(),
                cpu_weight,
                net_weight,
            }),
            _ => Err(unavailable("account")),
        }
    }

    fn push_transaction(
        &self,
        transaction: &PackedTransaction,
    ) -> Result<PushTransactionResponse, ApiError> {
        if self.reject_pushes.get() {
            return Err(ApiError::Status {
                status: 500,
                body: "expired transaction".to_string(),
            });
        }
        let mut pushes = self.pushes.borrow_mut();
        pushes.push(transaction.clone());
        Ok(PushTransactionResponse {
            transaction_id: format!("{:064x}", pushes.len()),
        })
    }
}

pub fn wax(amount: i64) -> Asset {
    Asset::new(amount, Symbol::new(8, "WAX").unwrap())
}

pub fn delband_row(account: &str, cpu: i64, net: i64) -> serde_json::Value {
    serde_json::json!({
        "from": "provider",
        "to": account,
        "net_weight": wax(net).to_string(),
        "cpu_weight": wax(cpu).to_string(),
    })
}

pub fn page(rows: Vec<serde_json::Value>, more: bool, next_key: &str) -> TableRows {
    TableRows {
        rows,
        more,
        next_key: next_key.to_string(),
    }
}

pub fn record(account: &str, cpu: i64, net: i64) -> DelegateeRecord {
    DelegateeRecord {
        account: account.to_string(),
        cpu_weight: wax(cpu),
        net_weight: wax(net),
    }
}

pub fn settings(chunk_size: usize) -> Settings {
    Settings {
        authority: "provider".parse().unwrap(),
        permission: "cpustake".parse().unwrap(),
        chunk_size,
        thresholds: StakeThresholds::new(100, 100).unwrap(),
    }
}

pub fn test_signers() -> Vec<Box<dyn Signer>> {
    vec![Box::new(DEV_WIF.parse::<PrivateKey>().unwrap())]
}
