use crate::{transaction::PackedTransaction, utils::serde::deserialize_i64_from_string_or_number};
use log::debug;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("node answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Body of `/v1/chain/get_table_rows`.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct TableRowsRequest {
    pub json: bool,
    pub code: String,
    pub scope: String,
    pub table: String,
    pub lower_bound: String,
    pub upper_bound: String,
    pub index_position: u32,
    pub key_type: String,
    pub limit: String,
    pub reverse: bool,
    pub show_payer: bool,
    pub index: u32,
}

impl TableRowsRequest {
    pub fn new(code: &str, scope: &str, table: &str, limit: u32) -> Self {
        Self {
            json: true,
            code: code.to_string(),
            scope: scope.to_string(),
            table: table.to_string(),
            lower_bound: "0".to_string(),
            upper_bound: String::new(),
            index_position: 1,
            key_type: String::new(),
            limit: limit.to_string(),
            reverse: false,
            show_payer: false,
            index: 1,
        }
    }
}

/// One page of a table read. Rows are left untyped, callers decode them.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct TableRows {
    pub rows: Vec<serde_json::Value>,
    #[serde(default)]
    pub more: bool,
    #[serde(default)]
    pub next_key: String,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ChainInfo {
    pub chain_id: String,
    pub head_block_id: String,
    pub head_block_num: u32,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AccountInfo {
    pub account_name: String,
    #[serde(deserialize_with = "deserialize_i64_from_string_or_number")]
    pub cpu_weight: i64,
    #[serde(deserialize_with = "deserialize_i64_from_string_or_number")]
    pub net_weight: i64,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PushTransactionResponse {
    pub transaction_id: String,
}

/// Subset of the chain RPC surface the tooling relies on.
pub trait ChainApi {
    fn get_table_rows(&self, request: &TableRowsRequest) -> Result<TableRows, ApiError>;

    fn get_info(&self) -> Result<ChainInfo, ApiError>;

    fn get_account(&self, account: &str) -> Result<AccountInfo, ApiError>;

    fn push_transaction(
        &self,
        transaction: &PackedTransaction,
    ) -> Result<PushTransactionResponse, ApiError>;
}

/// Blocking JSON client for a node's `/v1/chain` endpoints.
pub struct HttpChainApi {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpChainApi {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);
        let response = self.client.post(url).json(body).send()?;
        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(serde_json::from_str(&text)?)
    }
}

impl ChainApi for HttpChainApi {
    fn get_table_rows(&self, request: &TableRowsRequest) -> Result<TableRows, ApiError> {
        self.post("/v1/chain/get_table_rows", request)
    }

    fn get_info(&self) -> Result<ChainInfo, ApiError> {
        self.post("/v1/chain/get_info", &serde_json::json!({}))
    }

    fn get_account(&self, account: &str) -> Result<AccountInfo, ApiError> {
        self.post(
            "/v1/chain/get_account",
            &serde_json::json!({ "account_name": account }),
        )
    }

    fn push_transaction(
        &self,
        transaction: &PackedTransaction,
    ) -> Result<PushTransactionResponse, ApiError> {
        self.post("/v1/chain/push_transaction", &transaction.to_request())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_request_body() {
        let body = serde_json::to_value(TableRowsRequest::new("eosio", "provider", "delband", 10_000))
            .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "json": true,
                "code": "eosio",
                "scope": "provider",
                "table": "delband",
                "lower_bound": "0",
                "upper_bound": "",
                "index_position": 1,
                "key_type": "",
                "limit": "10000",
                "reverse": false,
                "show_payer": false,
                "index": 1
            })
        );
    }

    #[test]
    fn parse_table_page() {
        let page: TableRows = serde_json::from_str(
            r#"{
                "rows": [
                    {
                        "from": "provider",
                        "to": "alice",
                        "net_weight": "1.00000000 WAX",
                        "cpu_weight": "5.00000000 WAX"
                    }
                ],
                "more": true,
                "next_key": "3773036822876127232"
            }"#,
        )
        .unwrap();
        assert_eq!(page.rows.len(), 1);
        assert!(page.more);
        assert_eq!(page.next_key, "3773036822876127232");

        let last: TableRows = serde_json::from_str(r#"{"rows": []}"#).unwrap();
        assert!(!last.more);
        assert!(last.next_key.is_empty());
    }

    #[test]
    fn parse_account() {
        let account: AccountInfo = serde_json::from_str(
            r#"{
                "account_name": "alice",
                "head_block_num": 12,
                "cpu_weight": "150000000",
                "net_weight": 50000000,
                "ram_quota": 4000
            }"#,
        )
        .unwrap();
        assert_eq!(account.cpu_weight, 150_000_000);
        assert_eq!(account.net_weight, 50_000_000);
    }

    #[test]
    fn parse_info_and_push() {
        let info: ChainInfo = serde_json::from_str(
            r#"{
                "server_version": "d0a8a2e5",
                "chain_id": "1064487b3cd1a897ce03ae5b6a865651747e2e152090f99c1d19d44e01aea5a4",
                "head_block_num": 257813544,
                "head_block_id": "0f5dd2287b5b6c7b6a3c8e1c2f0f6c5c7e6d5c4b3a29180706f5e4d3c2b1a090"
            }"#,
        )
        .unwrap();
        assert_eq!(info.head_block_num, 257_813_544);

        let pushed: PushTransactionResponse = serde_json::from_str(
            r#"{"transaction_id": "abc123", "processed": {"receipt": {"status": "executed"}}}"#,
        )
        .unwrap();
        assert_eq!(pushed.transaction_id, "abc123");
    }

    #[test]
    fn base_url_is_normalized() {
        let api = HttpChainApi::new("https://wax.example/").unwrap();
        assert_eq!(api.base_url(), "https://wax.example");
    }
}
