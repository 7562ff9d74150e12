//! Chain vocabulary for Antelope/EOSIO style ledgers: names, assets, the
//! binary transaction format, K1 keys and a blocking RPC client.

pub mod api;
pub mod asset;
pub mod keys;
pub mod name;
pub mod serialize;
pub mod transaction;
pub mod utils;

pub use api::{AccountInfo, ApiError, ChainApi, ChainInfo, HttpChainApi, TableRows, TableRowsRequest};
pub use asset::{Asset, Symbol};
pub use keys::{K1Signature, KeyError, PrivateKey, Signer};
pub use name::Name;
pub use transaction::{Action, PackedTransaction, PermissionLevel, Transaction, TxOptions};
