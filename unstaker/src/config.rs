use antelope_lib::{name, KeyError, Name, PrivateKey, Signer};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Weights are stored with 8 decimal places on chain.
pub const WEIGHT_SCALE: u32 = 8;

const DEFAULT_PERMISSION: &str = "cpustake";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("no signing key configured")]
    NoKeys,
    #[error("chunk_size must be at least 1")]
    ChunkSize,
    #[error("invalid signing key #{index}: {source}")]
    Key { index: usize, source: KeyError },
    #[error("{field} must not be negative, got {value}")]
    NegativeFloor { field: &'static str, value: Decimal },
    #[error("{field} is too large, got {value}")]
    FloorOutOfRange { field: &'static str, value: Decimal },
    #[error("invalid {field}: {source}")]
    Name {
        field: &'static str,
        source: name::Error,
    },
}

/// Minimum cpu/net amounts, in the smallest currency unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StakeThresholds {
    cpu_floor: i64,
    net_floor: i64,
}

impl StakeThresholds {
    pub fn new(cpu_floor: i64, net_floor: i64) -> Result<Self, ConfigError> {
        if cpu_floor < 0 {
            return Err(ConfigError::NegativeFloor {
                field: "cpu_unstake_to",
                value: cpu_floor.into(),
            });
        }
        if net_floor < 0 {
            return Err(ConfigError::NegativeFloor {
                field: "net_unstake_to",
                value: net_floor.into(),
            });
        }
        Ok(Self {
            cpu_floor,
            net_floor,
        })
    }

    /// Scales both decimals by `10^8`, truncating toward zero.
    pub fn from_decimals(cpu: Decimal, net: Decimal) -> Result<Self, ConfigError> {
        Self::new(
            scale_floor("cpu_unstake_to", cpu)?,
            scale_floor("net_unstake_to", net)?,
        )
    }

    pub fn cpu_floor(&self) -> i64 {
        self.cpu_floor
    }

    pub fn net_floor(&self) -> i64 {
        self.net_floor
    }
}

fn scale_floor(field: &'static str, value: Decimal) -> Result<i64, ConfigError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ConfigError::NegativeFloor { field, value });
    }
    value
        .checked_mul(Decimal::from(10u64.pow(WEIGHT_SCALE)))
        .and_then(|scaled| scaled.trunc().to_i64())
        .ok_or(ConfigError::FloorOutOfRange { field, value })
}

#[derive(Deserialize)]
struct ConfigFile {
    config: Config,
}

/// Contents of the `[config]` table.
#[derive(Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub pkey: Option<String>,
    /// Extra keys, signing after `pkey`.
    #[serde(default)]
    pub keys: Vec<String>,
    pub account: String,
    pub wax_node: String,
    pub chunk_size: usize,
    pub net_unstake_to: Decimal,
    pub cpu_unstake_to: Decimal,
    #[serde(default = "default_permission")]
    pub permission: String,
}

fn default_permission() -> String {
    DEFAULT_PERMISSION.to_string()
}

/// Validated view of the configuration used by the pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub authority: Name,
    pub permission: Name,
    pub chunk_size: usize,
    pub thresholds: StakeThresholds,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(file.config)
    }

    pub fn settings(&self) -> Result<Settings, ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ChunkSize);
        }
        Ok(Settings {
            authority: self.account.parse().map_err(|source| ConfigError::Name {
                field: "account",
                source,
            })?,
            permission: self
                .permission
                .parse()
                .map_err(|source| ConfigError::Name {
                    field: "permission",
                    source,
                })?,
            chunk_size: self.chunk_size,
            thresholds: StakeThresholds::from_decimals(self.cpu_unstake_to, self.net_unstake_to)?,
        })
    }

    pub fn signers(&self) -> Result<Vec<Box<dyn Signer>>, ConfigError> {
        let signers = self
            .pkey
            .iter()
            .chain(self.keys.iter())
            .enumerate()
            .map(|(index, key)| {
                key.parse::<PrivateKey>()
                    .map(|key| Box::new(key) as Box<dyn Signer>)
                    .map_err(|source| ConfigError::Key { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if signers.is_empty() {
            return Err(ConfigError::NoKeys);
        }
        Ok(signers)
    }
}
