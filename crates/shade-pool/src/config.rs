//! pool configuration
//!
//! loaded from toml; every field has a default so an empty file is a valid
//! development config.
//!
//! ```toml
//! tree_depth = 20
//! root_history = 128
//! min_deposit = 1
//! assets = ["DOT", "USDC"]
//!
//! [[pairs]]
//! base = "DOT"
//! quote = "USDC"
//!
//! [batch]
//! max_orders = 64
//! epoch_ms = 12000
//! max_order_age_ms = 60000
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tree::MAX_DEPTH;
use crate::value::{Amount, AssetId, TradingPair};
use crate::verifier::{CircuitKind, VerifyingKey, VerifyingKeys};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("tree depth {0} outside 1..=32")]
    InvalidTreeDepth(u8),

    #[error("batch.max_orders must be at least 1")]
    MaxOrdersZero,

    #[error("batch.epoch_ms must be at least 1")]
    EpochZero,

    #[error("root_history {root_history} is shorter than batch.max_orders {max_orders}")]
    RootHistoryTooShort { root_history: usize, max_orders: usize },

    #[error("pair references unregistered asset {0}")]
    UnknownPairAsset(String),

    #[error("pair {0}/{0} trades an asset against itself")]
    SelfPair(String),

    #[error("asset {0} listed twice")]
    DuplicateAsset(String),

    #[error("failed to read config: {0}")]
    Io(String),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("bad {circuit} verifying key: {reason}")]
    BadKey { circuit: CircuitKind, reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolConfig {
    /// commitment tree depth, capacity is 2^depth
    pub tree_depth: u8,
    /// superseded roots still accepted by proofs
    pub root_history: usize,
    /// smallest accepted deposit
    pub min_deposit: u64,
    /// registered asset symbols
    pub assets: Vec<String>,
    pub pairs: Vec<PairConfig>,
    pub batch: BatchConfig,
    pub keys: KeyConfig,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            tree_depth: 20,
            root_history: 128,
            min_deposit: 1,
            assets: vec!["DOT".into(), "USDC".into()],
            pairs: vec![PairConfig {
                base: "DOT".into(),
                quote: "USDC".into(),
            }],
            batch: BatchConfig::default(),
            keys: KeyConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PairConfig {
    pub base: String,
    pub quote: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// close the epoch once this many orders are pending
    pub max_orders: usize,
    /// close the epoch once it has been open this long
    pub epoch_ms: u64,
    /// orders older than this at close are expired, not executed
    pub max_order_age_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_orders: 64,
            epoch_ms: 12_000,
            max_order_age_ms: 60_000,
        }
    }
}

/// hex-encoded verifying keys; unset keys fall back to the development keys
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeyConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deposit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub withdraw: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade: Option<String>,
}

impl KeyConfig {
    pub fn verifying_keys(&self) -> Result<VerifyingKeys, ConfigError> {
        let dev = VerifyingKeys::development();
        Ok(VerifyingKeys {
            deposit: decode_key(CircuitKind::Deposit, self.deposit.as_deref(), dev.deposit)?,
            withdraw: decode_key(CircuitKind::Withdraw, self.withdraw.as_deref(), dev.withdraw)?,
            trade: decode_key(CircuitKind::Trade, self.trade.as_deref(), dev.trade)?,
        })
    }
}

fn decode_key(
    circuit: CircuitKind,
    encoded: Option<&str>,
    fallback: VerifyingKey,
) -> Result<VerifyingKey, ConfigError> {
    let Some(encoded) = encoded else {
        return Ok(fallback);
    };
    let bytes = hex::decode(encoded.strip_prefix("0x").unwrap_or(encoded)).map_err(|e| {
        ConfigError::BadKey {
            circuit,
            reason: e.to_string(),
        }
    })?;
    if bytes.is_empty() {
        return Err(ConfigError::BadKey {
            circuit,
            reason: "empty key".into(),
        });
    }
    Ok(VerifyingKey::from_bytes(bytes))
}

impl PoolConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tree_depth == 0 || self.tree_depth > MAX_DEPTH {
            return Err(ConfigError::InvalidTreeDepth(self.tree_depth));
        }
        if self.batch.max_orders == 0 {
            return Err(ConfigError::MaxOrdersZero);
        }
        if self.batch.epoch_ms == 0 {
            return Err(ConfigError::EpochZero);
        }
        // each included order inserts a leaf; a full batch must not push the
        // roots its own orders were proven against out of the window
        if self.root_history < self.batch.max_orders {
            return Err(ConfigError::RootHistoryTooShort {
                root_history: self.root_history,
                max_orders: self.batch.max_orders,
            });
        }

        let mut seen = BTreeSet::new();
        for symbol in &self.assets {
            if !seen.insert(symbol.as_str()) {
                return Err(ConfigError::DuplicateAsset(symbol.clone()));
            }
        }
        for pair in &self.pairs {
            for symbol in [&pair.base, &pair.quote] {
                if !seen.contains(symbol.as_str()) {
                    return Err(ConfigError::UnknownPairAsset(symbol.clone()));
                }
            }
            if pair.base == pair.quote {
                return Err(ConfigError::SelfPair(pair.base.clone()));
            }
        }

        self.keys.verifying_keys()?;
        Ok(())
    }

    pub fn asset_ids(&self) -> Vec<AssetId> {
        self.assets.iter().map(|s| AssetId::derive(s)).collect()
    }

    pub fn trading_pairs(&self) -> Vec<TradingPair> {
        self.pairs
            .iter()
            .map(|p| TradingPair::new(AssetId::derive(&p.base), AssetId::derive(&p.quote)))
            .collect()
    }

    pub fn min_deposit_amount(&self) -> Amount {
        Amount::from(self.min_deposit)
    }
}
