//! Launch configuration
//!
//! Every tunable the engine reads at construction time. Values load from TOML
//! with per-field defaults, then go through [`LaunchConfig::validate`].

use std::fs;
use std::path::Path;

use lib_fees::MAX_FEE_BPS;
use lib_types::{Address, Amount, Bps};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::venue::MAX_TICK;

/// Default file name when the host keeps launch settings next to other config
pub const DEFAULT_CONFIG_FILENAME: &str = "launchpad.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parsing(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Engine settings
///
/// Amounts read from a TOML integer or, past the i64 range of TOML integers,
/// a decimal string (`"30_000_000_000_000_000_000"`). They are written back
/// as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    /// Supply minted per deployed token
    #[serde(with = "amount_format")]
    pub total_supply: Amount,
    /// Part of the supply sold through the curve; the rest is locked for graduation
    #[serde(with = "amount_format")]
    pub initial_token_reserve: Amount,
    /// Virtual funds reserve every curve starts with
    #[serde(with = "amount_format")]
    pub virtual_funds_reserve: Amount,
    /// Initial trade fee in basis points
    pub fee_rate_bps: Bps,
    /// Smallest funds amount a buy may offer
    #[serde(with = "amount_format")]
    pub min_buy_funds: Amount,
    /// Account allowed to withdraw fees and change the fee rate
    pub operator: Address,
    /// Account that holds token inventory and trade funds
    pub custody: Address,
    /// Hex-encoded Ed25519 key that signs trade authorizations
    pub authority_public_key: Option<String>,
    /// Fee tier of the pair opened on the liquidity venue
    pub venue_fee_tier: u32,
    /// Tick spacing of that pair
    pub tick_spacing: i32,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            total_supply: 1_000_000_000_000_000,
            initial_token_reserve: 800_000_000_000_000,
            virtual_funds_reserve: 4_000_000_000_000_000_000,
            fee_rate_bps: 100,
            min_buy_funds: 10_000,
            operator: Address::zero(),
            custody: Address::zero(),
            authority_public_key: None,
            venue_fee_tier: 3_000,
            tick_spacing: 60,
        }
    }
}

impl LaunchConfig {
    /// Small curve (k = 1_000_000) with fixed identities, for tests and demos
    pub fn for_testing() -> Self {
        Self {
            total_supply: 1_250,
            initial_token_reserve: 1_000,
            virtual_funds_reserve: 1_000,
            fee_rate_bps: 100,
            min_buy_funds: 100,
            operator: Address::new([0xAA; 32]),
            custody: Address::new([0xEE; 32]),
            authority_public_key: None,
            venue_fee_tier: 3_000,
            tick_spacing: 60,
        }
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn initial_token_reserve(&self) -> Amount {
        self.initial_token_reserve
    }

    pub fn virtual_funds_reserve(&self) -> Amount {
        self.virtual_funds_reserve
    }

    pub fn min_buy_funds(&self) -> Amount {
        self.min_buy_funds
    }

    /// Supply held back for venue seeding
    pub fn locked_allocation(&self) -> Amount {
        self.total_supply().saturating_sub(self.initial_token_reserve())
    }

    /// Parse from a TOML document and validate
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: LaunchConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file and validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(path = %path.display(), "loaded launch config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_supply == 0 {
            return Err(ConfigError::Invalid("total_supply must be positive".into()));
        }
        if self.initial_token_reserve == 0 {
            return Err(ConfigError::Invalid(
                "initial_token_reserve must be positive".into(),
            ));
        }
        if self.initial_token_reserve >= self.total_supply {
            return Err(ConfigError::Invalid(format!(
                "initial_token_reserve {} must leave a locked allocation below total_supply {}",
                self.initial_token_reserve, self.total_supply
            )));
        }
        if self.virtual_funds_reserve == 0 {
            return Err(ConfigError::Invalid(
                "virtual_funds_reserve must be positive".into(),
            ));
        }
        if self
            .initial_token_reserve
            .checked_mul(self.virtual_funds_reserve)
            .is_none()
        {
            return Err(ConfigError::Invalid(
                "initial_token_reserve * virtual_funds_reserve overflows the curve constant".into(),
            ));
        }
        if self.fee_rate_bps > MAX_FEE_BPS {
            return Err(ConfigError::Invalid(format!(
                "fee_rate_bps {} exceeds maximum {}",
                self.fee_rate_bps, MAX_FEE_BPS
            )));
        }
        if self.min_buy_funds == 0 {
            return Err(ConfigError::Invalid("min_buy_funds must be positive".into()));
        }
        if self.operator.is_zero() {
            return Err(ConfigError::Invalid("operator address is not set".into()));
        }
        if self.custody.is_zero() {
            return Err(ConfigError::Invalid("custody address is not set".into()));
        }
        if self.tick_spacing <= 0 || self.tick_spacing > MAX_TICK {
            return Err(ConfigError::Invalid(format!(
                "tick_spacing {} out of range",
                self.tick_spacing
            )));
        }
        if let Some(key) = &self.authority_public_key {
            let bytes = hex::decode(key.trim_start_matches("0x"))
                .map_err(|e| ConfigError::Invalid(format!("authority_public_key: {e}")))?;
            if bytes.len() != 32 {
                return Err(ConfigError::Invalid(format!(
                    "authority_public_key must be 32 bytes, got {}",
                    bytes.len()
                )));
            }
        }
        Ok(())
    }
}

/// `Amount` as a TOML integer or decimal string
mod amount_format {
    use lib_types::Amount;
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Integer(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&amount.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Integer(value) => Ok(Amount::from(value)),
            Raw::Text(text) => text
                .trim()
                .replace('_', "")
                .parse()
                .map_err(|e| de::Error::custom(format!("invalid amount {text:?}: {e}"))),
        }
    }
}
