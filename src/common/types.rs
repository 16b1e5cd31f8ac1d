//! Configuration types for the solbridge SDK
//!
//! This module provides the static, read-only configuration a purchase flow runs against:
//!
//! - The purchase program and the accounts it owns
//! - The Raydium/Serum pool accounts the swap leg routes through
//! - Fallback prices and market data endpoints for the price oracle
//! - Credentials handed to the payment widget
//!
//! Configuration is loaded once, either from the environment or through serde, and then
//! shared by `Arc`. Nothing in here is mutated after startup.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::{accounts, constants, error::ClientError};

/// Serde helpers that read and write public keys as base58 strings
pub mod base58 {
    use std::str::FromStr;

    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use solana_sdk::pubkey::Pubkey;

    pub fn serialize<S: Serializer>(pubkey: &Pubkey, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&pubkey.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Pubkey, D::Error> {
        let value = String::deserialize(deserializer)?;
        Pubkey::from_str(&value).map_err(|e| D::Error::custom(format!("{}: {}", value, e)))
    }
}

/// Market accounts of the Raydium pool and its Serum market
///
/// These are passed through positionally to the purchase program, which performs the swap
/// leg against them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolAccounts {
    #[serde(with = "base58")]
    pub raydium_amm_program: Pubkey,
    #[serde(with = "base58")]
    pub amm_id: Pubkey,
    #[serde(with = "base58")]
    pub amm_authority: Pubkey,
    #[serde(with = "base58")]
    pub amm_open_orders: Pubkey,
    #[serde(with = "base58")]
    pub amm_target_orders: Pubkey,
    #[serde(with = "base58")]
    pub pool_coin_token_account: Pubkey,
    #[serde(with = "base58")]
    pub pool_pc_token_account: Pubkey,
    #[serde(with = "base58")]
    pub serum_program_id: Pubkey,
    #[serde(with = "base58")]
    pub serum_market: Pubkey,
    #[serde(with = "base58")]
    pub serum_bids: Pubkey,
    #[serde(with = "base58")]
    pub serum_asks: Pubkey,
    #[serde(with = "base58")]
    pub serum_event_queue: Pubkey,
    #[serde(with = "base58")]
    pub serum_coin_vault_account: Pubkey,
    #[serde(with = "base58")]
    pub serum_pc_vault_account: Pubkey,
    #[serde(with = "base58")]
    pub serum_vault_signer: Pubkey,
}

/// Prices substituted when a live lookup fails
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FallbackPrices {
    pub sol_usd: f64,
    pub spl_token_usd: f64,
}

impl Default for FallbackPrices {
    fn default() -> Self {
        Self {
            sol_usd: constants::pricing::FALLBACK_SOL_PRICE_USD,
            spl_token_usd: constants::pricing::FALLBACK_SPL_TOKEN_PRICE_USD,
        }
    }
}

/// Base URLs of the market data services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleEndpoints {
    pub coingecko: String,
    pub dexscreener: String,
}

impl Default for OracleEndpoints {
    fn default() -> Self {
        Self {
            coingecko: constants::endpoints::COINGECKO_API.to_string(),
            dexscreener: constants::endpoints::DEXSCREENER_API.to_string(),
        }
    }
}

/// Static addresses and parameters of the purchase program
///
/// # Fields
///
/// * `program_id` - Purchase program receiving the instruction
/// * `program_state` - Program state PDA (`[b"program_state"]`)
/// * `spl_token_mint` - Reward token distributed for 20% of the purchase value
/// * `token2022_mint` - Token the swap leg buys with 80% of the lamports
/// * `program_spl_token_account` - Program's reward token account
/// * `program_token2022_account` - Program's swap token account
/// * `spl_token_program` - Token program owning the reward mint
/// * `token2022_program` - Token program used to derive swap token accounts
/// * `signing_account` - Payment widget account that pays for and signs the transaction
/// * `pool` - Raydium/Serum accounts of the swap leg
/// * `token_program` - Token program passed to the purchase program
/// * `system_program` - System program
/// * `reward_price_token` - Mint whose market price values the reward leg
/// * `fallback_prices` - Prices used when live lookups fail
/// * `endpoints` - Market data endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramConfig {
    #[serde(with = "base58")]
    pub program_id: Pubkey,
    #[serde(with = "base58")]
    pub program_state: Pubkey,
    #[serde(with = "base58")]
    pub spl_token_mint: Pubkey,
    #[serde(with = "base58")]
    pub token2022_mint: Pubkey,
    #[serde(with = "base58")]
    pub program_spl_token_account: Pubkey,
    #[serde(with = "base58")]
    pub program_token2022_account: Pubkey,
    #[serde(with = "base58")]
    pub spl_token_program: Pubkey,
    #[serde(with = "base58")]
    pub token2022_program: Pubkey,
    #[serde(with = "base58")]
    pub signing_account: Pubkey,
    pub pool: PoolAccounts,
    #[serde(with = "base58")]
    pub token_program: Pubkey,
    #[serde(with = "base58")]
    pub system_program: Pubkey,
    #[serde(with = "base58")]
    pub reward_price_token: Pubkey,
    #[serde(default)]
    pub fallback_prices: FallbackPrices,
    #[serde(default)]
    pub endpoints: OracleEndpoints,
}

/// Environment variable prefix of every configuration key
pub const ENV_PREFIX: &str = "SOLBRIDGE_";

struct Lookup<F> {
    lookup: F,
}

impl<F> Lookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(&format!("{}{}", ENV_PREFIX, key))
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ClientError> {
        self.optional(key)
            .ok_or_else(|| ClientError::MissingConfiguration(format!("{}{}", ENV_PREFIX, key)))
    }

    fn pubkey(&self, key: &str) -> Result<Pubkey, ClientError> {
        parse_pubkey(key, &self.required(key)?)
    }

    fn pubkey_or(&self, key: &str, default: Pubkey) -> Result<Pubkey, ClientError> {
        match self.optional(key) {
            Some(value) => parse_pubkey(key, &value),
            None => Ok(default),
        }
    }

    fn price_or(&self, key: &str, default: f64) -> Result<f64, ClientError> {
        match self.optional(key) {
            Some(value) => match value.parse::<f64>() {
                Ok(price) if price.is_finite() && price > 0.0 => Ok(price),
                _ => Err(ClientError::InvalidConfiguration(format!(
                    "{}{} must be a positive number, got {}",
                    ENV_PREFIX, key, value
                ))),
            },
            None => Ok(default),
        }
    }
}

fn parse_pubkey(key: &str, value: &str) -> Result<Pubkey, ClientError> {
    Pubkey::from_str(value).map_err(|e| {
        ClientError::InvalidConfiguration(format!("{}{}={}: {}", ENV_PREFIX, key, value, e))
    })
}

impl ProgramConfig {
    /// Loads the configuration from `SOLBRIDGE_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns `MissingConfiguration` naming the first required variable that is unset, or
    /// `InvalidConfiguration` if a value cannot be parsed.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration through an arbitrary key lookup
    ///
    /// Keys are the full environment variable names (`SOLBRIDGE_PROGRAM_ID`, ...). The program
    /// state and the program's token accounts are derived when not set explicitly.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup { lookup };

        let program_id = env.pubkey("PROGRAM_ID")?;
        let spl_token_mint = env.pubkey("SPL_TOKEN_MINT")?;
        let token2022_mint = env.pubkey("TOKEN2022_MINT")?;
        let signing_account = env.pubkey("SIGNING_ACCOUNT")?;

        let pool = PoolAccounts {
            raydium_amm_program: env
                .pubkey_or("RAYDIUM_AMM_PROGRAM", constants::accounts::RAYDIUM_AMM_PROGRAM)?,
            amm_id: env.pubkey("AMM_ID")?,
            amm_authority: env.pubkey("AMM_AUTHORITY")?,
            amm_open_orders: env.pubkey("AMM_OPEN_ORDERS")?,
            amm_target_orders: env.pubkey("AMM_TARGET_ORDERS")?,
            pool_coin_token_account: env.pubkey("POOL_COIN_TOKEN_ACCOUNT")?,
            pool_pc_token_account: env.pubkey("POOL_PC_TOKEN_ACCOUNT")?,
            serum_program_id: env.pubkey_or("SERUM_PROGRAM_ID", constants::accounts::SERUM_PROGRAM)?,
            serum_market: env.pubkey("SERUM_MARKET")?,
            serum_bids: env.pubkey("SERUM_BIDS")?,
            serum_asks: env.pubkey("SERUM_ASKS")?,
            serum_event_queue: env.pubkey("SERUM_EVENT_QUEUE")?,
            serum_coin_vault_account: env.pubkey("SERUM_COIN_VAULT")?,
            serum_pc_vault_account: env.pubkey("SERUM_PC_VAULT")?,
            serum_vault_signer: env.pubkey("SERUM_VAULT_SIGNER")?,
        };

        let spl_token_program =
            env.pubkey_or("SPL_TOKEN_PROGRAM", constants::accounts::TOKEN_PROGRAM)?;
        let token2022_program =
            env.pubkey_or("TOKEN2022_OWNER_PROGRAM", constants::accounts::TOKEN_PROGRAM)?;

        let program_state =
            env.pubkey_or("PROGRAM_STATE", accounts::program_state_pda(&program_id))?;
        let (derived_spl_token_account, derived_token2022_account) = accounts::program_token_accounts(
            &program_state,
            (&spl_token_mint, &spl_token_program),
            (&token2022_mint, &token2022_program),
        );
        let program_spl_token_account =
            env.pubkey_or("PROGRAM_SPL_TOKEN_ACCOUNT", derived_spl_token_account)?;
        let program_token2022_account =
            env.pubkey_or("PROGRAM_TOKEN2022_ACCOUNT", derived_token2022_account)?;

        let defaults = FallbackPrices::default();
        let fallback_prices = FallbackPrices {
            sol_usd: env.price_or("SOL_PRICE_USD", defaults.sol_usd)?,
            spl_token_usd: env.price_or("SPL_TOKEN_PRICE_USD", defaults.spl_token_usd)?,
        };

        let default_endpoints = OracleEndpoints::default();
        let endpoints = OracleEndpoints {
            coingecko: env
                .optional("COINGECKO_API")
                .unwrap_or(default_endpoints.coingecko),
            dexscreener: env
                .optional("DEXSCREENER_API")
                .unwrap_or(default_endpoints.dexscreener),
        };

        Ok(Self {
            program_id,
            program_state,
            spl_token_mint,
            token2022_mint,
            program_spl_token_account,
            program_token2022_account,
            spl_token_program,
            token2022_program,
            signing_account,
            pool,
            token_program: env.pubkey_or("TOKEN_PROGRAM", constants::accounts::TOKEN_PROGRAM)?,
            system_program: env.pubkey_or("SYSTEM_PROGRAM", constants::accounts::SYSTEM_PROGRAM)?,
            reward_price_token: env.pubkey_or("SPL_TOKEN_PRICE_ADDRESS", spl_token_mint)?,
            fallback_prices,
            endpoints,
        })
    }
}

/// Credentials the payment widget signs orders with
///
/// The private key never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetCredentials {
    pub partner_id: String,
    pub signing_private_key: String,
    pub origin: String,
}

impl WidgetCredentials {
    /// Loads `SOLBRIDGE_PARTNER_ID`, `SOLBRIDGE_SIGNING_PRIVATE_KEY` and the optional
    /// `SOLBRIDGE_WIDGET_ORIGIN` from the environment
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the credentials through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup { lookup };
        Ok(Self {
            partner_id: env.required("PARTNER_ID")?,
            signing_private_key: env.required("SIGNING_PRIVATE_KEY")?,
            origin: env
                .optional("WIDGET_ORIGIN")
                .unwrap_or_else(|| constants::endpoints::WIDGET_ORIGIN.to_string()),
        })
    }
}

impl fmt::Debug for WidgetCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetCredentials")
            .field("partner_id", &self.partner_id)
            .field("signing_private_key", &"<redacted>")
            .field("origin", &self.origin)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spl_associated_token_account::get_associated_token_address_with_program_id;
    use std::collections::HashMap;

    fn full_env() -> HashMap<String, String> {
        let keys = [
            "PROGRAM_ID",
            "SPL_TOKEN_MINT",
            "TOKEN2022_MINT",
            "SIGNING_ACCOUNT",
            "AMM_ID",
            "AMM_AUTHORITY",
            "AMM_OPEN_ORDERS",
            "AMM_TARGET_ORDERS",
            "POOL_COIN_TOKEN_ACCOUNT",
            "POOL_PC_TOKEN_ACCOUNT",
            "SERUM_MARKET",
            "SERUM_BIDS",
            "SERUM_ASKS",
            "SERUM_EVENT_QUEUE",
            "SERUM_COIN_VAULT",
            "SERUM_PC_VAULT",
            "SERUM_VAULT_SIGNER",
        ];
        keys.iter()
            .map(|key| {
                (
                    format!("{}{}", ENV_PREFIX, key),
                    Pubkey::new_unique().to_string(),
                )
            })
            .collect()
    }

    #[test]
    fn test_from_lookup_derives_program_accounts() {
        let env = full_env();
        let config = ProgramConfig::from_lookup(|key| env.get(key).cloned()).unwrap();

        assert_eq!(
            config.program_state,
            accounts::program_state_pda(&config.program_id)
        );
        assert_eq!(
            config.program_spl_token_account,
            get_associated_token_address_with_program_id(
                &config.program_state,
                &config.spl_token_mint,
                &constants::accounts::TOKEN_PROGRAM,
            )
        );
        assert_eq!(
            config.pool.raydium_amm_program,
            constants::accounts::RAYDIUM_AMM_PROGRAM
        );
        assert_eq!(config.reward_price_token, config.spl_token_mint);
        assert_eq!(config.fallback_prices, FallbackPrices::default());
    }

    #[test]
    fn test_from_lookup_missing_key() {
        let mut env = full_env();
        env.remove("SOLBRIDGE_SERUM_BIDS");

        match ProgramConfig::from_lookup(|key| env.get(key).cloned()) {
            Err(ClientError::MissingConfiguration(key)) => assert_eq!(key, "SOLBRIDGE_SERUM_BIDS"),
            other => panic!("expected MissingConfiguration, got {:?}", other),
        }
    }

    #[test]
    fn test_from_lookup_rejects_placeholders() {
        let mut env = full_env();
        env.insert("SOLBRIDGE_AMM_ID".to_string(), "YOUR_AMM_ID".to_string());

        assert!(matches!(
            ProgramConfig::from_lookup(|key| env.get(key).cloned()),
            Err(ClientError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_from_lookup_blank_counts_as_missing() {
        let mut env = full_env();
        env.insert("SOLBRIDGE_PROGRAM_ID".to_string(), "   ".to_string());

        assert!(matches!(
            ProgramConfig::from_lookup(|key| env.get(key).cloned()),
            Err(ClientError::MissingConfiguration(_))
        ));
    }

    #[test]
    fn test_fallback_price_override() {
        let mut env = full_env();
        env.insert("SOLBRIDGE_SOL_PRICE_USD".to_string(), "172.5".to_string());
        env.insert("SOLBRIDGE_SPL_TOKEN_PRICE_USD".to_string(), "-1".to_string());
        assert!(matches!(
            ProgramConfig::from_lookup(|key| env.get(key).cloned()),
            Err(ClientError::InvalidConfiguration(_))
        ));

        env.remove("SOLBRIDGE_SPL_TOKEN_PRICE_USD");
        let config = ProgramConfig::from_lookup(|key| env.get(key).cloned()).unwrap();
        assert_eq!(config.fallback_prices.sol_usd, 172.5);
    }

    #[test]
    fn test_config_serde_uses_base58() {
        let env = full_env();
        let config = ProgramConfig::from_lookup(|key| env.get(key).cloned()).unwrap();

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["program_id"], config.program_id.to_string());

        let parsed: ProgramConfig = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_widget_credentials() {
        let env: HashMap<&str, &str> = [
            ("SOLBRIDGE_PARTNER_ID", "partner-01"),
            ("SOLBRIDGE_SIGNING_PRIVATE_KEY", "0xdeadbeef"),
        ]
        .into_iter()
        .collect();

        let credentials =
            WidgetCredentials::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(credentials.origin, constants::endpoints::WIDGET_ORIGIN);
        assert!(!format!("{:?}", credentials).contains("deadbeef"));

        let missing = WidgetCredentials::from_lookup(|_| None);
        assert!(matches!(missing, Err(ClientError::MissingConfiguration(_))));
    }
}
