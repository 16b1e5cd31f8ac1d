//! Pricing for fiat purchases
//!
//! This module turns a fiat amount into the lamports and token amounts encoded into a
//! `purchase_with_sol` instruction.
//!
//! - `PriceFeed`: source of the SOL and reward token prices
//! - `PriceOracle`: live prices from CoinGecko and DexScreener, with fallbacks (`oracle` feature)
//! - `FixedPrices`: constant prices, for quotes computed offline
//! - `PurchaseAmounts`: the deterministic 80/20 split of a purchase

mod amounts;
#[cfg(feature = "oracle")]
mod oracle;

pub use amounts::*;
#[cfg(feature = "oracle")]
pub use oracle::*;

use std::{future::Future, time::SystemTime};

use solana_sdk::pubkey::Pubkey;

/// Source of the prices a purchase is calculated with
///
/// Implementations must always resolve to a strictly positive, finite price. Lookup failures
/// are handled inside the feed, typically by substituting a fallback constant.
pub trait PriceFeed: Send + Sync {
    /// Price of one SOL in USD
    fn base_asset_price(&self) -> impl Future<Output = f64> + Send;

    /// Price of one reward token in USD
    fn reward_token_price(&self, token: &Pubkey) -> impl Future<Output = f64> + Send;
}

/// Prices used for a single purchase attempt
///
/// Quotes are fetched fresh for every purchase and never cached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceQuote {
    pub base_asset_price_usd: f64,
    pub reward_token_price_usd: f64,
    /// Liquidity of the pair the reward token price was read from, if one was found
    pub source_liquidity_usd: Option<f64>,
    pub fetched_at: SystemTime,
}

/// Price feed returning constant prices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedPrices {
    pub base_asset_price_usd: f64,
    pub reward_token_price_usd: f64,
}

impl FixedPrices {
    pub fn new(base_asset_price_usd: f64, reward_token_price_usd: f64) -> Self {
        Self {
            base_asset_price_usd,
            reward_token_price_usd,
        }
    }
}

impl PriceFeed for FixedPrices {
    async fn base_asset_price(&self) -> f64 {
        self.base_asset_price_usd
    }

    async fn reward_token_price(&self, _token: &Pubkey) -> f64 {
        self.reward_token_price_usd
    }
}
