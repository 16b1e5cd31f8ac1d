use solana_sdk::pubkey::Pubkey;
use tracing::debug;

use super::PriceFeed;
use crate::{constants::pricing, error::ClientError, utils};

/// Amounts of a single purchase, derived from the fiat amount and two prices
///
/// `swap_lamports + distribution_lamports == total_lamports` always holds: the swap leg is
/// floored and the remainder goes to the distribution leg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PurchaseAmounts {
    /// SOL bought with the fiat amount
    pub base_asset_amount: f64,
    pub total_lamports: u64,
    /// Lamports swapped into the Token-2022 mint (80%)
    pub swap_lamports: u64,
    /// Lamports kept against the reward distribution (20%)
    pub distribution_lamports: u64,
    /// Reward tokens worth 20% of the fiat amount, in smallest units
    pub reward_token_amount: u64,
    /// Minimum swap output with the static 5% slippage applied
    pub minimum_swap_output: u64,
}

fn check_positive(name: &str, value: f64) -> Result<f64, ClientError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ClientError::InvalidPurchaseInput(format!(
            "{} must be a positive finite number, got {}",
            name, value
        )))
    }
}

impl PurchaseAmounts {
    /// Computes the purchase split from known prices
    ///
    /// # Arguments
    ///
    /// * `fiat_amount` - USD amount the user pays
    /// * `base_price` - Price of one SOL in USD
    /// * `reward_price` - Price of one reward token in USD
    ///
    /// # Errors
    ///
    /// Returns `InvalidPurchaseInput` if any input is not a positive finite number, or if an
    /// amount does not fit in a `u64`.
    pub fn compute(
        fiat_amount: f64,
        base_price: f64,
        reward_price: f64,
    ) -> Result<Self, ClientError> {
        let fiat_amount = check_positive("fiat amount", fiat_amount)?;
        let base_price = check_positive("base asset price", base_price)?;
        let reward_price = check_positive("reward token price", reward_price)?;

        let base_asset_amount = fiat_amount / base_price;
        let total_lamports = utils::to_minor_units(base_asset_amount, pricing::BASE_ASSET_DECIMALS)
            .ok_or_else(|| {
                ClientError::InvalidPurchaseInput(format!(
                    "{} SOL does not fit in lamports",
                    base_asset_amount
                ))
            })?;

        let swap_lamports = utils::apply_bps(total_lamports, pricing::SWAP_SHARE_BPS);
        let distribution_lamports = total_lamports - swap_lamports;

        let distribution_value = fiat_amount * pricing::DISTRIBUTION_SHARE;
        let reward_token_amount = utils::to_minor_units(
            distribution_value / reward_price,
            pricing::REWARD_TOKEN_DECIMALS,
        )
        .ok_or_else(|| {
            ClientError::InvalidPurchaseInput(format!(
                "{} USD at {} USD per token does not fit in token units",
                distribution_value, reward_price
            ))
        })?;

        // TODO: replace the static tolerance with a quote from the Raydium pool reserves
        let minimum_swap_output =
            utils::calculate_with_slippage_sell(swap_lamports, pricing::SWAP_SLIPPAGE_BPS);

        debug!(
            fiat_amount,
            base_price,
            reward_price,
            total_lamports,
            swap_lamports,
            distribution_lamports,
            distribution_value,
            reward_token_amount,
            minimum_swap_output,
            "calculated purchase amounts"
        );

        Ok(Self {
            base_asset_amount,
            total_lamports,
            swap_lamports,
            distribution_lamports,
            reward_token_amount,
            minimum_swap_output,
        })
    }
}

/// Calculates the purchase split, fetching any price that is not supplied
///
/// Inputs are validated before the feed is queried, so an invalid amount never causes a
/// price lookup.
///
/// # Arguments
///
/// * `feed` - Price source for missing prices
/// * `fiat_amount` - USD amount the user pays
/// * `base_price` - Optional SOL price in USD
/// * `reward_price` - Optional reward token price in USD
/// * `reward_token` - Mint whose price values the reward leg
pub async fn calculate_purchase_amounts<F: PriceFeed>(
    feed: &F,
    fiat_amount: f64,
    base_price: Option<f64>,
    reward_price: Option<f64>,
    reward_token: &Pubkey,
) -> Result<PurchaseAmounts, ClientError> {
    check_positive("fiat amount", fiat_amount)?;
    if let Some(price) = base_price {
        check_positive("base asset price", price)?;
    }
    if let Some(price) = reward_price {
        check_positive("reward token price", price)?;
    }

    let (base_price, reward_price) = tokio::join!(
        async {
            match base_price {
                Some(price) => price,
                None => feed.base_asset_price().await,
            }
        },
        async {
            match reward_price {
                Some(price) => price,
                None => feed.reward_token_price(reward_token).await,
            }
        }
    );

    PurchaseAmounts::compute(fiat_amount, base_price, reward_price)
}
