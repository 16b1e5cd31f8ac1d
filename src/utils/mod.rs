//! Utilities for encoding purchases and converting amounts

pub mod envelope;

use crate::constants;

/// Converts a SOL amount to lamports, rounding down
pub fn sol_to_lamports(sol: f64) -> u64 {
    to_minor_units(sol, constants::pricing::BASE_ASSET_DECIMALS).unwrap_or(0)
}

/// Converts lamports to a SOL amount
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / 10f64.powi(constants::pricing::BASE_ASSET_DECIMALS as i32)
}

/// Scales a decimal amount by `10^decimals` and floors it
///
/// Returns `None` if the amount is negative, not finite, or does not fit in a `u64`.
pub fn to_minor_units(amount: f64, decimals: u32) -> Option<u64> {
    let scaled = (amount * 10f64.powi(decimals as i32)).floor();
    if !scaled.is_finite() || scaled < 0.0 || scaled >= u64::MAX as f64 {
        return None;
    }
    Some(scaled as u64)
}

/// Applies a basis point share to an amount, rounding down
///
/// # Example
///
/// ```
/// assert_eq!(solbridge::utils::apply_bps(666_666_666, 8_000), 533_333_332);
/// ```
pub fn apply_bps(amount: u64, bps: u64) -> u64 {
    ((amount as u128 * bps as u128) / constants::pricing::BPS_DENOMINATOR as u128) as u64
}

/// Calculates the minimum output after a slippage tolerance
///
/// # Arguments
///
/// * `amount` - Expected output
/// * `slippage_basis_points` - Tolerated slippage in basis points (1 bp = 0.01%)
pub fn calculate_with_slippage_sell(amount: u64, slippage_basis_points: u64) -> u64 {
    let slippage = slippage_basis_points.min(constants::pricing::BPS_DENOMINATOR);
    apply_bps(amount, constants::pricing::BPS_DENOMINATOR - slippage)
}
