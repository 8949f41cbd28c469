// src/math.rs
//! Constant-product AMM math on raw `u128` amounts.

use alloy_primitives::{U256, U512};

use crate::shared::errors::ArbitrageError;

/// Fee denominator (basis points)
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Fixed-point scale for the slippage model (parts per million)
pub const PPM: u128 = 1_000_000;

/// Largest slippage penalty: 10% of the base output
pub const MAX_SLIPPAGE_PENALTY_PPM: u128 = 100_000;

/// Trade/reserve ratio (ppm) from which the squared penalty hits the cap.
/// sqrt(0.1) = 0.316227..
const PENALTY_CAP_RATIO_PPM: u128 = 316_228;

/// Output of a constant-product swap with the fee taken from the input.
///
/// Evaluates `y * dx * (10000 - f) / (x * 10000 + dx * (10000 - f))` in one
/// division over 512-bit intermediates, so neither truncation nor u128
/// overflow of the products can distort the result.
pub fn constant_product_output(
    amount_in: u128,
    reserve_in: u128,
    reserve_out: u128,
    fee_bps: u32,
) -> Result<u128, ArbitrageError> {
    if u128::from(fee_bps) > BPS_DENOMINATOR {
        return Err(ArbitrageError::InvalidFee(fee_bps));
    }
    if reserve_in == 0 || reserve_out == 0 || amount_in == 0 {
        return Ok(0);
    }

    let fee_keep = U512::from(BPS_DENOMINATOR - u128::from(fee_bps));
    let amount_in_with_fee = U512::from(amount_in)
        .checked_mul(fee_keep)
        .ok_or(ArbitrageError::ArithmeticOverflow("swap input after fee"))?;
    let numerator = U512::from(reserve_out)
        .checked_mul(amount_in_with_fee)
        .ok_or(ArbitrageError::ArithmeticOverflow("swap numerator"))?;
    let denominator = U512::from(reserve_in)
        .checked_mul(U512::from(BPS_DENOMINATOR))
        .and_then(|scaled| scaled.checked_add(amount_in_with_fee))
        .ok_or(ArbitrageError::ArithmeticOverflow("swap denominator"))?;

    u128::try_from(numerator / denominator).map_err(|_| ArbitrageError::ArithmeticOverflow("swap output"))
}

/// Slippage penalty in ppm for a trade of `amount_in` against `reserve_in`:
/// the squared trade/reserve ratio, capped at 10%.
pub fn slippage_penalty_ppm(amount_in: u128, reserve_in: u128) -> Result<u128, ArbitrageError> {
    if reserve_in == 0 {
        return Ok(MAX_SLIPPAGE_PENALTY_PPM);
    }
    let scaled = U256::from(amount_in)
        .checked_mul(U256::from(PPM))
        .ok_or(ArbitrageError::ArithmeticOverflow("slippage ratio"))?;
    let ratio = scaled / U256::from(reserve_in);
    if ratio >= U256::from(PENALTY_CAP_RATIO_PPM) {
        return Ok(MAX_SLIPPAGE_PENALTY_PPM);
    }
    let ratio_ppm = u128::try_from(ratio).map_err(|_| ArbitrageError::ArithmeticOverflow("slippage ratio"))?;
    Ok((ratio_ppm * ratio_ppm / PPM).min(MAX_SLIPPAGE_PENALTY_PPM))
}

/// Constant-product output with the price-impact penalty applied
pub fn slippage_adjusted_output(
    amount_in: u128,
    reserve_in: u128,
    reserve_out: u128,
    fee_bps: u32,
) -> Result<u128, ArbitrageError> {
    let base = constant_product_output(amount_in, reserve_in, reserve_out, fee_bps)?;
    if base == 0 {
        return Ok(0);
    }

    let penalty_ppm = slippage_penalty_ppm(amount_in, reserve_in)?;
    let penalty = mul_div_floor(base, penalty_ppm, PPM);
    Ok(base - penalty)
}

/// Mid price of token B in token A terms (B per A), decimal adjusted
pub fn price_from_reserves(
    reserve_a: u128,
    decimals_a: u8,
    reserve_b: u128,
    decimals_b: u8,
) -> f64 {
    if reserve_a == 0 || reserve_b == 0 {
        return 0.0;
    }
    let a = reserve_a as f64 / 10_f64.powi(i32::from(decimals_a));
    let b = reserve_b as f64 / 10_f64.powi(i32::from(decimals_b));
    b / a
}

/// floor(value * num / den) for `num <= den`, without overflowing
fn mul_div_floor(value: u128, num: u128, den: u128) -> u128 {
    let q = value / den;
    let r = value % den;
    q * num + r * num / den
}
