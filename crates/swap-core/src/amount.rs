//! Conversion between token units and smallest units
//!
//! User-facing amounts are [`Decimal`] token units; contract calls take the
//! integer smallest unit, `amount * 10^decimals`.

use alloy_primitives::U256;
use rust_decimal::Decimal;

use crate::ProtocolError;

/// Allowance requested when approving a spender: 2^256 - 1
pub const INFINITE_ALLOWANCE: U256 = U256::MAX;

/// Standard ERC-20 precision
pub const DEFAULT_DECIMALS: u8 = 18;

fn pow10(exp: u32) -> U256 {
    U256::from(10u64).pow(U256::from(exp))
}

/// Convert token units to the smallest unit.
///
/// Precision beyond `decimals` is truncated. Negative amounts are rejected.
pub fn to_smallest_unit(amount: Decimal, decimals: u8) -> Result<U256, ProtocolError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ProtocolError::InvalidAmount {
            message: format!("{} is negative", amount),
        });
    }

    let mantissa = U256::from(amount.mantissa().unsigned_abs());
    let scale = amount.scale();
    let decimals = u32::from(decimals);

    if decimals >= scale {
        mantissa
            .checked_mul(pow10(decimals - scale))
            .ok_or_else(|| ProtocolError::InvalidAmount {
                message: format!("{} overflows 256 bits", amount),
            })
    } else {
        Ok(mantissa / pow10(scale - decimals))
    }
}

/// Convert a smallest-unit value back to token units.
pub fn from_smallest_unit(value: U256, decimals: u8) -> Result<Decimal, ProtocolError> {
    let overflow = || ProtocolError::InvalidAmount {
        message: format!("{} does not fit a decimal", value),
    };

    let raw = i128::try_from(value).map_err(|_| overflow())?;
    Decimal::try_from_i128_with_scale(raw, u32::from(decimals))
        .map(|d| d.normalize())
        .map_err(|_| overflow())
}
