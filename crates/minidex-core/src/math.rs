//! Constant-product pricing.
//!
//! `amount_out = floor(amount_in * reserve_out / (amount_in + reserve_in))`,
//! i.e. `(reserve_in + amount_in) * (reserve_out - amount_out) >= reserve_in * reserve_out`
//! with no protocol fee. Products of 18-decimal reserves overflow `u128`, so
//! intermediates are computed in 256 bits.

use uint::construct_uint;

use crate::types::token::Amount;

construct_uint! {
    /// 256-bit unsigned integer for intermediate products
    pub struct U256(4);
}

impl U256 {
    /// Widen a base-unit amount
    pub fn from_amount(value: Amount) -> Self {
        U256([value as u64, (value >> 64) as u64, 0, 0])
    }

    /// Narrow to `u128`, or `None` if the value does not fit
    pub fn to_amount(&self) -> Option<Amount> {
        if self.0[2] != 0 || self.0[3] != 0 {
            return None;
        }
        Some(((self.0[1] as u128) << 64) | self.0[0] as u128)
    }
}

/// Output of a swap against `(reserve_in, reserve_out)`.
///
/// Returns `None` when the denominator is zero (no input and no reserve).
/// The result is always strictly below `reserve_out` when `reserve_in > 0`.
pub fn get_amount_out(
    amount_in: Amount,
    reserve_in: Amount,
    reserve_out: Amount,
) -> Option<Amount> {
    let amount_in = U256::from_amount(amount_in);
    let denominator = amount_in.checked_add(U256::from_amount(reserve_in))?;
    if denominator.is_zero() {
        return None;
    }
    let numerator = amount_in.checked_mul(U256::from_amount(reserve_out))?;
    (numerator / denominator).to_amount()
}

/// `reserve_a * reserve_b` without overflow
pub fn constant_product(reserve_a: Amount, reserve_b: Amount) -> U256 {
    U256::from_amount(reserve_a) * U256::from_amount(reserve_b)
}
