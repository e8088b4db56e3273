use serde::{Deserialize, Serialize};

use crate::crypto::Address;
use crate::error::CoreError;

/// Token balances are tracked in base units
pub type Amount = u128;

/// Decimals used by the mock tokens
pub const MOCK_DECIMALS: u8 = 18;

/// Supply minted to the deployer of a mock token (10,000 whole tokens)
pub const DEFAULT_INITIAL_SUPPLY: Amount = 10_000 * 10u128.pow(MOCK_DECIMALS as u32);

/// Metadata for a deployed fungible token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMeta {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: Amount,
    /// Deployer; the only account allowed to toggle failing transfers
    pub owner: Address,
}

impl TokenMeta {
    /// Constructor arguments as the deployer supplied them
    pub fn constructor_args(&self) -> Vec<String> {
        vec![self.name.clone(), self.symbol.clone()]
    }
}

/// Scale a decimal string like `"10"` or `"0.5"` into base units.
pub fn parse_units(value: &str, decimals: u8) -> Result<Amount, CoreError> {
    let invalid = || CoreError::InvalidAmount(value.to_string());
    let value = value.trim();
    let (whole, frac) = match value.split_once('.') {
        Some((w, f)) => (w, f),
        None => (value, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if frac.len() > decimals as usize {
        return Err(invalid());
    }
    let scale = 10u128.checked_pow(decimals as u32).ok_or_else(invalid)?;
    let whole: Amount = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let frac_units: Amount = if frac.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", frac, width = decimals as usize);
        padded.parse().map_err(|_| invalid())?
    };
    whole
        .checked_mul(scale)
        .and_then(|w| w.checked_add(frac_units))
        .ok_or_else(invalid)
}

/// Render base units as a decimal string, trimming trailing zeros.
pub fn format_units(amount: Amount, decimals: u8) -> String {
    let scale = 10u128.pow(decimals as u32);
    let whole = amount / scale;
    let frac = amount % scale;
    if frac == 0 {
        return format!("{}.0", whole);
    }
    let frac = format!("{:0>width$}", frac, width = decimals as usize);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}
