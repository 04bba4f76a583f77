//! Native-currency conversions for display
//!
//! Wei amounts are carried as [`U256`]. The ether figure on `TaggedEvent` is an
//! `f64`, so very large amounts lose precision; it feeds logs and events only.

use alloy::primitives::utils::format_ether;
use alloy::primitives::U256;
use std::str::FromStr;

/// Convert wei to ether for display
///
/// # Examples
/// ```
/// use alloy::primitives::U256;
/// use ghosttag::utils::currency::wei_to_ether;
///
/// assert_eq!(wei_to_ether(U256::from(1_000_000_000_000_000_000u64)), 1.0);
/// assert_eq!(wei_to_ether(U256::ZERO), 0.0);
/// ```
pub fn wei_to_ether(wei: U256) -> f64 {
    format_ether(wei).parse().unwrap_or(f64::INFINITY)
}

/// Parse a user-supplied wei amount, decimal or `0x` hex
///
/// # Examples
/// ```
/// use alloy::primitives::U256;
/// use ghosttag::utils::currency::parse_wei;
///
/// assert_eq!(parse_wei("5"), Some(U256::from(5)));
/// assert_eq!(parse_wei("0x0A"), Some(U256::from(10)));
/// assert_eq!(parse_wei("-1"), None);
/// ```
pub fn parse_wei(amount: &str) -> Option<U256> {
    U256::from_str(amount.trim()).ok()
}
