//! Sales-tax resolution for quotes.
//!
//! A remote lookup is tried first and cached per ZIP for a bounded time.
//! Failures never abort a quote: sessions keep their last known rate and the
//! static table supplies the initial one.

mod lookup;
mod resolver;
mod session;
mod table;

pub use lookup::{ConfiguredTaxLookup, HttpTaxRateLookup, TaxRateLookup};
pub use resolver::{TaxRateResolver, DEFAULT_CACHE_TTL};
pub use session::{LookupTicket, SessionRate, TaxRateSession};
pub use table::StaticTaxTable;

use serde::{Deserialize, Serialize};

/// Where a tax rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxSource {
    Lookup,
    Cache,
    Table,
    Default,
    Client,
}

/// A successfully resolved rate for a normalized ZIP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxResolution {
    pub zip: String,
    pub rate_percent: f64,
    pub source: TaxSource,
}

#[derive(Debug, thiserror::Error)]
pub enum TaxLookupError {
    #[error("remote tax lookup is not configured")]
    Disabled,
    #[error("'{0}' is not a valid ZIP code")]
    InvalidZip(String),
    #[error("tax lookup request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("tax lookup returned HTTP {0}")]
    Status(u16),
    #[error("tax lookup returned an unreadable body: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("tax lookup returned an unusable rate {0}")]
    InvalidRate(f64),
}

/// Reduce user input to a five-digit ZIP. ZIP+4 is accepted; anything else
/// is rejected.
pub fn normalize_zip(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let five = match trimmed.split_once('-') {
        Some((head, tail)) if tail.len() == 4 && tail.chars().all(|c| c.is_ascii_digit()) => head,
        Some(_) => return None,
        None => trimmed,
    };

    if five.len() == 5 && five.chars().all(|c| c.is_ascii_digit()) {
        Some(five.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_zip;

    #[test]
    fn normalizes_five_digit_and_zip_plus_four() {
        assert_eq!(normalize_zip(" 90210 ").as_deref(), Some("90210"));
        assert_eq!(normalize_zip("10001-1234").as_deref(), Some("10001"));
    }

    #[test]
    fn rejects_non_numeric_or_short_zips() {
        for raw in ["", "9021", "902101", "9O210", "abcde", "10001-12", "10001-abcd"] {
            assert_eq!(normalize_zip(raw), None, "input {raw:?}");
        }
    }
}
