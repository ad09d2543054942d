//! Closed-form lease and finance payment math.
//!
//! Everything here is a pure function of its inputs; no lookups, no clocks.

mod finance;
mod lease;

pub use finance::{amortized_payment, compute_finance_quote, FinanceQuote, FinanceQuoteInput};
pub use lease::{
    compute_lease_quote, equivalent_apr, DueAtSigningBreakdown, LeaseQuote, LeaseQuoteInput,
};

use super::domain::CreditTier;

/// Input combinations the formulas refuse to price.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QuoteError {
    #[error("term must be at least one month")]
    InvalidTerm,
    #[error("vehicle price must be a positive amount (found {0})")]
    InvalidPrice(f64),
    #[error("down payment must be zero or more (found {0})")]
    InvalidDownPayment(f64),
    #[error("tax rate must be a non-negative percentage (found {0})")]
    InvalidTaxRate(f64),
    #[error("program does not price credit {0}")]
    TierNotOffered(CreditTier),
    #[error("program does not offer a {0}-month term")]
    TermNotOffered(u16),
    #[error("program {field} is unusable (found {value})")]
    UnusableProgramRate { field: &'static str, value: f64 },
}

pub(crate) fn validate_common(
    term_months: u16,
    price: f64,
    down_payment: f64,
    tax_rate_percent: f64,
) -> Result<(), QuoteError> {
    if term_months == 0 {
        return Err(QuoteError::InvalidTerm);
    }
    if !price.is_finite() || price <= 0.0 {
        return Err(QuoteError::InvalidPrice(price));
    }
    if !down_payment.is_finite() || down_payment < 0.0 {
        return Err(QuoteError::InvalidDownPayment(down_payment));
    }
    if !tax_rate_percent.is_finite() || tax_rate_percent < 0.0 {
        return Err(QuoteError::InvalidTaxRate(tax_rate_percent));
    }
    Ok(())
}

pub(crate) fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
