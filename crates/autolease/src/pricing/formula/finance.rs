use serde::{Deserialize, Serialize};

use super::{round_cents, validate_common, QuoteError};
use crate::pricing::domain::{CreditTier, FinanceProgram, TaxTreatment, Vehicle};

#[derive(Debug, Clone, Copy)]
pub struct FinanceQuoteInput<'a> {
    pub vehicle: &'a Vehicle,
    pub program: &'a FinanceProgram,
    pub term_months: u16,
    pub credit_tier: CreditTier,
    pub tax: TaxTreatment,
    pub down_payment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinanceQuote {
    pub term_months: u16,
    pub credit_tier: CreditTier,
    pub apr: f64,
    pub selling_price: f64,
    pub sales_tax: f64,
    pub amount_financed: f64,
    pub monthly_payment: f64,
    pub due_at_signing: f64,
    pub total_interest: f64,
    pub total_cost: f64,
    pub tax_rate_percent: f64,
}

/// Level monthly payment for a fully amortizing loan. A zero rate spreads
/// the principal evenly.
pub fn amortized_payment(principal: f64, apr_percent: f64, term_months: u16) -> f64 {
    if term_months == 0 {
        return principal;
    }
    let months = f64::from(term_months);
    let monthly_rate = apr_percent / 100.0 / 12.0;
    if monthly_rate <= 0.0 {
        return principal / months;
    }

    let factor = (1.0 + monthly_rate).powi(i32::from(term_months));
    principal * monthly_rate * factor / (factor - 1.0)
}

pub fn compute_finance_quote(input: &FinanceQuoteInput<'_>) -> Result<FinanceQuote, QuoteError> {
    let FinanceQuoteInput {
        vehicle,
        program,
        term_months,
        credit_tier,
        tax,
        down_payment,
    } = *input;

    let selling_price = vehicle.selling_price();
    validate_common(term_months, selling_price, down_payment, tax.rate_percent)?;
    if !program.offers_term(term_months) {
        return Err(QuoteError::TermNotOffered(term_months));
    }
    let apr = program
        .apr(credit_tier)
        .ok_or(QuoteError::TierNotOffered(credit_tier))?;
    if !apr.is_finite() || apr < 0.0 {
        return Err(QuoteError::UnusableProgramRate { field: "APR", value: apr });
    }

    let sales_tax = tax.tax_on(selling_price);
    let fees = program.fees.doc_fee + program.fees.registration_fee;
    let amount_financed = (selling_price + sales_tax + fees - down_payment).max(0.0);
    let monthly_payment = amortized_payment(amount_financed, apr, term_months).round();
    let scheduled = monthly_payment * f64::from(term_months);

    Ok(FinanceQuote {
        term_months,
        credit_tier,
        apr,
        selling_price,
        sales_tax: round_cents(sales_tax),
        amount_financed: round_cents(amount_financed),
        monthly_payment,
        due_at_signing: round_cents(down_payment),
        total_interest: round_cents((scheduled - amount_financed).max(0.0)),
        total_cost: round_cents(scheduled + down_payment),
        tax_rate_percent: tax.rate_percent,
    })
}
