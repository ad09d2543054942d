use serde::{Deserialize, Serialize};

use super::{round_cents, validate_common, QuoteError};
use crate::pricing::domain::{CreditTier, LeaseProgram, TaxTreatment, Vehicle};

/// Display multiplier turning a money factor into an approximate APR.
const MONEY_FACTOR_TO_APR: f64 = 2400.0;

/// Everything the lease formula needs for one quote.
#[derive(Debug, Clone, Copy)]
pub struct LeaseQuoteInput<'a> {
    pub vehicle: &'a Vehicle,
    pub program: &'a LeaseProgram,
    pub term_months: u16,
    pub annual_mileage: u32,
    pub credit_tier: CreditTier,
    pub tax: TaxTreatment,
    pub down_payment: f64,
}

/// Cash due before the car leaves the lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DueAtSigningBreakdown {
    pub first_payment: f64,
    pub down_payment: f64,
    pub acquisition_fee: f64,
    pub registration_fee: f64,
    pub doc_fee: f64,
    pub fee_tax: f64,
    pub doc_fee_tax: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaseQuote {
    pub term_months: u16,
    pub annual_mileage: u32,
    pub credit_tier: CreditTier,
    pub msrp: f64,
    pub selling_price: f64,
    pub capitalized_cost: f64,
    pub residual_percent: f64,
    pub residual_value: f64,
    pub money_factor: f64,
    pub equivalent_apr: f64,
    pub depreciation_per_month: f64,
    pub finance_charge_per_month: f64,
    pub monthly_payment: f64,
    pub due_at_signing: f64,
    pub total_cost: f64,
    pub tax_rate_percent: f64,
    pub breakdown: DueAtSigningBreakdown,
}

/// Approximate APR shown next to a money factor. Not an amortization solve.
pub fn equivalent_apr(money_factor: f64) -> f64 {
    money_factor * MONEY_FACTOR_TO_APR
}

pub fn compute_lease_quote(input: &LeaseQuoteInput<'_>) -> Result<LeaseQuote, QuoteError> {
    let LeaseQuoteInput {
        vehicle,
        program,
        term_months,
        annual_mileage,
        credit_tier,
        tax,
        down_payment,
    } = *input;

    let selling_price = vehicle.selling_price();
    validate_common(term_months, selling_price, down_payment, tax.rate_percent)?;
    if !vehicle.msrp.is_finite() || vehicle.msrp <= 0.0 {
        return Err(QuoteError::InvalidPrice(vehicle.msrp));
    }

    let base_money_factor = program
        .base_money_factor(credit_tier)
        .ok_or(QuoteError::TierNotOffered(credit_tier))?;
    if !base_money_factor.is_finite() || base_money_factor < 0.0 {
        return Err(QuoteError::UnusableProgramRate {
            field: "money factor",
            value: base_money_factor,
        });
    }
    let mileage_adjustment = program.mileage.adjustment(annual_mileage);
    if !mileage_adjustment.is_finite() {
        return Err(QuoteError::UnusableProgramRate {
            field: "mileage adjustment",
            value: mileage_adjustment,
        });
    }
    let money_factor = (base_money_factor + mileage_adjustment).max(0.0);

    let residual_percent = program.residuals.residual_percent(term_months);
    if !(0.0..=100.0).contains(&residual_percent) {
        return Err(QuoteError::UnusableProgramRate {
            field: "residual percent",
            value: residual_percent,
        });
    }
    let residual_value = vehicle.msrp * residual_percent / 100.0;
    let capitalized_cost = (selling_price - down_payment).max(0.0);
    let term = f64::from(term_months);

    let depreciation_per_month = (capitalized_cost - residual_value) / term;
    let finance_charge_per_month = (capitalized_cost + residual_value) * money_factor;
    // Only rounding step before the signing math.
    let monthly_payment = (depreciation_per_month + finance_charge_per_month)
        .round()
        .max(0.0);

    let fees = program.fees;
    let fee_tax = if tax.taxes_fees {
        tax.tax_on(fees.acquisition_fee + fees.registration_fee)
    } else {
        0.0
    };
    let doc_fee_tax = if tax.taxes_doc_fee {
        tax.tax_on(fees.doc_fee)
    } else {
        0.0
    };
    let due_at_signing = round_cents(
        monthly_payment
            + down_payment
            + fees.acquisition_fee
            + fees.registration_fee
            + fees.doc_fee
            + fee_tax
            + doc_fee_tax,
    );
    let total_cost = round_cents(monthly_payment * term + due_at_signing);

    Ok(LeaseQuote {
        term_months,
        annual_mileage,
        credit_tier,
        msrp: vehicle.msrp,
        selling_price,
        capitalized_cost,
        residual_percent,
        residual_value: round_cents(residual_value),
        money_factor,
        equivalent_apr: equivalent_apr(money_factor),
        depreciation_per_month: round_cents(depreciation_per_month),
        finance_charge_per_month: round_cents(finance_charge_per_month),
        monthly_payment,
        due_at_signing,
        total_cost,
        tax_rate_percent: tax.rate_percent,
        breakdown: DueAtSigningBreakdown {
            first_payment: monthly_payment,
            down_payment,
            acquisition_fee: fees.acquisition_fee,
            registration_fee: fees.registration_fee,
            doc_fee: fees.doc_fee,
            fee_tax: round_cents(fee_tax),
            doc_fee_tax: round_cents(doc_fee_tax),
            total: due_at_signing,
        },
    })
}
