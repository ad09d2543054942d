use super::common::*;
use crate::pricing::domain::{CreditTier, TaxTreatment};
use crate::pricing::formula::{
    amortized_payment, compute_finance_quote, compute_lease_quote, FinanceQuoteInput,
    LeaseQuoteInput, QuoteError,
};
use crate::pricing::standard_lease_programs;

fn lease_input<'a>(
    vehicle: &'a crate::pricing::Vehicle,
    program: &'a crate::pricing::LeaseProgram,
) -> LeaseQuoteInput<'a> {
    LeaseQuoteInput {
        vehicle,
        program,
        term_months: 36,
        annual_mileage: 10_000,
        credit_tier: CreditTier::Tier1,
        tax: TaxTreatment::at_rate(7.75),
        down_payment: 0.0,
    }
}

#[test]
fn lease_quote_matches_reference_figures() {
    let vehicle = rav4();
    let program = standard_lease();

    let quote = compute_lease_quote(&lease_input(&vehicle, &program)).expect("quote");

    assert_close(quote.residual_percent, 57.0);
    assert_close(quote.residual_value, 19_544.16);
    assert_close(quote.money_factor, 0.001_25);
    assert_close(quote.equivalent_apr, 3.0);
    assert_close(quote.depreciation_per_month, 409.55);
    assert_close(quote.finance_charge_per_month, 67.29);
    assert_close(quote.monthly_payment, 477.0);
    assert_close(quote.due_at_signing, 1_963.95);
    assert_close(quote.total_cost, 19_135.95);

    let breakdown = &quote.breakdown;
    assert_close(breakdown.first_payment, 477.0);
    assert_close(breakdown.fee_tax, 100.36);
    assert_close(breakdown.doc_fee_tax, 6.59);
    assert_close(breakdown.total, quote.due_at_signing);
}

#[test]
fn monthly_payment_never_decreases_with_selling_price() {
    let program = standard_lease();
    let mut vehicle = rav4();
    let mut previous = f64::MIN;

    for step in 0..60 {
        vehicle.selling_price = Some(22_000.0 + f64::from(step) * 400.0);
        let quote = compute_lease_quote(&lease_input(&vehicle, &program)).expect("quote");
        assert!(
            quote.monthly_payment >= previous,
            "payment dropped from {previous} to {} at price {:?}",
            quote.monthly_payment,
            vehicle.selling_price
        );
        previous = quote.monthly_payment;
    }
}

#[test]
fn due_at_signing_covers_first_payment_and_fees() {
    let vehicle = rav4();
    let program = standard_lease();
    let fees = program.fees;

    for tier in CreditTier::ALL {
        for mileage in [7_500, 10_000, 12_000, 15_000, 20_000] {
            for tax in [
                TaxTreatment::at_rate(0.0),
                TaxTreatment::at_rate(9.5),
                TaxTreatment {
                    rate_percent: 6.0,
                    taxes_fees: false,
                    taxes_doc_fee: true,
                },
            ] {
                let input = LeaseQuoteInput {
                    annual_mileage: mileage,
                    credit_tier: tier,
                    tax,
                    ..lease_input(&vehicle, &program)
                };
                let quote = compute_lease_quote(&input).expect("quote");
                let floor = quote.monthly_payment
                    + fees.acquisition_fee
                    + fees.registration_fee
                    + fees.doc_fee;
                assert!(quote.due_at_signing + 1e-9 >= floor);
            }
        }
    }
}

#[test]
fn mileage_allowance_shifts_money_factor() {
    let vehicle = rav4();
    let program = standard_lease();

    let high = compute_lease_quote(&LeaseQuoteInput {
        annual_mileage: 15_000,
        ..lease_input(&vehicle, &program)
    })
    .expect("quote");
    let unlisted = compute_lease_quote(&LeaseQuoteInput {
        annual_mileage: 11_000,
        ..lease_input(&vehicle, &program)
    })
    .expect("quote");

    assert_close(high.money_factor, 0.001_35);
    assert_close(unlisted.money_factor, 0.001_25);
    assert!(high.monthly_payment >= unlisted.monthly_payment);
}

#[test]
fn down_payment_reduces_cap_cost_and_is_due_at_signing() {
    let vehicle = rav4();
    let program = standard_lease();

    let quote = compute_lease_quote(&LeaseQuoteInput {
        down_payment: 2_000.0,
        ..lease_input(&vehicle, &program)
    })
    .expect("quote");

    assert_close(quote.capitalized_cost, 32_288.0);
    assert!(quote.monthly_payment < 477.0);
    assert_close(quote.breakdown.down_payment, 2_000.0);
    assert_close(
        quote.due_at_signing,
        quote.monthly_payment + 2_000.0 + 1_380.0 + 106.95,
    );
}

#[test]
fn untaxed_fees_are_left_out_of_signing_tax() {
    let vehicle = rav4();
    let program = standard_lease();

    let quote = compute_lease_quote(&LeaseQuoteInput {
        tax: TaxTreatment {
            rate_percent: 7.75,
            taxes_fees: false,
            taxes_doc_fee: false,
        },
        ..lease_input(&vehicle, &program)
    })
    .expect("quote");

    assert_close(quote.breakdown.fee_tax, 0.0);
    assert_close(quote.breakdown.doc_fee_tax, 0.0);
    assert_close(quote.due_at_signing, 477.0 + 1_380.0);
}

#[test]
fn lease_rejects_unpriceable_inputs() {
    let vehicle = rav4();
    let program = standard_lease();

    let zero_term = compute_lease_quote(&LeaseQuoteInput {
        term_months: 0,
        ..lease_input(&vehicle, &program)
    });
    assert_eq!(zero_term, Err(QuoteError::InvalidTerm));

    let negative_down = compute_lease_quote(&LeaseQuoteInput {
        down_payment: -50.0,
        ..lease_input(&vehicle, &program)
    });
    assert_eq!(negative_down, Err(QuoteError::InvalidDownPayment(-50.0)));

    let negative_tax = compute_lease_quote(&LeaseQuoteInput {
        tax: TaxTreatment::at_rate(-1.0),
        ..lease_input(&vehicle, &program)
    });
    assert_eq!(negative_tax, Err(QuoteError::InvalidTaxRate(-1.0)));

    let mut free = rav4();
    free.msrp = 0.0;
    let zero_price = compute_lease_quote(&lease_input(&free, &program));
    assert_eq!(zero_price, Err(QuoteError::InvalidPrice(0.0)));
}

#[test]
fn lease_reports_unpriced_credit_tier() {
    let vehicle = camry();
    let program = standard_lease_programs()
        .into_iter()
        .find(|program| program.id == "toyota-camry-lease")
        .expect("camry program");

    let result = compute_lease_quote(&LeaseQuoteInput {
        credit_tier: CreditTier::Tier5,
        ..lease_input(&vehicle, &program)
    });

    assert_eq!(result, Err(QuoteError::TierNotOffered(CreditTier::Tier5)));
}

#[test]
fn lease_refuses_unusable_program_rates() {
    let vehicle = rav4();

    let mut missing_residual = standard_lease();
    missing_residual.residuals.percents.insert(36, f64::NAN);
    let result = compute_lease_quote(&lease_input(&vehicle, &missing_residual));
    assert!(matches!(
        result,
        Err(QuoteError::UnusableProgramRate {
            field: "residual percent",
            ..
        })
    ));

    let mut negative_rate = standard_lease();
    negative_rate.money_factors.insert(CreditTier::Tier1, -0.5);
    let result = compute_lease_quote(&lease_input(&vehicle, &negative_rate));
    assert_eq!(
        result,
        Err(QuoteError::UnusableProgramRate {
            field: "money factor",
            value: -0.5,
        })
    );

    let mut infinite_rate = standard_lease();
    infinite_rate
        .money_factors
        .insert(CreditTier::Tier1, f64::INFINITY);
    assert!(compute_lease_quote(&lease_input(&vehicle, &infinite_rate)).is_err());
}

#[test]
fn unlisted_term_uses_default_residual() {
    let vehicle = rav4();
    let program = standard_lease();

    let quote = compute_lease_quote(&LeaseQuoteInput {
        term_months: 30,
        ..lease_input(&vehicle, &program)
    })
    .expect("quote");

    assert_close(quote.residual_percent, 57.0);
}

#[test]
fn finance_quote_amortizes_amount_financed() {
    let vehicle = rav4();
    let program = standard_finance();

    let quote = compute_finance_quote(&FinanceQuoteInput {
        vehicle: &vehicle,
        program: &program,
        term_months: 60,
        credit_tier: CreditTier::Tier1,
        tax: TaxTreatment::at_rate(7.75),
        down_payment: 3_000.0,
    })
    .expect("quote");

    assert_close(quote.apr, 4.9);
    assert_close(quote.sales_tax, 2_657.32);
    assert_close(quote.amount_financed, 34_430.32);
    assert_close(quote.monthly_payment, 648.0);
    assert_close(quote.due_at_signing, 3_000.0);
    assert_close(quote.total_cost, 648.0 * 60.0 + 3_000.0);
    assert_close(quote.total_interest, 648.0 * 60.0 - 34_430.32);
}

#[test]
fn finance_refuses_negative_apr() {
    let vehicle = rav4();
    let mut program = standard_finance();
    program.aprs.insert(CreditTier::Tier1, -1.0);

    let result = compute_finance_quote(&FinanceQuoteInput {
        vehicle: &vehicle,
        program: &program,
        term_months: 60,
        credit_tier: CreditTier::Tier1,
        tax: TaxTreatment::at_rate(7.75),
        down_payment: 0.0,
    });

    assert_eq!(
        result,
        Err(QuoteError::UnusableProgramRate {
            field: "APR",
            value: -1.0,
        })
    );
}

#[test]
fn finance_rejects_terms_the_program_does_not_offer() {
    let vehicle = rav4();
    let program = standard_finance();

    let result = compute_finance_quote(&FinanceQuoteInput {
        vehicle: &vehicle,
        program: &program,
        term_months: 84,
        credit_tier: CreditTier::Tier2,
        tax: TaxTreatment::at_rate(7.75),
        down_payment: 0.0,
    });

    assert_eq!(result, Err(QuoteError::TermNotOffered(84)));
}

#[test]
fn zero_rate_loans_split_principal_evenly() {
    assert_close(amortized_payment(12_000.0, 0.0, 48), 250.0);
    let payment = amortized_payment(34_430.32, 4.9, 60);
    assert!((payment - 648.17).abs() < 0.01, "payment {payment}");
}
