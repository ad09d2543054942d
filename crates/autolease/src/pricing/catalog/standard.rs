use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};

use crate::pricing::domain::{
    CreditTier, EligibilityCriteria, FeeSchedule, FinanceProgram, LeaseProgram, TaxConfig,
    VehiclePattern,
};
use crate::pricing::schedule::{MileageAdjustments, ResidualSchedule};

const STANDARD_MONEY_FACTORS: [f64; 5] = [0.001_25, 0.001_65, 0.002_10, 0.002_60, 0.003_20];
const STANDARD_APRS: [f64; 5] = [4.9, 6.4, 8.9, 11.9, 15.9];

const STANDARD_LEASE_FEES: FeeSchedule = FeeSchedule {
    acquisition_fee: 895.0,
    doc_fee: 85.0,
    registration_fee: 400.0,
};

fn tiered(values: [f64; 5]) -> BTreeMap<CreditTier, f64> {
    CreditTier::ALL.into_iter().zip(values).collect()
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn created(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    date(year, month, day)
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or_default()
}

fn criteria(
    brand: &str,
    model: Option<VehiclePattern>,
    trim: Option<VehiclePattern>,
    min_credit_score: u16,
    created_at: DateTime<Utc>,
) -> EligibilityCriteria {
    EligibilityCriteria {
        brand: brand.to_string(),
        model,
        trim,
        year_from: 2024,
        year_to: 2026,
        eligible_states: Vec::new(),
        min_credit_score,
        active_from: date(2025, 1, 1),
        active_to: None,
        created_at,
    }
}

/// Lease programs seeded when no catalog file is configured.
pub fn standard_lease_programs() -> Vec<LeaseProgram> {
    let brand_wide = LeaseProgram {
        id: "toyota-lease-standard".to_string(),
        criteria: criteria("Toyota", None, None, 620, created(2025, 1, 2)),
        residuals: ResidualSchedule::standard(),
        mileage: MileageAdjustments::standard(),
        money_factors: tiered(STANDARD_MONEY_FACTORS),
        fees: STANDARD_LEASE_FEES,
        lender: "Toyota Financial Services".to_string(),
    };

    let mut camry_residuals = ResidualSchedule::standard();
    camry_residuals.percents.insert(36, 58.0);
    let camry = LeaseProgram {
        id: "toyota-camry-lease".to_string(),
        criteria: criteria(
            "Toyota",
            Some(VehiclePattern::Exact("Camry".to_string())),
            None,
            660,
            created(2025, 3, 1),
        ),
        residuals: camry_residuals,
        money_factors: [
            (CreditTier::Tier1, 0.001_10),
            (CreditTier::Tier2, 0.001_50),
            (CreditTier::Tier3, 0.001_95),
        ]
        .into_iter()
        .collect(),
        ..brand_wide.clone()
    };

    let honda = LeaseProgram {
        id: "honda-lease-standard".to_string(),
        criteria: criteria("Honda", None, None, 640, created(2025, 1, 2)),
        lender: "American Honda Finance".to_string(),
        ..brand_wide.clone()
    };

    vec![brand_wide, camry, honda]
}

/// Finance programs seeded when no catalog file is configured.
pub fn standard_finance_programs() -> Vec<FinanceProgram> {
    let fees = FeeSchedule {
        acquisition_fee: 0.0,
        doc_fee: 85.0,
        registration_fee: 400.0,
    };

    vec![
        FinanceProgram {
            id: "toyota-finance-standard".to_string(),
            criteria: criteria("Toyota", None, None, 580, created(2025, 1, 2)),
            aprs: tiered(STANDARD_APRS),
            terms: vec![36, 48, 60, 72],
            fees,
            lender: "Toyota Financial Services".to_string(),
        },
        FinanceProgram {
            id: "honda-finance-standard".to_string(),
            criteria: criteria("Honda", None, None, 580, created(2025, 1, 2)),
            aprs: tiered(STANDARD_APRS),
            terms: vec![36, 48, 60, 72],
            fees,
            lender: "American Honda Finance".to_string(),
        },
    ]
}

/// Tax table seeded when no catalog file is configured.
pub fn standard_tax_configs() -> Vec<TaxConfig> {
    let config = |state: &str, prefixes: &[&str], rate: f64, taxes_fees: bool| TaxConfig {
        state: state.to_string(),
        zip_prefixes: prefixes.iter().map(|prefix| prefix.to_string()).collect(),
        sales_tax_rate: rate,
        taxes_fees,
        taxes_doc_fee: true,
    };

    vec![
        config("CA", &[], 7.25, true),
        config("CA", &["900", "902", "910"], 9.5, true),
        config("CA", &["941"], 8.625, true),
        config("NY", &[], 4.0, true),
        config("NY", &["100", "101", "102"], 8.875, true),
        config("TX", &[], 6.25, true),
        config("FL", &[], 6.0, false),
        config("NJ", &[], 6.625, true),
    ]
}
