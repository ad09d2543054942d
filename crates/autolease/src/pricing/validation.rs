//! Sanity checks for admin-supplied programs, run on CSV import and on
//! every create/update through the service.

use std::fmt;

use super::domain::{CreditTier, EligibilityCriteria, FeeSchedule, FinanceProgram, LeaseProgram};

/// First unusable value found in a program.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ProgramDefect {
    pub(crate) field: &'static str,
    pub(crate) value: String,
    pub(crate) reason: &'static str,
}

impl ProgramDefect {
    fn new(field: &'static str, value: impl fmt::Display, reason: &'static str) -> Self {
        Self {
            field,
            value: value.to_string(),
            reason,
        }
    }
}

impl fmt::Display for ProgramDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' {}", self.field, self.value, self.reason)
    }
}

pub(crate) fn check_lease_program(program: &LeaseProgram) -> Result<(), ProgramDefect> {
    check_criteria(&program.id, &program.criteria)?;
    if program.money_factors.is_empty() {
        return Err(ProgramDefect::new(
            "money_factors",
            "",
            "needs a rate for at least one credit tier",
        ));
    }
    for (tier, money_factor) in &program.money_factors {
        if !is_non_negative(*money_factor) {
            return Err(ProgramDefect::new(
                money_factor_column(*tier),
                money_factor,
                "must be a finite, non-negative money factor",
            ));
        }
    }
    for (term, percent) in &program.residuals.percents {
        if !is_percentage(*percent) {
            return Err(ProgramDefect::new(
                "residual",
                format!("{term} months: {percent}"),
                "must be between 0 and 100 percent",
            ));
        }
    }
    if !is_percentage(program.residuals.default_percent) {
        return Err(ProgramDefect::new(
            "default_residual",
            program.residuals.default_percent,
            "must be between 0 and 100 percent",
        ));
    }
    for (miles, offset) in &program.mileage.offsets {
        if !offset.is_finite() {
            return Err(ProgramDefect::new(
                "mileage_adjustment",
                format!("{miles} miles: {offset}"),
                "must be a finite offset",
            ));
        }
    }
    check_fees(&program.fees)
}

pub(crate) fn check_finance_program(program: &FinanceProgram) -> Result<(), ProgramDefect> {
    check_criteria(&program.id, &program.criteria)?;
    if program.aprs.is_empty() {
        return Err(ProgramDefect::new(
            "aprs",
            "",
            "needs a rate for at least one credit tier",
        ));
    }
    for (tier, apr) in &program.aprs {
        if !is_non_negative(*apr) {
            return Err(ProgramDefect::new(
                apr_column(*tier),
                apr,
                "must be a finite, non-negative APR",
            ));
        }
    }
    if let Some(term) = program.terms.iter().find(|term| **term == 0) {
        return Err(ProgramDefect::new("terms", term, "must be at least one month"));
    }
    check_fees(&program.fees)
}

fn check_criteria(id: &str, criteria: &EligibilityCriteria) -> Result<(), ProgramDefect> {
    if id.trim().is_empty() {
        return Err(ProgramDefect::new("id", id, "must not be empty"));
    }
    if criteria.year_from > criteria.year_to {
        return Err(ProgramDefect::new(
            "year_to",
            criteria.year_to,
            "is before year_from",
        ));
    }
    if let Some(end) = criteria
        .active_to
        .filter(|end| *end < criteria.active_from)
    {
        return Err(ProgramDefect::new("active_to", end, "is before active_from"));
    }
    for (field, pattern) in [("model", &criteria.model), ("trim", &criteria.trim)] {
        if let Some(pattern) = pattern {
            if pattern.check().is_err() {
                return Err(ProgramDefect::new(
                    field,
                    pattern.text(),
                    "is not a valid pattern",
                ));
            }
        }
    }
    Ok(())
}

fn check_fees(fees: &FeeSchedule) -> Result<(), ProgramDefect> {
    for (field, amount) in [
        ("acquisition_fee", fees.acquisition_fee),
        ("doc_fee", fees.doc_fee),
        ("registration_fee", fees.registration_fee),
    ] {
        if !is_non_negative(amount) {
            return Err(ProgramDefect::new(
                field,
                amount,
                "must be a finite, non-negative amount",
            ));
        }
    }
    Ok(())
}

fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn is_percentage(value: f64) -> bool {
    (0.0..=100.0).contains(&value)
}

fn money_factor_column(tier: CreditTier) -> &'static str {
    match tier {
        CreditTier::Tier1 => "mf_tier1",
        CreditTier::Tier2 => "mf_tier2",
        CreditTier::Tier3 => "mf_tier3",
        CreditTier::Tier4 => "mf_tier4",
        CreditTier::Tier5 => "mf_tier5",
    }
}

fn apr_column(tier: CreditTier) -> &'static str {
    match tier {
        CreditTier::Tier1 => "apr_tier1",
        CreditTier::Tier2 => "apr_tier2",
        CreditTier::Tier3 => "apr_tier3",
        CreditTier::Tier4 => "apr_tier4",
        CreditTier::Tier5 => "apr_tier5",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::catalog::{standard_finance_programs, standard_lease_programs};

    #[test]
    fn standard_catalog_passes() {
        for program in standard_lease_programs() {
            assert_eq!(check_lease_program(&program), Ok(()), "{}", program.id);
        }
        for program in standard_finance_programs() {
            assert_eq!(check_finance_program(&program), Ok(()), "{}", program.id);
        }
    }

    #[test]
    fn residual_above_one_hundred_is_rejected() {
        let mut program = standard_lease_programs().remove(0);
        program.residuals.percents.insert(36, 120.0);

        let defect = check_lease_program(&program).expect_err("rejects residual");
        assert_eq!(defect.field, "residual");
        assert_eq!(defect.value, "36 months: 120");
    }

    #[test]
    fn zero_month_finance_term_is_rejected() {
        let mut program = standard_finance_programs().remove(0);
        program.terms.push(0);

        let defect = check_finance_program(&program).expect_err("rejects term");
        assert_eq!(defect.field, "terms");
    }
}
