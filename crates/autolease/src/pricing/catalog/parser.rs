use std::collections::BTreeMap;
use std::io::Read;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};

use super::CatalogImportError;
use crate::pricing::domain::{
    CreditTier, EligibilityCriteria, FeeSchedule, FinanceProgram, LeaseProgram, TaxConfig,
    VehiclePattern,
};
use crate::pricing::schedule::{MileageAdjustments, ResidualSchedule};
use crate::pricing::validation::{check_finance_program, check_lease_program, ProgramDefect};

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

pub(crate) fn parse_lease_programs<R: Read>(
    reader: R,
) -> Result<Vec<LeaseProgram>, CatalogImportError> {
    let mut programs = Vec::new();
    for (index, row) in csv_reader(reader).deserialize::<LeaseRow>().enumerate() {
        let line = index + 2;
        let program = row?.into_program(line)?;
        check_lease_program(&program).map_err(|defect| rejected(line, defect))?;
        programs.push(program);
    }
    Ok(programs)
}

pub(crate) fn parse_finance_programs<R: Read>(
    reader: R,
) -> Result<Vec<FinanceProgram>, CatalogImportError> {
    let mut programs = Vec::new();
    for (index, row) in csv_reader(reader).deserialize::<FinanceRow>().enumerate() {
        let line = index + 2;
        let program = row?.into_program(line)?;
        check_finance_program(&program).map_err(|defect| rejected(line, defect))?;
        programs.push(program);
    }
    Ok(programs)
}

fn rejected(line: usize, defect: ProgramDefect) -> CatalogImportError {
    CatalogImportError::InvalidField {
        line,
        field: defect.field,
        value: defect.value,
    }
}

pub(crate) fn parse_tax_configs<R: Read>(reader: R) -> Result<Vec<TaxConfig>, CatalogImportError> {
    let mut configs = Vec::new();
    for row in csv_reader(reader).deserialize::<TaxRow>() {
        let row = row?;
        configs.push(TaxConfig {
            state: row.state.to_ascii_uppercase(),
            zip_prefixes: split_list(row.zip_prefixes.as_deref()),
            sales_tax_rate: row.sales_tax_rate,
            taxes_fees: row.taxes_fees.unwrap_or(true),
            taxes_doc_fee: row.taxes_doc_fee.unwrap_or(true),
        });
    }
    Ok(configs)
}

/// Columns shared by both program layouts.
struct CriteriaColumns {
    brand: String,
    model: Option<String>,
    trim: Option<String>,
    match_kind: Option<String>,
    year_from: u16,
    year_to: u16,
    states: Option<String>,
    min_credit_score: Option<u16>,
    active_from: String,
    active_to: Option<String>,
    created_at: Option<String>,
}

impl CriteriaColumns {
    fn into_criteria(self, line: usize) -> Result<EligibilityCriteria, CatalogImportError> {
        let kind = self.match_kind.as_deref().unwrap_or("contains");
        let pattern = |value: Option<String>| -> Result<Option<VehiclePattern>, CatalogImportError> {
            value
                .map(|value| match kind.to_ascii_lowercase().as_str() {
                    "exact" => Ok(VehiclePattern::Exact(value)),
                    "contains" => Ok(VehiclePattern::Contains(value)),
                    "regex" => Ok(VehiclePattern::Regex(value)),
                    other => Err(CatalogImportError::InvalidField {
                        line,
                        field: "match_kind",
                        value: other.to_string(),
                    }),
                })
                .transpose()
        };

        let active_from = parse_date(&self.active_from).ok_or(CatalogImportError::InvalidField {
            line,
            field: "active_from",
            value: self.active_from.clone(),
        })?;
        let active_to = match self.active_to {
            Some(raw) => Some(parse_date(&raw).ok_or(CatalogImportError::InvalidField {
                line,
                field: "active_to",
                value: raw,
            })?),
            None => None,
        };
        let created_at = match self.created_at {
            Some(raw) => parse_timestamp(&raw).ok_or(CatalogImportError::InvalidField {
                line,
                field: "created_at",
                value: raw,
            })?,
            None => active_from
                .and_hms_opt(0, 0, 0)
                .map(|naive| naive.and_utc())
                .unwrap_or_default(),
        };

        Ok(EligibilityCriteria {
            brand: self.brand,
            model: pattern(self.model)?,
            trim: pattern(self.trim)?,
            year_from: self.year_from,
            year_to: self.year_to,
            eligible_states: split_list(self.states.as_deref())
                .into_iter()
                .map(|state| state.to_ascii_uppercase())
                .collect(),
            min_credit_score: self.min_credit_score.unwrap_or(0),
            active_from,
            active_to,
            created_at,
        })
    }
}

#[derive(Debug, Deserialize)]
struct LeaseRow {
    id: String,
    brand: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    model: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    trim: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    match_kind: Option<String>,
    year_from: u16,
    year_to: u16,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    states: Option<String>,
    #[serde(default)]
    min_credit_score: Option<u16>,
    active_from: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    active_to: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    created_at: Option<String>,
    residual_24: Option<f64>,
    residual_36: Option<f64>,
    residual_39: Option<f64>,
    residual_48: Option<f64>,
    mf_tier1: Option<f64>,
    mf_tier2: Option<f64>,
    mf_tier3: Option<f64>,
    mf_tier4: Option<f64>,
    mf_tier5: Option<f64>,
    #[serde(default)]
    acquisition_fee: f64,
    #[serde(default)]
    doc_fee: f64,
    #[serde(default)]
    registration_fee: f64,
    lender: String,
}

impl LeaseRow {
    fn criteria_columns(&self) -> CriteriaColumns {
        CriteriaColumns {
            brand: self.brand.clone(),
            model: self.model.clone(),
            trim: self.trim.clone(),
            match_kind: self.match_kind.clone(),
            year_from: self.year_from,
            year_to: self.year_to,
            states: self.states.clone(),
            min_credit_score: self.min_credit_score,
            active_from: self.active_from.clone(),
            active_to: self.active_to.clone(),
            created_at: self.created_at.clone(),
        }
    }

    fn into_program(self, line: usize) -> Result<LeaseProgram, CatalogImportError> {
        let mut residuals = ResidualSchedule::standard();
        for (term, percent) in [
            (24, self.residual_24),
            (36, self.residual_36),
            (39, self.residual_39),
            (48, self.residual_48),
        ] {
            if let Some(percent) = percent {
                residuals.percents.insert(term, percent);
            }
        }

        let money_factors = tier_table([
            self.mf_tier1,
            self.mf_tier2,
            self.mf_tier3,
            self.mf_tier4,
            self.mf_tier5,
        ]);
        if money_factors.is_empty() {
            return Err(CatalogImportError::MissingPricing {
                line,
                id: self.id,
            });
        }

        Ok(LeaseProgram {
            criteria: self.criteria_columns().into_criteria(line)?,
            id: self.id,
            residuals,
            mileage: MileageAdjustments::standard(),
            money_factors,
            fees: FeeSchedule {
                acquisition_fee: self.acquisition_fee,
                doc_fee: self.doc_fee,
                registration_fee: self.registration_fee,
            },
            lender: self.lender,
        })
    }
}

#[derive(Debug, Deserialize)]
struct FinanceRow {
    id: String,
    brand: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    model: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    trim: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    match_kind: Option<String>,
    year_from: u16,
    year_to: u16,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    states: Option<String>,
    #[serde(default)]
    min_credit_score: Option<u16>,
    active_from: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    active_to: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    created_at: Option<String>,
    apr_tier1: Option<f64>,
    apr_tier2: Option<f64>,
    apr_tier3: Option<f64>,
    apr_tier4: Option<f64>,
    apr_tier5: Option<f64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    terms: Option<String>,
    #[serde(default)]
    doc_fee: f64,
    #[serde(default)]
    registration_fee: f64,
    lender: String,
}

impl FinanceRow {
    fn criteria_columns(&self) -> CriteriaColumns {
        CriteriaColumns {
            brand: self.brand.clone(),
            model: self.model.clone(),
            trim: self.trim.clone(),
            match_kind: self.match_kind.clone(),
            year_from: self.year_from,
            year_to: self.year_to,
            states: self.states.clone(),
            min_credit_score: self.min_credit_score,
            active_from: self.active_from.clone(),
            active_to: self.active_to.clone(),
            created_at: self.created_at.clone(),
        }
    }

    fn into_program(self, line: usize) -> Result<FinanceProgram, CatalogImportError> {
        let aprs = tier_table([
            self.apr_tier1,
            self.apr_tier2,
            self.apr_tier3,
            self.apr_tier4,
            self.apr_tier5,
        ]);
        if aprs.is_empty() {
            return Err(CatalogImportError::MissingPricing {
                line,
                id: self.id,
            });
        }

        let mut terms = Vec::new();
        for raw in split_list(self.terms.as_deref()) {
            let term = raw.parse::<u16>().map_err(|_| CatalogImportError::InvalidField {
                line,
                field: "terms",
                value: raw.clone(),
            })?;
            terms.push(term);
        }

        Ok(FinanceProgram {
            criteria: self.criteria_columns().into_criteria(line)?,
            id: self.id,
            aprs,
            terms,
            fees: FeeSchedule {
                acquisition_fee: 0.0,
                doc_fee: self.doc_fee,
                registration_fee: self.registration_fee,
            },
            lender: self.lender,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TaxRow {
    state: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    zip_prefixes: Option<String>,
    sales_tax_rate: f64,
    taxes_fees: Option<bool>,
    taxes_doc_fee: Option<bool>,
}

fn tier_table(values: [Option<f64>; 5]) -> BTreeMap<CreditTier, f64> {
    CreditTier::ALL
        .into_iter()
        .zip(values)
        .filter_map(|(tier, value)| value.map(|value| (tier, value)))
        .collect()
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|raw| {
        raw.split('|')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    parse_date(trimmed)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
