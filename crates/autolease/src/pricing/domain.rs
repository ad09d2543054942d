use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{LazyLock, Mutex};

use chrono::{DateTime, NaiveDate, Utc};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::schedule::{MileageAdjustments, ResidualSchedule};

/// Bucketed credit-score ranges used to price financing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditTier {
    Tier1,
    Tier2,
    Tier3,
    Tier4,
    Tier5,
}

impl CreditTier {
    pub const ALL: [CreditTier; 5] = [
        CreditTier::Tier1,
        CreditTier::Tier2,
        CreditTier::Tier3,
        CreditTier::Tier4,
        CreditTier::Tier5,
    ];

    pub fn from_score(score: u16) -> Self {
        match score {
            740..=u16::MAX => CreditTier::Tier1,
            700..=739 => CreditTier::Tier2,
            660..=699 => CreditTier::Tier3,
            620..=659 => CreditTier::Tier4,
            _ => CreditTier::Tier5,
        }
    }

    /// Lowest score that lands in this tier.
    pub fn min_score(self) -> u16 {
        match self {
            CreditTier::Tier1 => 740,
            CreditTier::Tier2 => 700,
            CreditTier::Tier3 => 660,
            CreditTier::Tier4 => 620,
            CreditTier::Tier5 => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CreditTier::Tier1 => "tier1",
            CreditTier::Tier2 => "tier2",
            CreditTier::Tier3 => "tier3",
            CreditTier::Tier4 => "tier4",
            CreditTier::Tier5 => "tier5",
        }
    }
}

impl fmt::Display for CreditTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Matching rule for a model or trim name. Comparisons ignore case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum VehiclePattern {
    Exact(String),
    Contains(String),
    Regex(String),
}

impl VehiclePattern {
    pub fn text(&self) -> &str {
        match self {
            VehiclePattern::Exact(text)
            | VehiclePattern::Contains(text)
            | VehiclePattern::Regex(text) => text,
        }
    }

    /// Reports a regex pattern that will not compile.
    pub fn check(&self) -> Result<(), String> {
        match self {
            VehiclePattern::Regex(pattern) => compile_pattern(pattern)
                .map(|_| ())
                .map_err(|err| format!("invalid pattern '{pattern}': {err}")),
            VehiclePattern::Exact(_) | VehiclePattern::Contains(_) => Ok(()),
        }
    }

    pub fn matches(&self, candidate: &str) -> bool {
        let candidate = candidate.trim();
        match self {
            VehiclePattern::Exact(expected) => candidate.eq_ignore_ascii_case(expected.trim()),
            VehiclePattern::Contains(fragment) => candidate
                .to_ascii_lowercase()
                .contains(&fragment.trim().to_ascii_lowercase()),
            VehiclePattern::Regex(pattern) => {
                cached_pattern(pattern).is_some_and(|regex| regex.is_match(candidate))
            }
        }
    }
}

// Compiled regexes keyed by source text; `None` marks a pattern that failed.
static COMPILED_PATTERNS: LazyLock<Mutex<HashMap<String, Option<Regex>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

fn cached_pattern(pattern: &str) -> Option<Regex> {
    let mut cache = COMPILED_PATTERNS
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(compiled) = cache.get(pattern) {
        return compiled.clone();
    }

    let compiled = match compile_pattern(pattern) {
        Ok(regex) => Some(regex),
        Err(err) => {
            tracing::warn!(%pattern, error = %err, "ignoring invalid vehicle pattern");
            None
        }
    };
    cache.insert(pattern.to_string(), compiled.clone());
    compiled
}

/// Vehicle being priced, as selected on the storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub brand: String,
    pub model: String,
    #[serde(default)]
    pub trim: Option<String>,
    pub year: u16,
    pub msrp: f64,
    /// Negotiated price; MSRP is used when absent.
    #[serde(default)]
    pub selling_price: Option<f64>,
    /// Two-letter state of registration.
    #[serde(default)]
    pub state: Option<String>,
}

impl Vehicle {
    pub fn selling_price(&self) -> f64 {
        self.selling_price.unwrap_or(self.msrp)
    }
}

/// Eligibility window shared by lease and finance programs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityCriteria {
    pub brand: String,
    #[serde(default)]
    pub model: Option<VehiclePattern>,
    #[serde(default)]
    pub trim: Option<VehiclePattern>,
    pub year_from: u16,
    pub year_to: u16,
    #[serde(default)]
    pub eligible_states: Vec<String>,
    #[serde(default)]
    pub min_credit_score: u16,
    pub active_from: NaiveDate,
    #[serde(default)]
    pub active_to: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl EligibilityCriteria {
    pub fn is_active_on(&self, day: NaiveDate) -> bool {
        day >= self.active_from && self.active_to.map_or(true, |end| day <= end)
    }

    pub fn covers_year(&self, year: u16) -> bool {
        (self.year_from..=self.year_to).contains(&year)
    }

    pub fn covers_state(&self, state: Option<&str>) -> bool {
        match state {
            Some(state) if !self.eligible_states.is_empty() => self
                .eligible_states
                .iter()
                .any(|eligible| eligible.eq_ignore_ascii_case(state.trim())),
            _ => true,
        }
    }
}

/// Access to the eligibility window of any admin-configured program.
pub trait ProgramCriteria {
    fn program_id(&self) -> &str;
    fn criteria(&self) -> &EligibilityCriteria;
}

/// Upfront fees charged by a lender.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeeSchedule {
    #[serde(default)]
    pub acquisition_fee: f64,
    #[serde(default)]
    pub doc_fee: f64,
    #[serde(default)]
    pub registration_fee: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaseProgram {
    pub id: String,
    #[serde(flatten)]
    pub criteria: EligibilityCriteria,
    #[serde(default)]
    pub residuals: ResidualSchedule,
    #[serde(default)]
    pub mileage: MileageAdjustments,
    pub money_factors: BTreeMap<CreditTier, f64>,
    #[serde(default)]
    pub fees: FeeSchedule,
    pub lender: String,
}

impl LeaseProgram {
    pub fn base_money_factor(&self, tier: CreditTier) -> Option<f64> {
        self.money_factors.get(&tier).copied()
    }
}

impl ProgramCriteria for LeaseProgram {
    fn program_id(&self) -> &str {
        &self.id
    }

    fn criteria(&self) -> &EligibilityCriteria {
        &self.criteria
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinanceProgram {
    pub id: String,
    #[serde(flatten)]
    pub criteria: EligibilityCriteria,
    /// Annual percentage rate per tier, in percent.
    pub aprs: BTreeMap<CreditTier, f64>,
    /// Offered terms in months; empty means any term.
    #[serde(default)]
    pub terms: Vec<u16>,
    #[serde(default)]
    pub fees: FeeSchedule,
    pub lender: String,
}

impl FinanceProgram {
    pub fn apr(&self, tier: CreditTier) -> Option<f64> {
        self.aprs.get(&tier).copied()
    }

    pub fn offers_term(&self, term_months: u16) -> bool {
        self.terms.is_empty() || self.terms.contains(&term_months)
    }
}

impl ProgramCriteria for FinanceProgram {
    fn program_id(&self) -> &str {
        &self.id
    }

    fn criteria(&self) -> &EligibilityCriteria {
        &self.criteria
    }
}

/// Regional sales tax entry maintained by admins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxConfig {
    pub state: String,
    #[serde(default)]
    pub zip_prefixes: Vec<String>,
    /// Sales tax in percent, e.g. 7.75.
    pub sales_tax_rate: f64,
    #[serde(default = "default_true")]
    pub taxes_fees: bool,
    #[serde(default = "default_true")]
    pub taxes_doc_fee: bool,
}

impl TaxConfig {
    pub fn treatment(&self) -> TaxTreatment {
        TaxTreatment {
            rate_percent: self.sales_tax_rate,
            taxes_fees: self.taxes_fees,
            taxes_doc_fee: self.taxes_doc_fee,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Resolved tax inputs for a single quote.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxTreatment {
    pub rate_percent: f64,
    #[serde(default = "default_true")]
    pub taxes_fees: bool,
    #[serde(default = "default_true")]
    pub taxes_doc_fee: bool,
}

impl TaxTreatment {
    pub fn at_rate(rate_percent: f64) -> Self {
        Self {
            rate_percent,
            taxes_fees: true,
            taxes_doc_fee: true,
        }
    }

    pub fn tax_on(&self, amount: f64) -> f64 {
        amount * self.rate_percent.max(0.0) / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_tiers_bucket_scores() {
        assert_eq!(CreditTier::from_score(820), CreditTier::Tier1);
        assert_eq!(CreditTier::from_score(740), CreditTier::Tier1);
        assert_eq!(CreditTier::from_score(739), CreditTier::Tier2);
        assert_eq!(CreditTier::from_score(660), CreditTier::Tier3);
        assert_eq!(CreditTier::from_score(620), CreditTier::Tier4);
        assert_eq!(CreditTier::from_score(540), CreditTier::Tier5);
        for tier in CreditTier::ALL {
            assert_eq!(CreditTier::from_score(tier.min_score()), tier);
        }
    }

    #[test]
    fn credit_tier_serializes_as_label() {
        let json = serde_json::to_string(&CreditTier::Tier3).expect("serializes");
        assert_eq!(json, "\"tier3\"");
    }

    #[test]
    fn patterns_ignore_case() {
        assert!(VehiclePattern::Exact("Camry".into()).matches("camry"));
        assert!(VehiclePattern::Contains("sport".into()).matches("XSE Sport AWD"));
        assert!(VehiclePattern::Regex("^(le|se)$".into()).matches("SE"));
        assert!(!VehiclePattern::Regex("^(le|se)$".into()).matches("XSE"));
    }

    #[test]
    fn invalid_regex_never_matches() {
        let pattern = VehiclePattern::Regex("([unclosed".into());
        assert!(!pattern.matches("anything"));
        assert!(!pattern.matches("anything else"));
        assert!(pattern.check().is_err());

        let cache = COMPILED_PATTERNS.lock().expect("pattern cache");
        assert!(cache.get("([unclosed").is_some_and(Option::is_none));
    }

    #[test]
    fn regex_patterns_are_compiled_once_and_reused() {
        let pattern = VehiclePattern::Regex("^limited-[0-9]+$".into());

        assert!(pattern.matches("Limited-42"));
        assert!(
            COMPILED_PATTERNS
                .lock()
                .expect("pattern cache")
                .get("^limited-[0-9]+$")
                .is_some_and(Option::is_some)
        );
        assert!(!pattern.matches("limited"));
        assert!(pattern.matches("LIMITED-7"));
    }

    #[test]
    fn pattern_json_is_tagged() {
        let pattern: VehiclePattern =
            serde_json::from_str(r#"{"kind":"contains","value":"Hybrid"}"#).expect("parses");
        assert_eq!(pattern, VehiclePattern::Contains("Hybrid".into()));
    }

    #[test]
    fn state_filter_is_open_when_unset() {
        let criteria = EligibilityCriteria {
            brand: "Toyota".into(),
            model: None,
            trim: None,
            year_from: 2024,
            year_to: 2025,
            eligible_states: vec!["CA".into()],
            min_credit_score: 0,
            active_from: NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid"),
            active_to: None,
            created_at: DateTime::<Utc>::from_timestamp(0, 0).expect("valid"),
        };
        assert!(criteria.covers_state(None));
        assert!(criteria.covers_state(Some("ca")));
        assert!(!criteria.covers_state(Some("NV")));
    }
}
