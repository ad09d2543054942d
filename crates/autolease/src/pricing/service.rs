use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{CreditTier, FinanceProgram, LeaseProgram, TaxConfig, TaxTreatment, Vehicle};
use super::formula::{
    compute_finance_quote, compute_lease_quote, FinanceQuote, FinanceQuoteInput, LeaseQuote,
    LeaseQuoteInput, QuoteError,
};
use super::matcher::match_program;
use super::presentation::{FinanceQuoteDisplay, LeaseQuoteDisplay};
use super::repository::{ProgramRepository, RepositoryError};
use super::tax::{
    normalize_zip, SessionRate, StaticTaxTable, TaxRateLookup, TaxRateResolver, TaxRateSession,
    TaxResolution, TaxSource,
};
use super::validation::{check_finance_program, check_lease_program};

/// Explicit pricing settings owned by the service shell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingDefaults {
    pub default_tax_rate_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaseQuoteRequest {
    pub vehicle: Vehicle,
    pub credit_score: u16,
    pub term_months: u16,
    pub annual_mileage: u32,
    #[serde(default)]
    pub down_payment: f64,
    #[serde(default)]
    pub zip: Option<String>,
    /// Rate the shopper was last quoted with; kept if the ZIP lookup fails.
    #[serde(default)]
    pub last_known_tax_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinanceQuoteRequest {
    pub vehicle: Vehicle,
    pub credit_score: u16,
    pub term_months: u16,
    #[serde(default)]
    pub down_payment: f64,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub last_known_tax_rate: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaseQuoteResponse {
    pub program_id: String,
    pub lender: String,
    pub tax: SessionRate,
    pub quote: LeaseQuote,
    pub display: LeaseQuoteDisplay,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinanceQuoteResponse {
    pub program_id: String,
    pub lender: String,
    pub tax: SessionRate,
    pub quote: FinanceQuote,
    pub display: FinanceQuoteDisplay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramKind {
    Lease,
    Finance,
}

impl fmt::Display for ProgramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgramKind::Lease => f.write_str("lease"),
            ProgramKind::Finance => f.write_str("finance"),
        }
    }
}

/// Error raised by the quote service.
#[derive(Debug, thiserror::Error)]
pub enum QuoteServiceError {
    #[error("no active {0} program matches this vehicle and credit profile")]
    NoMatchingProgram(ProgramKind),
    #[error(transparent)]
    Quote(#[from] QuoteError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("'{0}' is not a valid ZIP code")]
    InvalidZip(String),
    #[error("invalid program: {0}")]
    InvalidProgram(String),
}

/// Service composing the program repository, matcher, tax resolver, and formulas.
pub struct QuoteService<R, L> {
    repository: Arc<R>,
    resolver: Arc<TaxRateResolver<L>>,
    defaults: PricingDefaults,
}

impl<R, L> QuoteService<R, L>
where
    R: ProgramRepository + 'static,
    L: TaxRateLookup + 'static,
{
    pub fn new(repository: Arc<R>, lookup: L, defaults: PricingDefaults) -> Self {
        Self::with_resolver(repository, Arc::new(TaxRateResolver::new(lookup)), defaults)
    }

    pub fn with_resolver(
        repository: Arc<R>,
        resolver: Arc<TaxRateResolver<L>>,
        defaults: PricingDefaults,
    ) -> Self {
        Self {
            repository,
            resolver,
            defaults,
        }
    }

    /// Match a lease program and price it. No match means no quote.
    pub async fn lease_quote(
        &self,
        request: LeaseQuoteRequest,
        today: NaiveDate,
    ) -> Result<LeaseQuoteResponse, QuoteServiceError> {
        let programs = self.repository.lease_programs()?;
        let program = match_program(&request.vehicle, request.credit_score, &programs, today)
            .ok_or(QuoteServiceError::NoMatchingProgram(ProgramKind::Lease))?;

        let (tax, rate) = self
            .tax_treatment(
                request.zip.as_deref(),
                request.vehicle.state.as_deref(),
                request.last_known_tax_rate,
            )
            .await?;

        let quote = compute_lease_quote(&LeaseQuoteInput {
            vehicle: &request.vehicle,
            program,
            term_months: request.term_months,
            annual_mileage: request.annual_mileage,
            credit_tier: CreditTier::from_score(request.credit_score),
            tax,
            down_payment: request.down_payment,
        })?;

        tracing::info!(
            program_id = %program.id,
            term_months = quote.term_months,
            monthly_payment = quote.monthly_payment,
            due_at_signing = quote.due_at_signing,
            "lease quote computed"
        );

        Ok(LeaseQuoteResponse {
            program_id: program.id.clone(),
            lender: program.lender.clone(),
            tax: rate,
            display: LeaseQuoteDisplay::from_quote(&quote),
            quote,
        })
    }

    pub async fn finance_quote(
        &self,
        request: FinanceQuoteRequest,
        today: NaiveDate,
    ) -> Result<FinanceQuoteResponse, QuoteServiceError> {
        let programs = self.repository.finance_programs()?;
        let program = match_program(&request.vehicle, request.credit_score, &programs, today)
            .ok_or(QuoteServiceError::NoMatchingProgram(ProgramKind::Finance))?;

        let (tax, rate) = self
            .tax_treatment(
                request.zip.as_deref(),
                request.vehicle.state.as_deref(),
                request.last_known_tax_rate,
            )
            .await?;

        let quote = compute_finance_quote(&FinanceQuoteInput {
            vehicle: &request.vehicle,
            program,
            term_months: request.term_months,
            credit_tier: CreditTier::from_score(request.credit_score),
            tax,
            down_payment: request.down_payment,
        })?;

        tracing::info!(
            program_id = %program.id,
            term_months = quote.term_months,
            monthly_payment = quote.monthly_payment,
            "finance quote computed"
        );

        Ok(FinanceQuoteResponse {
            program_id: program.id.clone(),
            lender: program.lender.clone(),
            tax: rate,
            display: FinanceQuoteDisplay::from_quote(&quote),
            quote,
        })
    }

    /// Rate for a ZIP. Lookup failures degrade to the static table.
    pub async fn tax_rate(&self, raw_zip: &str) -> Result<TaxResolution, QuoteServiceError> {
        let zip =
            normalize_zip(raw_zip).ok_or_else(|| QuoteServiceError::InvalidZip(raw_zip.to_string()))?;

        let resolved = self.resolver.resolve(&zip).await;
        match resolved {
            Ok(resolution) => Ok(resolution),
            Err(_) => {
                let table = self.tax_table()?;
                let (treatment, source) = table.treatment_for(Some(&zip), None);
                Ok(TaxResolution {
                    zip,
                    rate_percent: treatment.rate_percent,
                    source,
                })
            }
        }
    }

    pub fn lease_programs(&self) -> Result<Vec<LeaseProgram>, QuoteServiceError> {
        Ok(self.repository.lease_programs()?)
    }

    pub fn create_lease_program(
        &self,
        program: LeaseProgram,
    ) -> Result<LeaseProgram, QuoteServiceError> {
        validate_lease_program(&program)?;
        let stored = self.repository.insert_lease_program(program)?;
        tracing::info!(program_id = %stored.id, "lease program created");
        Ok(stored)
    }

    pub fn update_lease_program(&self, program: LeaseProgram) -> Result<(), QuoteServiceError> {
        validate_lease_program(&program)?;
        self.repository.update_lease_program(program)?;
        Ok(())
    }

    pub fn delete_lease_program(&self, id: &str) -> Result<(), QuoteServiceError> {
        self.repository.delete_lease_program(id)?;
        tracing::info!(program_id = id, "lease program deleted");
        Ok(())
    }

    pub fn finance_programs(&self) -> Result<Vec<FinanceProgram>, QuoteServiceError> {
        Ok(self.repository.finance_programs()?)
    }

    pub fn create_finance_program(
        &self,
        program: FinanceProgram,
    ) -> Result<FinanceProgram, QuoteServiceError> {
        validate_finance_program(&program)?;
        let stored = self.repository.insert_finance_program(program)?;
        tracing::info!(program_id = %stored.id, "finance program created");
        Ok(stored)
    }

    pub fn update_finance_program(&self, program: FinanceProgram) -> Result<(), QuoteServiceError> {
        validate_finance_program(&program)?;
        self.repository.update_finance_program(program)?;
        Ok(())
    }

    pub fn delete_finance_program(&self, id: &str) -> Result<(), QuoteServiceError> {
        self.repository.delete_finance_program(id)?;
        tracing::info!(program_id = id, "finance program deleted");
        Ok(())
    }

    pub fn tax_configs(&self) -> Result<Vec<TaxConfig>, QuoteServiceError> {
        Ok(self.repository.tax_configs()?)
    }

    fn tax_table(&self) -> Result<StaticTaxTable, RepositoryError> {
        Ok(StaticTaxTable::new(
            self.repository.tax_configs()?,
            self.defaults.default_tax_rate_percent,
        ))
    }

    async fn tax_treatment(
        &self,
        zip: Option<&str>,
        state: Option<&str>,
        last_known: Option<f64>,
    ) -> Result<(TaxTreatment, SessionRate), RepositoryError> {
        let table = self.tax_table()?;
        let normalized = zip.and_then(normalize_zip);
        let (mut treatment, table_source) = table.treatment_for(normalized.as_deref(), state);

        let session = match last_known {
            Some(rate) if rate.is_finite() && rate >= 0.0 => {
                TaxRateSession::new(rate, TaxSource::Client)
            }
            _ => TaxRateSession::new(treatment.rate_percent, table_source),
        };
        let rate = match zip {
            Some(zip) => session.update_zip(&self.resolver, zip).await,
            None => session.current(),
        };

        treatment.rate_percent = rate.rate_percent;
        Ok((treatment, rate))
    }
}

fn validate_lease_program(program: &LeaseProgram) -> Result<(), QuoteServiceError> {
    check_lease_program(program)
        .map_err(|defect| QuoteServiceError::InvalidProgram(format!("{}: {defect}", program.id)))
}

fn validate_finance_program(program: &FinanceProgram) -> Result<(), QuoteServiceError> {
    check_finance_program(program)
        .map_err(|defect| QuoteServiceError::InvalidProgram(format!("{}: {defect}", program.id)))
}
