use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::pricing::domain::{
    EligibilityCriteria, FinanceProgram, LeaseProgram, TaxConfig, Vehicle, VehiclePattern,
};
use crate::pricing::repository::{ProgramRepository, RepositoryError};
use crate::pricing::{
    pricing_router, standard_finance_programs, standard_lease_programs, standard_tax_configs,
    LeaseQuoteRequest, PricingDefaults, QuoteService, TaxLookupError, TaxRateLookup,
};

pub(super) const DEFAULT_TAX_RATE: f64 = 7.75;

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date")
}

pub(super) fn created(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .expect("valid date")
        .and_hms_opt(0, 0, 0)
        .expect("valid time")
        .and_utc()
}

pub(super) fn rav4() -> Vehicle {
    Vehicle {
        brand: "Toyota".to_string(),
        model: "RAV4".to_string(),
        trim: Some("XLE".to_string()),
        year: 2025,
        msrp: 34_288.0,
        selling_price: None,
        state: None,
    }
}

pub(super) fn camry() -> Vehicle {
    Vehicle {
        brand: "Toyota".to_string(),
        model: "Camry".to_string(),
        trim: Some("XSE V6".to_string()),
        year: 2025,
        msrp: 31_170.0,
        selling_price: Some(30_400.0),
        state: Some("CA".to_string()),
    }
}

pub(super) fn standard_lease() -> LeaseProgram {
    standard_lease_programs()
        .into_iter()
        .find(|program| program.id == "toyota-lease-standard")
        .expect("standard Toyota lease program")
}

pub(super) fn standard_finance() -> FinanceProgram {
    standard_finance_programs()
        .into_iter()
        .find(|program| program.id == "toyota-finance-standard")
        .expect("standard Toyota finance program")
}

pub(super) fn criteria(brand: &str, created_at: DateTime<Utc>) -> EligibilityCriteria {
    EligibilityCriteria {
        brand: brand.to_string(),
        model: None,
        trim: None,
        year_from: 2024,
        year_to: 2026,
        eligible_states: Vec::new(),
        min_credit_score: 0,
        active_from: NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date"),
        active_to: None,
        created_at,
    }
}

pub(super) fn lease_program(id: &str, criteria: EligibilityCriteria) -> LeaseProgram {
    LeaseProgram {
        id: id.to_string(),
        criteria,
        ..standard_lease()
    }
}

pub(super) fn model_pattern(model: &str) -> Option<VehiclePattern> {
    Some(VehiclePattern::Exact(model.to_string()))
}

pub(super) fn lease_request(vehicle: Vehicle, credit_score: u16) -> LeaseQuoteRequest {
    LeaseQuoteRequest {
        vehicle,
        credit_score,
        term_months: 36,
        annual_mileage: 10_000,
        down_payment: 0.0,
        zip: None,
        last_known_tax_rate: None,
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryProgramRepository {
    lease: Arc<Mutex<Vec<LeaseProgram>>>,
    finance: Arc<Mutex<Vec<FinanceProgram>>>,
    taxes: Arc<Mutex<Vec<TaxConfig>>>,
}

impl MemoryProgramRepository {
    pub(super) fn seeded() -> Self {
        let repository = Self::default();
        *repository.lease.lock().expect("lease mutex poisoned") = standard_lease_programs();
        *repository.finance.lock().expect("finance mutex poisoned") = standard_finance_programs();
        *repository.taxes.lock().expect("tax mutex poisoned") = standard_tax_configs();
        repository
    }
}

impl ProgramRepository for MemoryProgramRepository {
    fn lease_programs(&self) -> Result<Vec<LeaseProgram>, RepositoryError> {
        Ok(self.lease.lock().expect("lease mutex poisoned").clone())
    }

    fn insert_lease_program(&self, program: LeaseProgram) -> Result<LeaseProgram, RepositoryError> {
        let mut guard = self.lease.lock().expect("lease mutex poisoned");
        if guard.iter().any(|existing| existing.id == program.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(program.clone());
        Ok(program)
    }

    fn update_lease_program(&self, program: LeaseProgram) -> Result<(), RepositoryError> {
        let mut guard = self.lease.lock().expect("lease mutex poisoned");
        let slot = guard
            .iter_mut()
            .find(|existing| existing.id == program.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = program;
        Ok(())
    }

    fn delete_lease_program(&self, id: &str) -> Result<(), RepositoryError> {
        let mut guard = self.lease.lock().expect("lease mutex poisoned");
        let before = guard.len();
        guard.retain(|existing| existing.id != id);
        if guard.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn finance_programs(&self) -> Result<Vec<FinanceProgram>, RepositoryError> {
        Ok(self.finance.lock().expect("finance mutex poisoned").clone())
    }

    fn insert_finance_program(
        &self,
        program: FinanceProgram,
    ) -> Result<FinanceProgram, RepositoryError> {
        let mut guard = self.finance.lock().expect("finance mutex poisoned");
        if guard.iter().any(|existing| existing.id == program.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(program.clone());
        Ok(program)
    }

    fn update_finance_program(&self, program: FinanceProgram) -> Result<(), RepositoryError> {
        let mut guard = self.finance.lock().expect("finance mutex poisoned");
        let slot = guard
            .iter_mut()
            .find(|existing| existing.id == program.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = program;
        Ok(())
    }

    fn delete_finance_program(&self, id: &str) -> Result<(), RepositoryError> {
        let mut guard = self.finance.lock().expect("finance mutex poisoned");
        let before = guard.len();
        guard.retain(|existing| existing.id != id);
        if guard.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn tax_configs(&self) -> Result<Vec<TaxConfig>, RepositoryError> {
        Ok(self.taxes.lock().expect("tax mutex poisoned").clone())
    }
}

pub(super) struct UnavailableRepository;

impl ProgramRepository for UnavailableRepository {
    fn lease_programs(&self) -> Result<Vec<LeaseProgram>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert_lease_program(&self, _program: LeaseProgram) -> Result<LeaseProgram, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_lease_program(&self, _program: LeaseProgram) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete_lease_program(&self, _id: &str) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn finance_programs(&self) -> Result<Vec<FinanceProgram>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert_finance_program(
        &self,
        _program: FinanceProgram,
    ) -> Result<FinanceProgram, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_finance_program(&self, _program: FinanceProgram) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete_finance_program(&self, _id: &str) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn tax_configs(&self) -> Result<Vec<TaxConfig>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Fixed ZIP to rate answers; unknown ZIPs fail like a remote 404.
#[derive(Default, Clone)]
pub(super) struct StaticLookup {
    rates: Arc<Mutex<HashMap<String, f64>>>,
    calls: Arc<AtomicUsize>,
}

impl StaticLookup {
    pub(super) fn with_rates(rates: &[(&str, f64)]) -> Self {
        Self {
            rates: Arc::new(Mutex::new(
                rates
                    .iter()
                    .map(|(zip, rate)| (zip.to_string(), *rate))
                    .collect(),
            )),
            calls: Arc::default(),
        }
    }

    pub(super) fn set_rate(&self, zip: &str, rate: f64) {
        self.rates
            .lock()
            .expect("rates mutex poisoned")
            .insert(zip.to_string(), rate);
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TaxRateLookup for StaticLookup {
    fn fetch(&self, zip: &str) -> impl Future<Output = Result<f64, TaxLookupError>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = self
            .rates
            .lock()
            .expect("rates mutex poisoned")
            .get(zip)
            .copied()
            .ok_or(TaxLookupError::Status(404));
        std::future::ready(result)
    }
}

pub(super) struct FailingLookup;

impl TaxRateLookup for FailingLookup {
    fn fetch(&self, _zip: &str) -> impl Future<Output = Result<f64, TaxLookupError>> + Send {
        std::future::ready(Err(TaxLookupError::Status(503)))
    }
}

pub(super) fn defaults() -> PricingDefaults {
    PricingDefaults {
        default_tax_rate_percent: DEFAULT_TAX_RATE,
    }
}

pub(super) fn lookup() -> StaticLookup {
    StaticLookup::with_rates(&[("92101", 7.75), ("90210", 9.5), ("10001", 8.875)])
}

pub(super) fn build_service() -> (
    QuoteService<MemoryProgramRepository, StaticLookup>,
    Arc<MemoryProgramRepository>,
    StaticLookup,
) {
    let repository = Arc::new(MemoryProgramRepository::seeded());
    let lookup = lookup();
    let service = QuoteService::new(repository.clone(), lookup.clone(), defaults());
    (service, repository, lookup)
}

pub(super) fn router_with_service(
    service: QuoteService<MemoryProgramRepository, StaticLookup>,
) -> axum::Router {
    pricing_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}
