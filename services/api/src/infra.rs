use autolease::config::CatalogConfig;
use autolease::error::AppError;
use autolease::pricing::{
    standard_finance_programs, standard_lease_programs, standard_tax_configs, FinanceProgram,
    LeaseProgram, ProgramCatalogImporter, ProgramRepository, RepositoryError, TaxConfig,
};
use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local program tables. Admin edits last until restart.
#[derive(Default, Clone)]
pub(crate) struct InMemoryProgramRepository {
    lease: Arc<Mutex<Vec<LeaseProgram>>>,
    finance: Arc<Mutex<Vec<FinanceProgram>>>,
    taxes: Arc<Mutex<Vec<TaxConfig>>>,
}

impl InMemoryProgramRepository {
    pub(crate) fn new(
        lease: Vec<LeaseProgram>,
        finance: Vec<FinanceProgram>,
        taxes: Vec<TaxConfig>,
    ) -> Self {
        Self {
            lease: Arc::new(Mutex::new(lease)),
            finance: Arc::new(Mutex::new(finance)),
            taxes: Arc::new(Mutex::new(taxes)),
        }
    }

    pub(crate) fn standard() -> Self {
        Self::new(
            standard_lease_programs(),
            standard_finance_programs(),
            standard_tax_configs(),
        )
    }

    /// Load each table from its configured CSV, or the standard seed when unset.
    pub(crate) fn from_catalog(config: &CatalogConfig) -> Result<Self, AppError> {
        let lease = match &config.lease_programs_csv {
            Some(path) => ProgramCatalogImporter::lease_programs_from_path(path)?,
            None => standard_lease_programs(),
        };
        let finance = match &config.finance_programs_csv {
            Some(path) => ProgramCatalogImporter::finance_programs_from_path(path)?,
            None => standard_finance_programs(),
        };
        let taxes = match &config.tax_config_csv {
            Some(path) => ProgramCatalogImporter::tax_configs_from_path(path)?,
            None => standard_tax_configs(),
        };

        info!(
            lease_programs = lease.len(),
            finance_programs = finance.len(),
            tax_configs = taxes.len(),
            "pricing catalog loaded"
        );
        Ok(Self::new(lease, finance, taxes))
    }
}

impl ProgramRepository for InMemoryProgramRepository {
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
        match guard.iter_mut().find(|existing| existing.id == program.id) {
            Some(slot) => {
                *slot = program;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn delete_lease_program(&self, id: &str) -> Result<(), RepositoryError> {
        let mut guard = self.lease.lock().expect("lease mutex poisoned");
        let before = guard.len();
        guard.retain(|existing| existing.id != id);
        if guard.len() == before {
            Err(RepositoryError::NotFound)
        } else {
            Ok(())
        }
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
        match guard.iter_mut().find(|existing| existing.id == program.id) {
            Some(slot) => {
                *slot = program;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn delete_finance_program(&self, id: &str) -> Result<(), RepositoryError> {
        let mut guard = self.finance.lock().expect("finance mutex poisoned");
        let before = guard.len();
        guard.retain(|existing| existing.id != id);
        if guard.len() == before {
            Err(RepositoryError::NotFound)
        } else {
            Ok(())
        }
    }

    fn tax_configs(&self) -> Result<Vec<TaxConfig>, RepositoryError> {
        Ok(self.taxes.lock().expect("tax mutex poisoned").clone())
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_repository_rejects_duplicate_ids() {
        let repository = InMemoryProgramRepository::standard();
        let existing = repository
            .lease_programs()
            .expect("list")
            .into_iter()
            .next()
            .expect("seeded program");

        assert!(matches!(
            repository.insert_lease_program(existing),
            Err(RepositoryError::Conflict)
        ));
    }

    #[test]
    fn deleting_unknown_program_is_not_found() {
        let repository = InMemoryProgramRepository::standard();

        assert!(matches!(
            repository.delete_finance_program("missing"),
            Err(RepositoryError::NotFound)
        ));
    }

    #[test]
    fn missing_catalog_file_fails_startup() {
        let config = CatalogConfig {
            tax_config_csv: Some("/nonexistent/taxes.csv".into()),
            ..CatalogConfig::default()
        };

        assert!(matches!(
            InMemoryProgramRepository::from_catalog(&config),
            Err(AppError::Catalog(_))
        ));
    }

    #[test]
    fn parse_date_reports_bad_input() {
        assert!(parse_date("2025-06-01").is_ok());
        let err = parse_date("06/01/2025").expect_err("rejects US format");
        assert!(err.contains("YYYY-MM-DD"));
    }
}
