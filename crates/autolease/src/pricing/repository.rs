use super::domain::{FinanceProgram, LeaseProgram, TaxConfig};

/// Storage for the admin-configured pricing tables. Quotes only read from it.
pub trait ProgramRepository: Send + Sync {
    fn lease_programs(&self) -> Result<Vec<LeaseProgram>, RepositoryError>;
    fn insert_lease_program(&self, program: LeaseProgram) -> Result<LeaseProgram, RepositoryError>;
    fn update_lease_program(&self, program: LeaseProgram) -> Result<(), RepositoryError>;
    fn delete_lease_program(&self, id: &str) -> Result<(), RepositoryError>;

    fn finance_programs(&self) -> Result<Vec<FinanceProgram>, RepositoryError>;
    fn insert_finance_program(
        &self,
        program: FinanceProgram,
    ) -> Result<FinanceProgram, RepositoryError>;
    fn update_finance_program(&self, program: FinanceProgram) -> Result<(), RepositoryError>;
    fn delete_finance_program(&self, id: &str) -> Result<(), RepositoryError>;

    fn tax_configs(&self) -> Result<Vec<TaxConfig>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
