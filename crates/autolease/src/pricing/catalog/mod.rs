//! Loading admin-maintained program and tax tables.

mod parser;
mod standard;

pub use standard::{standard_finance_programs, standard_lease_programs, standard_tax_configs};

use std::io::Read;
use std::path::Path;

use crate::pricing::domain::{FinanceProgram, LeaseProgram, TaxConfig};

#[derive(Debug, thiserror::Error)]
pub enum CatalogImportError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid catalog CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: invalid {field} '{value}'")]
    InvalidField {
        line: usize,
        field: &'static str,
        value: String,
    },
    #[error("line {line}: program {id} has no rate for any credit tier")]
    MissingPricing { line: usize, id: String },
}

/// CSV importer for the three admin tables.
pub struct ProgramCatalogImporter;

impl ProgramCatalogImporter {
    pub fn lease_programs_from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<Vec<LeaseProgram>, CatalogImportError> {
        let file = std::fs::File::open(path)?;
        Self::lease_programs_from_reader(file)
    }

    pub fn lease_programs_from_reader<R: Read>(
        reader: R,
    ) -> Result<Vec<LeaseProgram>, CatalogImportError> {
        parser::parse_lease_programs(reader)
    }

    pub fn finance_programs_from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<Vec<FinanceProgram>, CatalogImportError> {
        let file = std::fs::File::open(path)?;
        Self::finance_programs_from_reader(file)
    }

    pub fn finance_programs_from_reader<R: Read>(
        reader: R,
    ) -> Result<Vec<FinanceProgram>, CatalogImportError> {
        parser::parse_finance_programs(reader)
    }

    pub fn tax_configs_from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<Vec<TaxConfig>, CatalogImportError> {
        let file = std::fs::File::open(path)?;
        Self::tax_configs_from_reader(file)
    }

    pub fn tax_configs_from_reader<R: Read>(reader: R) -> Result<Vec<TaxConfig>, CatalogImportError> {
        parser::parse_tax_configs(reader)
    }
}
