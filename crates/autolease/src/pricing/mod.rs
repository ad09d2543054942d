//! Lease and finance pricing for the storefront.
//!
//! Programs are matched against the selected vehicle and credit score, sales
//! tax is resolved for the shopper's ZIP, and the closed-form formulas produce
//! the payment, due-at-signing, and total-cost figures.

pub mod catalog;
pub mod domain;
pub mod formula;
pub mod matcher;
pub mod presentation;
pub mod repository;
pub mod router;
pub mod schedule;
pub mod service;
pub mod tax;
mod validation;

#[cfg(test)]
mod tests;

pub use catalog::{
    standard_finance_programs, standard_lease_programs, standard_tax_configs, CatalogImportError,
    ProgramCatalogImporter,
};
pub use domain::{
    CreditTier, EligibilityCriteria, FeeSchedule, FinanceProgram, LeaseProgram, ProgramCriteria,
    TaxConfig, TaxTreatment, Vehicle, VehiclePattern,
};
pub use formula::{
    amortized_payment, compute_finance_quote, compute_lease_quote, equivalent_apr,
    DueAtSigningBreakdown, FinanceQuote, FinanceQuoteInput, LeaseQuote, LeaseQuoteInput,
    QuoteError,
};
pub use matcher::{evaluate_program, match_program, MatchVerdict, Specificity};
pub use presentation::{
    format_currency, format_whole_dollars, FinanceQuoteDisplay, LeaseQuoteDisplay,
};
pub use repository::{ProgramRepository, RepositoryError};
pub use router::pricing_router;
pub use schedule::{mileage_adjustment, residual_percent, MileageAdjustments, ResidualSchedule};
pub use service::{
    FinanceQuoteRequest, FinanceQuoteResponse, LeaseQuoteRequest, LeaseQuoteResponse,
    PricingDefaults, ProgramKind, QuoteService, QuoteServiceError,
};
pub use tax::{
    normalize_zip, ConfiguredTaxLookup, HttpTaxRateLookup, LookupTicket, SessionRate,
    StaticTaxTable, TaxLookupError, TaxRateLookup, TaxRateResolver, TaxRateSession,
    TaxResolution, TaxSource,
};
