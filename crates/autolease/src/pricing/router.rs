use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use serde_json::json;

use super::domain::{FinanceProgram, LeaseProgram};
use super::repository::{ProgramRepository, RepositoryError};
use super::service::{FinanceQuoteRequest, LeaseQuoteRequest, QuoteService, QuoteServiceError};
use super::tax::TaxRateLookup;

type SharedService<R, L> = State<Arc<QuoteService<R, L>>>;

/// Router builder exposing quote, tax, and program endpoints.
pub fn pricing_router<R, L>(service: Arc<QuoteService<R, L>>) -> Router
where
    R: ProgramRepository + 'static,
    L: TaxRateLookup + 'static,
{
    Router::new()
        .route("/api/v1/quotes/lease", post(lease_quote_handler::<R, L>))
        .route("/api/v1/quotes/finance", post(finance_quote_handler::<R, L>))
        .route("/api/v1/tax-rates/:zip", get(tax_rate_handler::<R, L>))
        .route(
            "/api/v1/programs/lease",
            get(list_lease_handler::<R, L>).post(create_lease_handler::<R, L>),
        )
        .route(
            "/api/v1/programs/lease/:program_id",
            put(update_lease_handler::<R, L>).delete(delete_lease_handler::<R, L>),
        )
        .route(
            "/api/v1/programs/finance",
            get(list_finance_handler::<R, L>).post(create_finance_handler::<R, L>),
        )
        .route(
            "/api/v1/programs/finance/:program_id",
            put(update_finance_handler::<R, L>).delete(delete_finance_handler::<R, L>),
        )
        .route("/api/v1/tax-configs", get(tax_configs_handler::<R, L>))
        .with_state(service)
}

pub(crate) fn error_response(error: QuoteServiceError) -> Response {
    let status = match &error {
        QuoteServiceError::NoMatchingProgram(_) => StatusCode::NOT_FOUND,
        QuoteServiceError::Quote(_)
        | QuoteServiceError::InvalidZip(_)
        | QuoteServiceError::InvalidProgram(_) => StatusCode::UNPROCESSABLE_ENTITY,
        QuoteServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        QuoteServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        QuoteServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %error, "pricing request failed");
    }

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn lease_quote_handler<R, L>(
    State(service): SharedService<R, L>,
    axum::Json(request): axum::Json<LeaseQuoteRequest>,
) -> Response
where
    R: ProgramRepository + 'static,
    L: TaxRateLookup + 'static,
{
    match service.lease_quote(request, Utc::now().date_naive()).await {
        Ok(response) => (StatusCode::OK, axum::Json(response)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn finance_quote_handler<R, L>(
    State(service): SharedService<R, L>,
    axum::Json(request): axum::Json<FinanceQuoteRequest>,
) -> Response
where
    R: ProgramRepository + 'static,
    L: TaxRateLookup + 'static,
{
    match service.finance_quote(request, Utc::now().date_naive()).await {
        Ok(response) => (StatusCode::OK, axum::Json(response)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn tax_rate_handler<R, L>(
    State(service): SharedService<R, L>,
    Path(zip): Path<String>,
) -> Response
where
    R: ProgramRepository + 'static,
    L: TaxRateLookup + 'static,
{
    match service.tax_rate(&zip).await {
        Ok(resolution) => (StatusCode::OK, axum::Json(resolution)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_lease_handler<R, L>(State(service): SharedService<R, L>) -> Response
where
    R: ProgramRepository + 'static,
    L: TaxRateLookup + 'static,
{
    match service.lease_programs() {
        Ok(programs) => (StatusCode::OK, axum::Json(programs)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_lease_handler<R, L>(
    State(service): SharedService<R, L>,
    axum::Json(program): axum::Json<LeaseProgram>,
) -> Response
where
    R: ProgramRepository + 'static,
    L: TaxRateLookup + 'static,
{
    match service.create_lease_program(program) {
        Ok(program) => (StatusCode::CREATED, axum::Json(program)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_lease_handler<R, L>(
    State(service): SharedService<R, L>,
    Path(program_id): Path<String>,
    axum::Json(mut program): axum::Json<LeaseProgram>,
) -> Response
where
    R: ProgramRepository + 'static,
    L: TaxRateLookup + 'static,
{
    program.id = program_id;
    match service.update_lease_program(program) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_lease_handler<R, L>(
    State(service): SharedService<R, L>,
    Path(program_id): Path<String>,
) -> Response
where
    R: ProgramRepository + 'static,
    L: TaxRateLookup + 'static,
{
    match service.delete_lease_program(&program_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_finance_handler<R, L>(State(service): SharedService<R, L>) -> Response
where
    R: ProgramRepository + 'static,
    L: TaxRateLookup + 'static,
{
    match service.finance_programs() {
        Ok(programs) => (StatusCode::OK, axum::Json(programs)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_finance_handler<R, L>(
    State(service): SharedService<R, L>,
    axum::Json(program): axum::Json<FinanceProgram>,
) -> Response
where
    R: ProgramRepository + 'static,
    L: TaxRateLookup + 'static,
{
    match service.create_finance_program(program) {
        Ok(program) => (StatusCode::CREATED, axum::Json(program)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_finance_handler<R, L>(
    State(service): SharedService<R, L>,
    Path(program_id): Path<String>,
    axum::Json(mut program): axum::Json<FinanceProgram>,
) -> Response
where
    R: ProgramRepository + 'static,
    L: TaxRateLookup + 'static,
{
    program.id = program_id;
    match service.update_finance_program(program) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_finance_handler<R, L>(
    State(service): SharedService<R, L>,
    Path(program_id): Path<String>,
) -> Response
where
    R: ProgramRepository + 'static,
    L: TaxRateLookup + 'static,
{
    match service.delete_finance_program(&program_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn tax_configs_handler<R, L>(State(service): SharedService<R, L>) -> Response
where
    R: ProgramRepository + 'static,
    L: TaxRateLookup + 'static,
{
    match service.tax_configs() {
        Ok(configs) => (StatusCode::OK, axum::Json(configs)).into_response(),
        Err(error) => error_response(error),
    }
}
