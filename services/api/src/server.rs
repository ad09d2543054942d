use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryProgramRepository};
use crate::routes::with_pricing_routes;
use autolease::config::AppConfig;
use autolease::error::AppError;
use autolease::pricing::{ConfiguredTaxLookup, PricingDefaults, QuoteService, TaxRateResolver};
use autolease::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryProgramRepository::from_catalog(&config.catalog)?);
    let lookup = ConfiguredTaxLookup::from_config(&config.tax)?;
    if matches!(lookup, ConfiguredTaxLookup::Disabled) {
        warn!("APP_TAX_LOOKUP_URL not set; quotes use the static tax table");
    }
    let resolver = Arc::new(TaxRateResolver::with_ttl(lookup, config.tax.cache_ttl()));
    let quote_service = Arc::new(QuoteService::with_resolver(
        repository,
        resolver,
        PricingDefaults {
            default_tax_rate_percent: config.tax.default_rate_percent,
        },
    ));

    let app = with_pricing_routes(quote_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "pricing service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
