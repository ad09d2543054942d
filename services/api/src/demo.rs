use crate::infra::{parse_date, InMemoryProgramRepository};
use autolease::config::AppConfig;
use autolease::error::AppError;
use autolease::pricing::{
    format_currency, ConfiguredTaxLookup, FinanceQuoteRequest, FinanceQuoteResponse,
    LeaseQuoteRequest, LeaseQuoteResponse, PricingDefaults, ProgramRepository, QuoteService,
    TaxRateLookup, TaxRateResolver, Vehicle,
};
use chrono::{Local, NaiveDate};
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug, Clone)]
pub(crate) struct VehicleArgs {
    /// Vehicle brand, e.g. Toyota
    #[arg(long)]
    pub(crate) brand: String,
    /// Vehicle model, e.g. RAV4
    #[arg(long)]
    pub(crate) model: String,
    /// Trim level
    #[arg(long)]
    pub(crate) trim: Option<String>,
    /// Model year
    #[arg(long)]
    pub(crate) year: u16,
    /// Manufacturer's suggested retail price
    #[arg(long)]
    pub(crate) msrp: f64,
    /// Negotiated selling price (defaults to MSRP)
    #[arg(long)]
    pub(crate) selling_price: Option<f64>,
    /// Two-letter state of registration
    #[arg(long)]
    pub(crate) state: Option<String>,
}

impl VehicleArgs {
    fn into_vehicle(self) -> Vehicle {
        Vehicle {
            brand: self.brand,
            model: self.model,
            trim: self.trim,
            year: self.year,
            msrp: self.msrp,
            selling_price: self.selling_price,
            state: self.state,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct LeaseArgs {
    #[command(flatten)]
    pub(crate) vehicle: VehicleArgs,
    /// Shopper credit score
    #[arg(long)]
    pub(crate) credit_score: u16,
    /// Lease term in months
    #[arg(long, default_value_t = 36)]
    pub(crate) term: u16,
    /// Annual mileage allowance
    #[arg(long, default_value_t = 10_000)]
    pub(crate) mileage: u32,
    /// Cash down (capitalized cost reduction)
    #[arg(long, default_value_t = 0.0)]
    pub(crate) down_payment: f64,
    /// ZIP code used for the sales tax lookup
    #[arg(long)]
    pub(crate) zip: Option<String>,
    /// Pricing date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) date: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct FinanceArgs {
    #[command(flatten)]
    pub(crate) vehicle: VehicleArgs,
    /// Shopper credit score
    #[arg(long)]
    pub(crate) credit_score: u16,
    /// Loan term in months
    #[arg(long, default_value_t = 60)]
    pub(crate) term: u16,
    /// Cash down
    #[arg(long, default_value_t = 0.0)]
    pub(crate) down_payment: f64,
    /// ZIP code used for the sales tax lookup
    #[arg(long)]
    pub(crate) zip: Option<String>,
    /// Pricing date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) date: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Pricing date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) date: Option<NaiveDate>,
}

type ConfiguredService = QuoteService<InMemoryProgramRepository, ConfiguredTaxLookup>;

fn configured_service() -> Result<ConfiguredService, AppError> {
    let config = AppConfig::load()?;
    let repository = InMemoryProgramRepository::from_catalog(&config.catalog)?;
    let lookup = ConfiguredTaxLookup::from_config(&config.tax)?;
    Ok(QuoteService::with_resolver(
        Arc::new(repository),
        Arc::new(TaxRateResolver::with_ttl(lookup, config.tax.cache_ttl())),
        PricingDefaults {
            default_tax_rate_percent: config.tax.default_rate_percent,
        },
    ))
}

pub(crate) async fn run_lease_quote(args: LeaseArgs) -> Result<(), AppError> {
    let service = configured_service()?;
    let today = args.date.unwrap_or_else(|| Local::now().date_naive());
    let request = LeaseQuoteRequest {
        vehicle: args.vehicle.into_vehicle(),
        credit_score: args.credit_score,
        term_months: args.term,
        annual_mileage: args.mileage,
        down_payment: args.down_payment,
        zip: args.zip,
        last_known_tax_rate: None,
    };

    let response = service.lease_quote(request, today).await?;
    render_lease_quote(&response);
    Ok(())
}

pub(crate) async fn run_finance_quote(args: FinanceArgs) -> Result<(), AppError> {
    let service = configured_service()?;
    let today = args.date.unwrap_or_else(|| Local::now().date_naive());
    let request = FinanceQuoteRequest {
        vehicle: args.vehicle.into_vehicle(),
        credit_score: args.credit_score,
        term_months: args.term,
        down_payment: args.down_payment,
        zip: args.zip,
        last_known_tax_rate: None,
    };

    let response = service.finance_quote(request, today).await?;
    render_finance_quote(&response);
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.date.unwrap_or_else(|| Local::now().date_naive());
    let service = QuoteService::new(
        Arc::new(InMemoryProgramRepository::standard()),
        ConfiguredTaxLookup::Disabled,
        PricingDefaults {
            default_tax_rate_percent: 7.75,
        },
    );

    println!("Autolease pricing demo ({today})");
    println!(
        "Catalog: {} lease programs, {} finance programs",
        service.lease_programs()?.len(),
        service.finance_programs()?.len()
    );

    let rav4 = demo_vehicle("RAV4", "XLE", 34_288.0);
    let lease = service
        .lease_quote(demo_lease_request(rav4.clone(), 760), today)
        .await?;
    println!("\n2025 Toyota RAV4 XLE lease");
    render_lease_quote(&lease);

    let finance = service
        .finance_quote(
            FinanceQuoteRequest {
                vehicle: rav4,
                credit_score: 760,
                term_months: 60,
                down_payment: 3_000.0,
                zip: Some("92101".to_string()),
                last_known_tax_rate: None,
            },
            today,
        )
        .await?;
    println!("\n2025 Toyota RAV4 XLE finance");
    render_finance_quote(&finance);

    println!("\nCamry lease by credit score");
    let camry = demo_vehicle("Camry", "SE", 31_170.0);
    print_credit_ladder(&service, &camry, today).await;

    Ok(())
}

async fn print_credit_ladder<R, L>(service: &QuoteService<R, L>, vehicle: &Vehicle, today: NaiveDate)
where
    R: ProgramRepository + 'static,
    L: TaxRateLookup + 'static,
{
    for score in [780, 720, 680, 640, 600] {
        let request = demo_lease_request(vehicle.clone(), score);
        match service.lease_quote(request, today).await {
            Ok(response) => println!(
                "- {score}: {} via {} ({} due at signing)",
                response.display.monthly_payment,
                response.program_id,
                response.display.due_at_signing
            ),
            Err(err) => println!("- {score}: {err}"),
        }
    }
}

fn demo_vehicle(model: &str, trim: &str, msrp: f64) -> Vehicle {
    Vehicle {
        brand: "Toyota".to_string(),
        model: model.to_string(),
        trim: Some(trim.to_string()),
        year: 2025,
        msrp,
        selling_price: None,
        state: None,
    }
}

fn demo_lease_request(vehicle: Vehicle, credit_score: u16) -> LeaseQuoteRequest {
    LeaseQuoteRequest {
        vehicle,
        credit_score,
        term_months: 36,
        annual_mileage: 10_000,
        down_payment: 0.0,
        zip: Some("92101".to_string()),
        last_known_tax_rate: None,
    }
}

pub(crate) fn render_lease_quote(response: &LeaseQuoteResponse) {
    let display = &response.display;
    let breakdown = &response.quote.breakdown;
    println!("Program: {} ({})", response.program_id, response.lender);
    println!(
        "- {} for {} at {}",
        display.monthly_payment, display.term, display.mileage
    );
    println!(
        "- Money factor {} (~{} APR) | residual {}",
        display.money_factor, display.equivalent_apr, display.residual_value
    );
    println!(
        "- Sales tax {:.3}% ({:?})",
        response.tax.rate_percent, response.tax.source
    );
    println!("- Due at signing {}", display.due_at_signing);
    println!("  - First payment {}", format_currency(breakdown.first_payment));
    if breakdown.down_payment > 0.0 {
        println!("  - Down payment {}", format_currency(breakdown.down_payment));
    }
    println!(
        "  - Acquisition {} | registration {} | doc {}",
        format_currency(breakdown.acquisition_fee),
        format_currency(breakdown.registration_fee),
        format_currency(breakdown.doc_fee)
    );
    println!(
        "  - Fee tax {}",
        format_currency(breakdown.fee_tax + breakdown.doc_fee_tax)
    );
    println!("- Total lease cost {}", display.total_cost);
}

pub(crate) fn render_finance_quote(response: &FinanceQuoteResponse) {
    let display = &response.display;
    println!("Program: {} ({})", response.program_id, response.lender);
    println!(
        "- {} for {} at {} APR",
        display.monthly_payment, display.term, display.apr
    );
    println!(
        "- Sales tax {:.3}% ({:?})",
        response.tax.rate_percent, response.tax.source
    );
    println!(
        "- Amount financed {} | due at signing {}",
        display.amount_financed, display.due_at_signing
    );
    println!(
        "- Total interest {} | total cost {}",
        display.total_interest, display.total_cost
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn demo_runs_against_standard_catalog() {
        let args = DemoArgs {
            date: NaiveDate::from_ymd_opt(2025, 6, 1),
        };

        run_demo(args).await.expect("demo completes");
    }

    #[test]
    fn vehicle_args_default_selling_price_to_msrp() {
        let vehicle = VehicleArgs {
            brand: "Honda".to_string(),
            model: "Civic".to_string(),
            trim: None,
            year: 2025,
            msrp: 25_045.0,
            selling_price: None,
            state: Some("NY".to_string()),
        }
        .into_vehicle();

        assert_eq!(vehicle.selling_price(), 25_045.0);
        assert_eq!(vehicle.state.as_deref(), Some("NY"));
    }
}
