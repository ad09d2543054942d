use crate::demo::{run_demo, run_finance_quote, run_lease_quote, DemoArgs, FinanceArgs, LeaseArgs};
use crate::server;
use autolease::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Autolease Pricing",
    about = "Run the lease and finance pricing service or price a vehicle from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Price a single vehicle against the configured catalog
    Quote {
        #[command(subcommand)]
        command: QuoteCommand,
    },
    /// Print sample lease and finance quotes from the standard catalog
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum QuoteCommand {
    /// Quote a lease
    Lease(LeaseArgs),
    /// Quote a retail installment loan
    Finance(FinanceArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Quote {
            command: QuoteCommand::Lease(args),
        } => run_lease_quote(args).await,
        Command::Quote {
            command: QuoteCommand::Finance(args),
        } => run_finance_quote(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lease_quote_arguments() {
        let cli = Cli::try_parse_from([
            "autolease",
            "quote",
            "lease",
            "--brand",
            "Toyota",
            "--model",
            "RAV4",
            "--year",
            "2025",
            "--msrp",
            "34288",
            "--credit-score",
            "760",
            "--zip",
            "92101",
        ])
        .expect("arguments parse");

        match cli.command {
            Some(Command::Quote {
                command: QuoteCommand::Lease(args),
            }) => {
                assert_eq!(args.vehicle.model, "RAV4");
                assert_eq!(args.term, 36);
                assert_eq!(args.mileage, 10_000);
                assert_eq!(args.zip.as_deref(), Some("92101"));
            }
            other => panic!("expected lease quote command, got {other:?}"),
        }
    }

    #[test]
    fn defaults_to_serve() {
        let cli = Cli::try_parse_from(["autolease"]).expect("arguments parse");
        assert!(cli.command.is_none());
    }

    #[test]
    fn rejects_malformed_dates() {
        let result = Cli::try_parse_from(["autolease", "demo", "--date", "June 1"]);
        assert!(result.is_err());
    }
}
