mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::debt::{DebtServiceArgs, ScheduleArgs};
use commands::irr::IrrArgs;
use commands::metrics::{MetricsArgs, QuickArgs};

/// Commercial real-estate acquisition analysis
#[derive(Parser)]
#[command(
    name = "proforma",
    version,
    about = "Commercial real-estate investment metrics",
    long_about = "Underwrites commercial real-estate acquisitions with decimal precision. \
                  Covers NOI, cap rate, GRM, debt service, DSCR, LTV, cash-on-cash, \
                  amortization schedules, and hold-period IRR."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Full investment metrics for an acquisition (NOI through IRR)
    Metrics(MetricsArgs),
    /// Quick screen: NOI, cap rate, and GRM from price, rent, expenses
    Quick(QuickArgs),
    /// Annual debt service for a loan, including interest-only blends
    DebtService(DebtServiceArgs),
    /// Month-by-month amortization schedule
    Schedule(ScheduleArgs),
    /// Solve the IRR of an annual cash-flow series
    Irr(IrrArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Metrics(args) => commands::metrics::run_metrics(args),
        Commands::Quick(args) => commands::metrics::run_quick(args),
        Commands::DebtService(args) => commands::debt::run_debt_service(args),
        Commands::Schedule(args) => commands::debt::run_schedule(args),
        Commands::Irr(args) => commands::irr::run_irr(args),
        Commands::Version => {
            println!("proforma {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
