mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::analysis::{AnalyzeArgs, RatiosArgs, SimulateArgs};
use commands::optimize::OptimizeArgs;

/// Cash conversion cycle analysis and working-capital optimisation
#[derive(Parser)]
#[command(
    name = "ccc",
    version,
    about = "Cash conversion cycle analysis and working-capital optimisation",
    long_about = "Derives DSO, DIO, DPO and the cash conversion cycle from a CSV of \
                  financial periods, solves for the shortest cycle the policy bounds \
                  allow, and reports the cash released with a Monte Carlo sensitivity pass."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log level when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis: ratios, optimum, cash impact and sensitivity
    Analyze(AnalyzeArgs),
    /// Derive per-period ratios and the baseline summary
    Ratios(RatiosArgs),
    /// Solve the policy-bounded cycle minimisation
    Optimize(OptimizeArgs),
    /// Run the Monte Carlo sensitivity pass on the optimum
    Simulate(SimulateArgs),
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
    logging::init_logging(&cli.log_level);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Analyze(args) => commands::analysis::run_analyze(args),
        Commands::Ratios(args) => commands::analysis::run_ratios(args),
        Commands::Optimize(args) => commands::optimize::run_optimize(args),
        Commands::Simulate(args) => commands::analysis::run_simulate(args),
        Commands::Version => {
            println!("ccc {}", env!("CARGO_PKG_VERSION"));
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
