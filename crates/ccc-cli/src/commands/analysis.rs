use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use ccc_core::analysis::{self, AnalysisConfig};
use ccc_core::metrics::report;
use ccc_core::metrics::table::FinancialTable;

use crate::input;

/// Arguments for the full cash conversion cycle analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to CSV file of financial periods (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Path to JSON configuration file
    #[arg(long)]
    pub config: Option<String>,

    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

/// Arguments for per-period ratio derivation
#[derive(Args)]
pub struct RatiosArgs {
    /// Path to CSV file of financial periods (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a data-free sensitivity run
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to JSON configuration file
    #[arg(long)]
    pub config: Option<String>,

    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

/// Flags that take precedence over the configuration file
#[derive(Args, Default)]
pub struct ConfigOverrides {
    /// Annual interest rate applied to released cash (e.g. 0.10)
    #[arg(long)]
    pub interest_rate: Option<Decimal>,

    /// Annual inventory holding cost rate (e.g. 0.15)
    #[arg(long)]
    pub holding_cost_rate: Option<Decimal>,

    /// Number of Monte Carlo samples
    #[arg(long)]
    pub samples: Option<u32>,

    /// Seed for a reproducible simulation
    #[arg(long)]
    pub seed: Option<u64>,

    /// Mean of the multiplicative demand shock
    #[arg(long)]
    pub shock_mean: Option<f64>,

    /// Standard deviation of the multiplicative demand shock
    #[arg(long)]
    pub shock_stdev: Option<f64>,
}

impl ConfigOverrides {
    fn apply(&self, config: &mut AnalysisConfig) {
        if let Some(rate) = self.interest_rate {
            config.annual_interest_rate = rate;
        }
        if let Some(rate) = self.holding_cost_rate {
            config.holding_cost_rate = rate;
        }
        if let Some(n) = self.samples {
            config.sensitivity.sample_count = n;
        }
        if let Some(seed) = self.seed {
            config.sensitivity.seed = Some(seed);
        }
        if let Some(mean) = self.shock_mean {
            config.sensitivity.shock_mean = mean;
        }
        if let Some(stdev) = self.shock_stdev {
            config.sensitivity.shock_stdev = stdev;
        }
    }
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = load_config(args.config.as_deref(), &args.overrides)?;
    let table = load_table(args.input.as_deref(), "cash conversion cycle analysis")?;
    let result = analysis::run_analysis(&table, &config)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_ratios(args: RatiosArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let table = load_table(args.input.as_deref(), "ratio derivation")?;
    let result = report::analyze_ratios(&table)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = load_config(args.config.as_deref(), &args.overrides)?;
    let result = analysis::run_simulation(&config)?;
    Ok(serde_json::to_value(result)?)
}

fn load_config(
    path: Option<&str>,
    overrides: &ConfigOverrides,
) -> Result<AnalysisConfig, Box<dyn std::error::Error>> {
    let mut config: AnalysisConfig = match path {
        Some(path) => input::file::read_json(path)?,
        None => AnalysisConfig::default(),
    };
    overrides.apply(&mut config);
    Ok(config)
}

fn load_table(
    path: Option<&str>,
    purpose: &str,
) -> Result<FinancialTable, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        input::file::read_csv_table(path)
    } else if let Some(text) = input::stdin::read_stdin()? {
        Ok(input::table::parse_csv(text.as_bytes())?)
    } else {
        Err(format!("--input <file.csv> or stdin required for {}", purpose).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_overrides_replace_only_given_fields() {
        let mut config = AnalysisConfig::default();
        let overrides = ConfigOverrides {
            interest_rate: Some(dec!(0.08)),
            seed: Some(7),
            ..Default::default()
        };
        overrides.apply(&mut config);

        assert_eq!(config.annual_interest_rate, dec!(0.08));
        assert_eq!(config.sensitivity.seed, Some(7));
        assert_eq!(config.holding_cost_rate, dec!(0.15));
        assert_eq!(config.sensitivity.sample_count, 1000);
    }
}
