use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CccError;
use crate::metrics::baseline::{BaselineSummary, CycleBreakdown};
use crate::metrics::correlation::{correlation_matrix, CorrelationMatrix};
use crate::metrics::ratios::{DerivedRatios, RecordFailure};
use crate::metrics::report::build_ratio_report;
use crate::metrics::table::FinancialTable;
use crate::metrics::trend::CccTrend;
use crate::optimizer::bounds::OptimizationBounds;
use crate::optimizer::impact::{
    compute_carrying_savings, compute_financial_impact, CarryingSavings, FinancialImpact,
};
use crate::optimizer::lp::{optimize, OptimizationResult};
use crate::simulation::distribution::{
    probability_above, summarize_samples, SampleDistribution, DEFAULT_HISTOGRAM_BINS,
};
use crate::simulation::sensitivity::{run_sensitivity, SensitivityConfig, SimulationSample};
use crate::types::{with_metadata, ComputationOutput, Precision, Rate};
use crate::CccResult;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Everything a run needs besides the data itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Annual cost of funding the cash tied up in the cycle
    #[serde(default = "default_interest_rate")]
    pub annual_interest_rate: Rate,
    /// Annual cost of holding inventory, as a fraction of its value
    #[serde(default = "default_holding_cost_rate")]
    pub holding_cost_rate: Rate,
    #[serde(default)]
    pub bounds: OptimizationBounds,
    #[serde(default)]
    pub sensitivity: SensitivityConfig,
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
}

fn default_interest_rate() -> Rate {
    dec!(0.10)
}

fn default_holding_cost_rate() -> Rate {
    dec!(0.15)
}

fn default_histogram_bins() -> usize {
    DEFAULT_HISTOGRAM_BINS
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            annual_interest_rate: default_interest_rate(),
            holding_cost_rate: default_holding_cost_rate(),
            bounds: OptimizationBounds::default(),
            sensitivity: SensitivityConfig::default(),
            histogram_bins: default_histogram_bins(),
        }
    }
}

impl AnalysisConfig {
    /// Reject malformed configuration before any data is considered.
    pub fn validate(&self) -> CccResult<()> {
        for (field, rate) in [
            ("annual_interest_rate", self.annual_interest_rate),
            ("holding_cost_rate", self.holding_cost_rate),
        ] {
            if rate < Decimal::ZERO {
                return Err(CccError::InvalidConfiguration {
                    field: field.into(),
                    reason: format!("Rate must be non-negative (got {rate})"),
                });
            }
        }
        if self.histogram_bins == 0 {
            return Err(CccError::InvalidConfiguration {
                field: "histogram_bins".into(),
                reason: "Must be at least 1".into(),
            });
        }
        self.bounds.validate()?;
        self.sensitivity.validate()
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Simulated samples plus the shape of their distribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityOutput {
    pub samples: Vec<SimulationSample>,
    pub distribution: SampleDistribution,
    /// Share of shocked cycles that end up longer than today's baseline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability_above_baseline: Option<f64>,
}

/// Full output of a cash conversion cycle analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CccAnalysisOutput {
    pub ratios: Vec<DerivedRatios>,
    pub rejected_rows: Vec<RecordFailure>,
    pub baseline: BaselineSummary,
    pub cycle_breakdown: CycleBreakdown,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<CccTrend>,
    pub correlation: CorrelationMatrix,
    pub optimization: OptimizationResult,
    pub impact: FinancialImpact,
    pub carrying_savings: CarryingSavings,
    pub sensitivity: SensitivityOutput,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run the whole analysis: ratios and baseline from the table, the
/// policy-bounded optimum, its cash impact and a demand-shock sensitivity pass.
///
/// Unusable rows are skipped and reported. Configuration errors, an empty
/// dataset and infeasible bounds abort the run.
pub fn run_analysis(
    table: &FinancialTable,
    config: &AnalysisConfig,
) -> CccResult<ComputationOutput<CccAnalysisOutput>> {
    let start = Instant::now();
    config.validate()?;
    tracing::debug!(rows = table.rows.len(), "starting cash conversion cycle analysis");

    let (report, mut warnings) = build_ratio_report(table)?;
    let correlation = correlation_matrix(&report.ratios);

    let optimization = optimize(&config.bounds)?;
    let impact = compute_financial_impact(
        &report.baseline,
        &optimization,
        config.annual_interest_rate,
    )?;
    if impact.efficiency_gain < Decimal::ZERO {
        warnings.push(format!(
            "Optimised CCC ({} days) is longer than the baseline ({} days); \
             the policy bounds are tighter than current performance.",
            optimization.ccc,
            report.baseline.mean_ccc.round_dp(2)
        ));
    }
    let carrying_savings =
        compute_carrying_savings(&report.baseline, &optimization, config.holding_cost_rate)?;

    let mut sensitivity = simulate(&optimization, &config.sensitivity, config.histogram_bins)?;
    sensitivity.probability_above_baseline = report
        .baseline
        .mean_ccc
        .to_f64()
        .map(|baseline| probability_above(&sensitivity.samples, baseline));

    tracing::info!(
        baseline_ccc = %report.baseline.mean_ccc.round_dp(2),
        optimal_ccc = %optimization.ccc,
        cash_released = %impact.cash_released.round_dp(2),
        "analysis complete"
    );

    let output = CccAnalysisOutput {
        ratios: report.ratios,
        rejected_rows: report.rejected_rows,
        baseline: report.baseline,
        cycle_breakdown: report.cycle_breakdown,
        trend: report.trend,
        correlation,
        optimization,
        impact,
        carrying_savings,
        sensitivity,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Cash Conversion Cycle Optimisation (LP) with Monte Carlo demand-shock sensitivity",
        config,
        warnings,
        elapsed,
        Precision::Mixed,
        output,
    ))
}

/// Solve the policy program and stress its optimum, without any input data.
pub fn run_simulation(
    config: &AnalysisConfig,
) -> CccResult<ComputationOutput<SimulationRunOutput>> {
    let start = Instant::now();
    config.validate()?;

    let optimization = optimize(&config.bounds)?;
    let sensitivity = simulate(&optimization, &config.sensitivity, config.histogram_bins)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monte Carlo demand-shock sensitivity of the optimised cycle",
        &serde_json::json!({
            "bounds": config.bounds,
            "sensitivity": config.sensitivity,
            "histogram_bins": config.histogram_bins,
        }),
        Vec::new(),
        elapsed,
        Precision::Mixed,
        SimulationRunOutput {
            optimization,
            sensitivity,
        },
    ))
}

/// Output of a data-free simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRunOutput {
    pub optimization: OptimizationResult,
    pub sensitivity: SensitivityOutput,
}

fn simulate(
    optimization: &OptimizationResult,
    config: &SensitivityConfig,
    histogram_bins: usize,
) -> CccResult<SensitivityOutput> {
    let samples = run_sensitivity(optimization, config)?;
    let distribution = summarize_samples(&samples, histogram_bins)?;
    Ok(SensitivityOutput {
        samples,
        distribution,
        probability_above_baseline: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::table::REQUIRED_COLUMNS;
    use crate::optimizer::bounds::{DecisionVariable, PolicyConstraint};

    fn table() -> FinancialTable {
        let mut t = FinancialTable::new(REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect());
        t.push_row(vec![Some(dec!(1000)), Some(dec!(600)), Some(dec!(100)), Some(dec!(90)), Some(dec!(80))]);
        t.push_row(vec![Some(dec!(2000)), Some(dec!(1200)), Some(dec!(150)), Some(dec!(150)), Some(dec!(100))]);
        t
    }

    fn seeded() -> AnalysisConfig {
        AnalysisConfig {
            sensitivity: SensitivityConfig {
                seed: Some(7),
                ..SensitivityConfig::default()
            },
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn test_config_defaults_from_empty_json() {
        let cfg: AnalysisConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, AnalysisConfig::default());
        assert_eq!(cfg.annual_interest_rate, dec!(0.10));
        assert_eq!(cfg.sensitivity.sample_count, 1_000);
    }

    #[test]
    fn test_run_produces_every_section() {
        let out = run_analysis(&table(), &seeded()).unwrap();
        let r = &out.result;
        assert_eq!(r.ratios.len(), 2);
        assert_eq!(r.optimization.ccc, dec!(15));
        assert_eq!(r.sensitivity.samples.len(), 1_000);
        assert_eq!(r.sensitivity.distribution.sample_count, 1_000);
        assert!(r.sensitivity.probability_above_baseline.is_some());
        assert!(r.trend.is_some());
        assert!(out.warnings.is_empty());
        assert_eq!(out.metadata.precision, "rust_decimal_128bit+ieee754_f64");
    }

    #[test]
    fn test_invalid_config_checked_before_data() {
        let cfg = AnalysisConfig {
            annual_interest_rate: dec!(-0.05),
            ..AnalysisConfig::default()
        };
        // Empty table would be InvalidInput if it were looked at
        let empty = FinancialTable::default();
        assert!(matches!(
            run_analysis(&empty, &cfg),
            Err(CccError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_infeasible_bounds_abort() {
        let mut cfg = seeded();
        cfg.bounds
            .constraints
            .push(PolicyConstraint::at_least(DecisionVariable::Dso, dec!(150)));
        assert!(matches!(
            run_analysis(&table(), &cfg),
            Err(CccError::Infeasible { .. })
        ));
    }

    #[test]
    fn test_negative_gain_warns() {
        let mut cfg = seeded();
        cfg.bounds.constraints = vec![
            PolicyConstraint::at_least(DecisionVariable::Dso, dec!(90)),
            PolicyConstraint::at_least(DecisionVariable::Dio, dec!(90)),
            PolicyConstraint::at_most(DecisionVariable::Dpo, dec!(20)),
        ];
        let out = run_analysis(&table(), &cfg).unwrap();
        assert!(out.result.impact.efficiency_gain < Decimal::ZERO);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_simulation_run_without_data() {
        let out = run_simulation(&seeded()).unwrap();
        assert_eq!(out.result.sensitivity.samples.len(), 1_000);
        assert!(out.result.sensitivity.probability_above_baseline.is_none());
    }
}
