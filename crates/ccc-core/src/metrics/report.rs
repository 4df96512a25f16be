use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::metrics::baseline::{summarize, BaselineSummary, CycleBreakdown};
use crate::metrics::ratios::{derive_ratios, DerivedRatios, RecordFailure};
use crate::metrics::table::{load_records, FinancialTable};
use crate::metrics::trend::{compute_trend, CccTrend};
use crate::types::{with_metadata, ComputationOutput, Precision};
use crate::CccResult;

/// Per-period ratios and their baseline, without any optimisation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatioReport {
    pub ratios: Vec<DerivedRatios>,
    pub rejected_rows: Vec<RecordFailure>,
    pub baseline: BaselineSummary,
    pub cycle_breakdown: CycleBreakdown,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<CccTrend>,
}

/// Load a table, derive per-period ratios and average them.
///
/// Rows that cannot be used are reported in `rejected_rows` and as warnings.
/// Fails with `EmptyDataset` when no row survives.
pub fn analyze_ratios(table: &FinancialTable) -> CccResult<ComputationOutput<RatioReport>> {
    let start = Instant::now();
    let (report, warnings) = build_ratio_report(table)?;
    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Cash Conversion Cycle Ratios (DSO/DIO/DPO/CCC)",
        &serde_json::json!({
            "columns": table.columns,
            "rows": table.rows.len(),
            "days_per_year": crate::types::DAYS_PER_YEAR,
            "invalid_row_policy": "skip and report",
        }),
        warnings,
        elapsed,
        Precision::Decimal,
        report,
    ))
}

pub(crate) fn build_ratio_report(table: &FinancialTable) -> CccResult<(RatioReport, Vec<String>)> {
    let loaded = load_records(table)?;
    let batch = derive_ratios(&loaded.records);

    let mut rejected_rows = loaded.failures;
    rejected_rows.extend(batch.failures);
    rejected_rows.sort_by_key(|f| f.row);

    let warnings: Vec<String> = rejected_rows
        .iter()
        .map(|f| {
            tracing::warn!(row = f.row, "rejected input row: {f}");
            f.to_string()
        })
        .collect();

    let baseline = summarize(&batch.ratios)?;
    tracing::debug!(
        valid = baseline.record_count,
        rejected = rejected_rows.len(),
        mean_ccc = %baseline.mean_ccc,
        "baseline summarised"
    );

    let report = RatioReport {
        cycle_breakdown: baseline.breakdown(),
        trend: compute_trend(&batch.ratios),
        ratios: batch.ratios,
        rejected_rows,
        baseline,
    };
    Ok((report, warnings))
}
