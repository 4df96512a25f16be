use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CccError;
use crate::types::{Days, Money, DAYS_PER_YEAR};
use crate::CccResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One reporting period of raw financial data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialRecord {
    /// Zero-based position in the source table
    pub row: usize,
    pub sales: Money,
    /// Cost of goods sold
    pub cogs: Money,
    pub accounts_receivable: Money,
    pub inventory_value: Money,
    pub accounts_payable: Money,
}

/// The three day-count ratios that make up the cash conversion cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RatioKind {
    Dso,
    Dio,
    Dpo,
}

impl fmt::Display for RatioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RatioKind::Dso => "DSO",
            RatioKind::Dio => "DIO",
            RatioKind::Dpo => "DPO",
        };
        f.write_str(label)
    }
}

/// Ratios derived from a single record. Only built when every ratio is defined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedRatios {
    #[serde(flatten)]
    pub record: FinancialRecord,
    /// Days Sales Outstanding = AR / Sales * 365
    pub dso: Days,
    /// Days Inventory Outstanding = Inventory / COGS * 365
    pub dio: Days,
    /// Days Payable Outstanding = AP / COGS * 365
    pub dpo: Days,
    /// Cash Conversion Cycle = DIO + DSO - DPO
    pub ccc: Days,
}

/// Why a row was left out of the aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// A required cell was empty or not numeric.
    MissingValue { column: String },
    /// A required cell held a negative amount.
    NegativeValue { column: String, value: Money },
    /// Sales or COGS was zero or negative, leaving these ratios undefined.
    DivisionByZero { undefined: Vec<RatioKind> },
    /// A ratio exceeded the range of a 96-bit decimal.
    Overflow,
}

/// A rejected row and the reason it was rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordFailure {
    pub row: usize,
    pub reason: FailureReason,
}

impl fmt::Display for RecordFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            FailureReason::MissingValue { column } => {
                write!(f, "Row {}: missing value for '{}'", self.row, column)
            }
            FailureReason::NegativeValue { column, value } => {
                write!(f, "Row {}: negative value {} for '{}'", self.row, value, column)
            }
            FailureReason::DivisionByZero { undefined } => {
                let names: Vec<String> = undefined.iter().map(|k| k.to_string()).collect();
                write!(
                    f,
                    "Row {}: {} undefined (non-positive denominator)",
                    self.row,
                    names.join(", ")
                )
            }
            FailureReason::Overflow => {
                write!(f, "Row {}: ratios overflow the decimal range", self.row)
            }
        }
    }
}

/// Result of deriving ratios over a batch of records.
///
/// Records whose ratios are undefined are skipped and reported in `failures`;
/// they never abort the batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RatioBatch {
    pub ratios: Vec<DerivedRatios>,
    pub failures: Vec<RecordFailure>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// List the ratios a record cannot support. Sales <= 0 leaves DSO undefined;
/// COGS <= 0 leaves both DIO and DPO undefined.
pub fn undefined_ratios(record: &FinancialRecord) -> Vec<RatioKind> {
    let mut undefined = Vec::new();
    if record.sales <= Decimal::ZERO {
        undefined.push(RatioKind::Dso);
    }
    if record.cogs <= Decimal::ZERO {
        undefined.push(RatioKind::Dio);
        undefined.push(RatioKind::Dpo);
    }
    undefined
}

/// Compute DSO, DIO, DPO and CCC for a single record.
///
/// Fails with `DivisionByZero` for a non-positive denominator and with
/// `InvalidInput` when a ratio does not fit in a `Decimal`.
pub fn compute_ratios(record: &FinancialRecord) -> CccResult<DerivedRatios> {
    checked_ratios(record).map_err(|reason| match reason {
        FailureReason::DivisionByZero { undefined } => {
            let names: Vec<String> = undefined.iter().map(|k| k.to_string()).collect();
            CccError::DivisionByZero {
                context: format!(
                    "row {} (sales={}, cogs={}): {} undefined",
                    record.row,
                    record.sales,
                    record.cogs,
                    names.join(", ")
                ),
            }
        }
        _ => CccError::InvalidInput {
            field: format!("row {}", record.row),
            reason: "Ratios overflow the decimal range".into(),
        },
    })
}

/// Derive ratios for every record, collecting per-record failures instead of
/// aborting. Output order follows input order.
pub fn derive_ratios(records: &[FinancialRecord]) -> RatioBatch {
    let mut batch = RatioBatch::default();
    for record in records {
        match checked_ratios(record) {
            Ok(r) => batch.ratios.push(r),
            Err(reason) => batch.failures.push(RecordFailure {
                row: record.row,
                reason,
            }),
        }
    }
    batch
}

fn checked_ratios(record: &FinancialRecord) -> Result<DerivedRatios, FailureReason> {
    let undefined = undefined_ratios(record);
    if !undefined.is_empty() {
        return Err(FailureReason::DivisionByZero { undefined });
    }

    let days = Decimal::from(DAYS_PER_YEAR);
    let day_count = |amount: Money, per: Money| {
        amount
            .checked_div(per)
            .and_then(|r| r.checked_mul(days))
            .ok_or(FailureReason::Overflow)
    };
    let dso = day_count(record.accounts_receivable, record.sales)?;
    let dio = day_count(record.inventory_value, record.cogs)?;
    let dpo = day_count(record.accounts_payable, record.cogs)?;
    let ccc = dio
        .checked_add(dso)
        .and_then(|d| d.checked_sub(dpo))
        .ok_or(FailureReason::Overflow)?;

    Ok(DerivedRatios {
        record: record.clone(),
        dso,
        dio,
        dpo,
        ccc,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
