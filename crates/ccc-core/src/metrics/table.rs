use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CccError;
use crate::metrics::ratios::{FailureReason, FinancialRecord, RecordFailure};
use crate::types::Money;
use crate::CccResult;

pub const SALES: &str = "Sales";
pub const COGS: &str = "COGS";
pub const ACCOUNTS_RECEIVABLE: &str = "Accounts_Receivable";
pub const INVENTORY_VALUE: &str = "Inventory_Value";
pub const ACCOUNTS_PAYABLE: &str = "Accounts_Payable";

/// Columns every input table must carry, in record field order.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    SALES,
    COGS,
    ACCOUNTS_RECEIVABLE,
    INVENTORY_VALUE,
    ACCOUNTS_PAYABLE,
];

/// A numeric table already parsed by the caller.
///
/// `None` marks a cell that was empty or could not be read as a number.
/// Columns beyond the required five are carried but ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinancialTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<Money>>>,
}

/// Records that loaded cleanly plus the rows that were rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordBatch {
    pub records: Vec<FinancialRecord>,
    pub failures: Vec<RecordFailure>,
}

impl FinancialTable {
    pub fn new(columns: Vec<String>) -> Self {
        FinancialTable {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Option<Money>>) {
        self.rows.push(row);
    }

    /// Position of a column, matched exactly after trimming whitespace.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.trim() == name)
    }
}

/// Turn a table into financial records.
///
/// A missing required column aborts with `InvalidInput`. Rows with an
/// empty or negative required cell are rejected and reported.
pub fn load_records(table: &FinancialTable) -> CccResult<RecordBatch> {
    let mut indices = [0usize; 5];
    for (slot, name) in indices.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = table
            .column_index(name)
            .ok_or_else(|| CccError::InvalidInput {
                field: name.into(),
                reason: format!(
                    "Required column is missing (found: {})",
                    table.columns.join(", ")
                ),
            })?;
    }

    let mut batch = RecordBatch::default();
    'rows: for (row, cells) in table.rows.iter().enumerate() {
        let mut values = [Decimal::ZERO; 5];
        for ((value, &idx), name) in values.iter_mut().zip(&indices).zip(REQUIRED_COLUMNS) {
            match cells.get(idx).copied().flatten() {
                None => {
                    batch.failures.push(RecordFailure {
                        row,
                        reason: FailureReason::MissingValue {
                            column: name.into(),
                        },
                    });
                    continue 'rows;
                }
                Some(v) if v < Decimal::ZERO => {
                    batch.failures.push(RecordFailure {
                        row,
                        reason: FailureReason::NegativeValue {
                            column: name.into(),
                            value: v,
                        },
                    });
                    continue 'rows;
                }
                Some(v) => *value = v,
            }
        }

        let [sales, cogs, accounts_receivable, inventory_value, accounts_payable] = values;
        batch.records.push(FinancialRecord {
            row,
            sales,
            cogs,
            accounts_receivable,
            inventory_value,
            accounts_payable,
        });
    }

    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn columns() -> Vec<String> {
        REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_load_full_rows() {
        let mut table = FinancialTable::new(columns());
        table.push_row(vec![
            Some(dec!(1000)),
            Some(dec!(600)),
            Some(dec!(100)),
            Some(dec!(90)),
            Some(dec!(80)),
        ]);
        let batch = load_records(&table).unwrap();
        assert_eq!(batch.records.len(), 1);
        assert!(batch.failures.is_empty());
        let r = &batch.records[0];
        assert_eq!(r.sales, dec!(1000));
        assert_eq!(r.accounts_payable, dec!(80));
    }

    #[test]
    fn test_columns_matched_by_name_not_position() {
        let mut table = FinancialTable::new(vec![
            "Period".into(),
            " Accounts_Payable ".into(),
            "Inventory_Value".into(),
            "Accounts_Receivable".into(),
            "COGS".into(),
            "Sales".into(),
        ]);
        table.push_row(vec![
            Some(dec!(202401)),
            Some(dec!(80)),
            Some(dec!(90)),
            Some(dec!(100)),
            Some(dec!(600)),
            Some(dec!(1000)),
        ]);
        let batch = load_records(&table).unwrap();
        let r = &batch.records[0];
        assert_eq!(r.sales, dec!(1000));
        assert_eq!(r.cogs, dec!(600));
        assert_eq!(r.accounts_receivable, dec!(100));
        assert_eq!(r.inventory_value, dec!(90));
        assert_eq!(r.accounts_payable, dec!(80));
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let mut cols = columns();
        cols.retain(|c| c != COGS);
        let table = FinancialTable::new(cols);
        match load_records(&table) {
            Err(CccError::InvalidInput { field, .. }) => assert_eq!(field, COGS),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_cell_rejects_row() {
        let mut table = FinancialTable::new(columns());
        table.push_row(vec![Some(dec!(1000)), None, Some(dec!(1)), Some(dec!(1)), Some(dec!(1))]);
        // Short row: trailing cells absent
        table.push_row(vec![Some(dec!(1000)), Some(dec!(600))]);
        let batch = load_records(&table).unwrap();
        assert!(batch.records.is_empty());
        assert_eq!(
            batch.failures[0].reason,
            FailureReason::MissingValue {
                column: COGS.into()
            }
        );
        assert_eq!(batch.failures[1].row, 1);
        assert_eq!(
            batch.failures[1].reason,
            FailureReason::MissingValue {
                column: ACCOUNTS_RECEIVABLE.into()
            }
        );
    }

    #[test]
    fn test_negative_cell_rejects_row() {
        let mut table = FinancialTable::new(columns());
        table.push_row(vec![
            Some(dec!(1000)),
            Some(dec!(600)),
            Some(dec!(-5)),
            Some(dec!(90)),
            Some(dec!(80)),
        ]);
        let batch = load_records(&table).unwrap();
        assert!(batch.records.is_empty());
        assert_eq!(
            batch.failures[0].reason,
            FailureReason::NegativeValue {
                column: ACCOUNTS_RECEIVABLE.into(),
                value: dec!(-5),
            }
        );
    }

    #[test]
    fn test_zero_sales_passes_loading() {
        let mut table = FinancialTable::new(columns());
        table.push_row(vec![
            Some(Decimal::ZERO),
            Some(dec!(600)),
            Some(dec!(0)),
            Some(dec!(90)),
            Some(dec!(80)),
        ]);
        let batch = load_records(&table).unwrap();
        assert_eq!(batch.records.len(), 1);
    }
}
