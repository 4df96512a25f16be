use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::metrics::ratios::DerivedRatios;

/// Series included in the driver correlation matrix.
pub const CORRELATION_FIELDS: [&str; 5] = ["Sales", "COGS", "Inventory_Value", "CCC", "DSO"];

/// Pearson correlations between sales, cost and cycle series.
///
/// `values[i][j]` is the correlation between `labels[i]` and `labels[j]`.
/// A cell is `None` when undefined: fewer than two records, or a series
/// with zero variance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.labels.iter().position(|l| l == a)?;
        let j = self.labels.iter().position(|l| l == b)?;
        self.values[i][j]
    }
}

pub fn correlation_matrix(ratios: &[DerivedRatios]) -> CorrelationMatrix {
    let mut columns: Vec<Vec<f64>> = vec![Vec::with_capacity(ratios.len()); CORRELATION_FIELDS.len()];
    for r in ratios {
        let row = [
            r.record.sales.to_f64(),
            r.record.cogs.to_f64(),
            r.record.inventory_value.to_f64(),
            r.ccc.to_f64(),
            r.dso.to_f64(),
        ];
        if row.iter().all(Option::is_some) {
            for (col, v) in columns.iter_mut().zip(row.iter().flatten()) {
                col.push(*v);
            }
        }
    }

    let n = CORRELATION_FIELDS.len();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        for j in i..n {
            let rho = if i == j {
                variance(&columns[i]).filter(|v| *v > f64::EPSILON).map(|_| 1.0)
            } else {
                pearson(&columns[i], &columns[j])
            };
            values[i][j] = rho;
            values[j][i] = rho;
        }
    }

    CorrelationMatrix {
        labels: CORRELATION_FIELDS.iter().map(|s| s.to_string()).collect(),
        values,
    }
}

fn mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

fn variance(xs: &[f64]) -> Option<f64> {
    if xs.len() < 2 {
        return None;
    }
    let m = mean(xs);
    Some(xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (xs.len() - 1) as f64)
}

fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() < 2 || xs.len() != ys.len() {
        return None;
    }
    let mx = mean(xs);
    let my = mean(ys);
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        cov += (x - mx) * (y - my);
        vx += (x - mx).powi(2);
        vy += (y - my).powi(2);
    }
    if vx <= f64::EPSILON || vy <= f64::EPSILON {
        return None;
    }
    Some((cov / (vx.sqrt() * vy.sqrt())).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::ratios::{compute_ratios, FinancialRecord};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn ratios(sales: Decimal, cogs: Decimal, inventory: Decimal) -> DerivedRatios {
        compute_ratios(&FinancialRecord {
            row: 0,
            sales,
            cogs,
            accounts_receivable: dec!(100),
            inventory_value: inventory,
            accounts_payable: dec!(50),
        })
        .unwrap()
    }

    #[test]
    fn test_perfectly_linked_series() {
        // COGS is always 60% of sales
        let rs = vec![
            ratios(dec!(1000), dec!(600), dec!(90)),
            ratios(dec!(2000), dec!(1200), dec!(120)),
            ratios(dec!(3000), dec!(1800), dec!(100)),
        ];
        let m = correlation_matrix(&rs);
        let rho = m.get("Sales", "COGS").unwrap();
        assert!((rho - 1.0).abs() < 1e-12, "rho={rho}");
        assert_eq!(m.get("Sales", "Sales"), Some(1.0));
        // Fixed AR means DSO falls as sales rise
        assert!(m.get("Sales", "DSO").unwrap() < 0.0);
    }

    #[test]
    fn test_matrix_is_symmetric() {
        let rs = vec![
            ratios(dec!(1000), dec!(600), dec!(90)),
            ratios(dec!(1500), dec!(700), dec!(80)),
            ratios(dec!(1200), dec!(650), dec!(130)),
        ];
        let m = correlation_matrix(&rs);
        for i in 0..m.labels.len() {
            for j in 0..m.labels.len() {
                assert_eq!(m.values[i][j], m.values[j][i]);
            }
        }
    }

    #[test]
    fn test_undefined_cells_are_none() {
        // Single record: nothing is defined
        let m = correlation_matrix(&[ratios(dec!(1000), dec!(600), dec!(90))]);
        assert!(m.values.iter().flatten().all(Option::is_none));

        // Constant sales: every sales cell undefined
        let rs = vec![
            ratios(dec!(1000), dec!(600), dec!(90)),
            ratios(dec!(1000), dec!(700), dec!(80)),
        ];
        let m = correlation_matrix(&rs);
        assert_eq!(m.get("Sales", "COGS"), None);
        assert_eq!(m.get("Sales", "Sales"), None);
        assert!(m.get("COGS", "Inventory_Value").is_some());
    }
}
