use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CccError;
use crate::metrics::ratios::DerivedRatios;
use crate::types::{Days, Money};
use crate::CccResult;

/// Mean ratios across every valid record. This is the "current state" the
/// optimiser is measured against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineSummary {
    /// Number of valid records averaged
    pub record_count: usize,
    pub mean_dso: Days,
    pub mean_dio: Days,
    pub mean_dpo: Days,
    pub mean_ccc: Days,
    pub mean_sales: Money,
    pub mean_cogs: Money,
}

/// How the average cycle is built up: inventory days plus receivable days,
/// less payable days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleBreakdown {
    pub inventory_days: Days,
    pub receivable_days: Days,
    /// Always reported as a negative contribution
    pub payable_days: Days,
    pub total: Days,
}

impl BaselineSummary {
    /// Mean daily sales, the cash value of one day of receivables.
    pub fn mean_daily_sales(&self) -> Money {
        self.mean_sales / Decimal::from(crate::types::DAYS_PER_YEAR)
    }

    /// Mean daily cost of goods sold, the cash value of one day of inventory.
    pub fn mean_daily_cogs(&self) -> Money {
        self.mean_cogs / Decimal::from(crate::types::DAYS_PER_YEAR)
    }

    pub fn breakdown(&self) -> CycleBreakdown {
        CycleBreakdown {
            inventory_days: self.mean_dio,
            receivable_days: self.mean_dso,
            payable_days: -self.mean_dpo,
            total: self.mean_ccc,
        }
    }
}

/// Average DSO, DIO, DPO, CCC, sales and COGS over valid records.
pub fn summarize(ratios: &[DerivedRatios]) -> CccResult<BaselineSummary> {
    if ratios.is_empty() {
        return Err(CccError::EmptyDataset(
            "No valid records remain to summarise".into(),
        ));
    }

    let n = Decimal::from(ratios.len() as u64);
    let mean = |field: &str, f: fn(&DerivedRatios) -> Decimal| -> CccResult<Decimal> {
        ratios
            .iter()
            .map(f)
            .try_fold(Decimal::ZERO, |acc, x| acc.checked_add(x))
            .map(|total| total / n)
            .ok_or_else(|| CccError::InvalidInput {
                field: field.into(),
                reason: "Sum across records overflows the decimal range".into(),
            })
    };

    Ok(BaselineSummary {
        record_count: ratios.len(),
        mean_dso: mean("dso", |r| r.dso)?,
        mean_dio: mean("dio", |r| r.dio)?,
        mean_dpo: mean("dpo", |r| r.dpo)?,
        mean_ccc: mean("ccc", |r| r.ccc)?,
        mean_sales: mean("sales", |r| r.record.sales)?,
        mean_cogs: mean("cogs", |r| r.record.cogs)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::ratios::{compute_ratios, FinancialRecord};
    use rust_decimal_macros::dec;

    fn ratios(sales: Decimal, cogs: Decimal, ar: Decimal) -> DerivedRatios {
        compute_ratios(&FinancialRecord {
            row: 0,
            sales,
            cogs,
            accounts_receivable: ar,
            inventory_value: dec!(60),
            accounts_payable: dec!(30),
        })
        .unwrap()
    }

    #[test]
    fn test_empty_is_error() {
        assert!(matches!(summarize(&[]), Err(CccError::EmptyDataset(_))));
    }

    #[test]
    fn test_means() {
        let rs = vec![
            ratios(dec!(100), dec!(100), dec!(10)),
            ratios(dec!(100), dec!(100), dec!(30)),
        ];
        let s = summarize(&rs).unwrap();
        assert_eq!(s.record_count, 2);
        // DSO 36.5 and 109.5 days
        assert_eq!(s.mean_dso, dec!(73));
        assert_eq!(s.mean_dio, dec!(219));
        assert_eq!(s.mean_dpo, dec!(109.5));
        // CCC 146 and 219 days
        assert_eq!(s.mean_ccc, dec!(182.5));
        assert_eq!(s.mean_sales, dec!(100));
        assert_eq!(s.mean_cogs, dec!(100));
        assert_eq!(s.mean_daily_sales(), dec!(100) / dec!(365));
    }

    #[test]
    fn test_overflowing_sum_is_invalid_input() {
        let mut big = ratios(dec!(100), dec!(100), dec!(10));
        big.record.sales = Decimal::MAX;
        let rs = vec![big.clone(), big];
        match summarize(&rs) {
            Err(CccError::InvalidInput { field, .. }) => assert_eq!(field, "sales"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_breakdown_sums_to_total() {
        let s = summarize(&[ratios(dec!(1000), dec!(600), dec!(100))]).unwrap();
        let b = s.breakdown();
        assert!(b.payable_days < Decimal::ZERO);
        assert_eq!(b.inventory_days + b.receivable_days + b.payable_days, b.total);
    }
}
