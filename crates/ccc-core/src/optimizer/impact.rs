use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CccError;
use crate::metrics::baseline::BaselineSummary;
use crate::optimizer::lp::OptimizationResult;
use crate::types::{Days, Money, Rate};
use crate::CccResult;

/// Cash effect of moving from the baseline cycle to the optimised one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialImpact {
    /// Baseline CCC minus optimised CCC. Negative when the policy bounds
    /// force a longer cycle than today's.
    pub efficiency_gain: Days,
    /// Days of receivables removed (baseline DSO - DSO_opt)
    pub dso_reduction: Days,
    /// Days of inventory removed (baseline DIO - DIO_opt)
    pub dio_reduction: Days,
    /// Days of payables added (DPO_opt - baseline DPO)
    pub dpo_extension: Days,
    pub mean_daily_sales: Money,
    /// efficiency_gain * mean daily sales
    pub cash_released: Money,
    pub annual_interest_rate: Rate,
    /// cash_released * annual_interest_rate
    pub interest_savings: Money,
}

/// Savings from carrying less inventory at the optimised DIO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarryingSavings {
    pub dio_reduction: Days,
    pub mean_daily_cogs: Money,
    /// dio_reduction * mean daily COGS
    pub inventory_released: Money,
    pub holding_cost_rate: Rate,
    /// inventory_released * holding_cost_rate
    pub annual_savings: Money,
}

fn overflow(field: &str) -> CccError {
    CccError::InvalidInput {
        field: field.into(),
        reason: "Result overflows the decimal range".into(),
    }
}

fn validate_rate(field: &str, rate: Rate) -> CccResult<()> {
    if rate < Decimal::ZERO {
        return Err(CccError::InvalidConfiguration {
            field: field.into(),
            reason: format!("Rate must be non-negative (got {rate})"),
        });
    }
    Ok(())
}

/// Translate the optimised cycle into cash released and the interest that
/// cash would otherwise cost over a year.
pub fn compute_financial_impact(
    baseline: &BaselineSummary,
    result: &OptimizationResult,
    annual_interest_rate: Rate,
) -> CccResult<FinancialImpact> {
    validate_rate("annual_interest_rate", annual_interest_rate)?;

    let efficiency_gain = baseline
        .mean_ccc
        .checked_sub(result.ccc)
        .ok_or_else(|| overflow("efficiency_gain"))?;
    let mean_daily_sales = baseline.mean_daily_sales();
    let cash_released = efficiency_gain
        .checked_mul(mean_daily_sales)
        .ok_or_else(|| overflow("cash_released"))?;
    let interest_savings = cash_released
        .checked_mul(annual_interest_rate)
        .ok_or_else(|| overflow("interest_savings"))?;

    Ok(FinancialImpact {
        efficiency_gain,
        dso_reduction: baseline
            .mean_dso
            .checked_sub(result.dso)
            .ok_or_else(|| overflow("dso_reduction"))?,
        dio_reduction: baseline
            .mean_dio
            .checked_sub(result.dio)
            .ok_or_else(|| overflow("dio_reduction"))?,
        dpo_extension: result
            .dpo
            .checked_sub(baseline.mean_dpo)
            .ok_or_else(|| overflow("dpo_extension"))?,
        mean_daily_sales,
        cash_released,
        annual_interest_rate,
        interest_savings,
    })
}

/// Value the inventory no longer held at the optimised DIO at the annual
/// holding cost rate.
pub fn compute_carrying_savings(
    baseline: &BaselineSummary,
    result: &OptimizationResult,
    holding_cost_rate: Rate,
) -> CccResult<CarryingSavings> {
    validate_rate("holding_cost_rate", holding_cost_rate)?;

    let dio_reduction = baseline
        .mean_dio
        .checked_sub(result.dio)
        .ok_or_else(|| overflow("dio_reduction"))?;
    let mean_daily_cogs = baseline.mean_daily_cogs();
    let inventory_released = dio_reduction
        .checked_mul(mean_daily_cogs)
        .ok_or_else(|| overflow("inventory_released"))?;
    let annual_savings = inventory_released
        .checked_mul(holding_cost_rate)
        .ok_or_else(|| overflow("annual_savings"))?;

    Ok(CarryingSavings {
        dio_reduction,
        mean_daily_cogs,
        inventory_released,
        holding_cost_rate,
        annual_savings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::lp::{OptimizationResult, SolverStatus};
    use rust_decimal_macros::dec;

    fn baseline(ccc: Decimal, sales: Decimal) -> BaselineSummary {
        BaselineSummary {
            record_count: 2,
            mean_dso: dec!(31.9375),
            mean_dio: dec!(50.1875),
            mean_dpo: dec!(39.5417),
            mean_ccc: ccc,
            mean_sales: sales,
            mean_cogs: dec!(730),
        }
    }

    fn optimum() -> OptimizationResult {
        OptimizationResult {
            dso: dec!(30),
            dio: dec!(45),
            dpo: dec!(60),
            ccc: dec!(15),
            status: SolverStatus::Optimal,
            bindings: vec![],
        }
    }

    #[test]
    fn test_gain_and_cash_released() {
        let impact =
            compute_financial_impact(&baseline(dec!(42.58), dec!(1500)), &optimum(), dec!(0.10))
                .unwrap();
        assert_eq!(impact.efficiency_gain, dec!(27.58));
        let expected_cash = dec!(27.58) * (dec!(1500) / dec!(365));
        assert_eq!(impact.cash_released, expected_cash);
        // About 113.3 of cash freed
        assert!((impact.cash_released - dec!(113.29)).abs() < dec!(0.1));
        assert_eq!(impact.interest_savings, expected_cash * dec!(0.10));
    }

    #[test]
    fn test_negative_gain_is_reported_not_clamped() {
        let impact =
            compute_financial_impact(&baseline(dec!(10), dec!(365)), &optimum(), dec!(0.10))
                .unwrap();
        assert_eq!(impact.efficiency_gain, dec!(-5));
        assert_eq!(impact.cash_released, dec!(-5));
        assert!(impact.interest_savings < Decimal::ZERO);
    }

    #[test]
    fn test_component_moves() {
        let impact =
            compute_financial_impact(&baseline(dec!(42.58), dec!(1500)), &optimum(), dec!(0.10))
                .unwrap();
        assert_eq!(impact.dso_reduction, dec!(1.9375));
        assert_eq!(impact.dio_reduction, dec!(5.1875));
        assert_eq!(impact.dpo_extension, dec!(20.4583));
    }

    #[test]
    fn test_negative_rate_rejected() {
        assert!(matches!(
            compute_financial_impact(&baseline(dec!(42), dec!(1500)), &optimum(), dec!(-0.01)),
            Err(CccError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_overflowing_cash_is_invalid_input() {
        let b = baseline(Decimal::MAX / dec!(2), Decimal::MAX);
        match compute_financial_impact(&b, &optimum(), dec!(0.10)) {
            Err(CccError::InvalidInput { field, .. }) => assert_eq!(field, "cash_released"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_carrying_savings() {
        // Mean COGS 730 => 2 per day; DIO falls 5.1875 days
        let s = compute_carrying_savings(&baseline(dec!(42), dec!(1500)), &optimum(), dec!(0.15))
            .unwrap();
        assert_eq!(s.mean_daily_cogs, dec!(2));
        assert_eq!(s.inventory_released, dec!(10.375));
        assert_eq!(s.annual_savings, dec!(1.55625));
    }
}
