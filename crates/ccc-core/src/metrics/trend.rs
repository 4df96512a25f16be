use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::metrics::ratios::DerivedRatios;
use crate::types::Days;

/// Direction of a day-count metric between the first and last period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    Improving,
    Deteriorating,
    Stable,
}

/// First-to-last period movement of each cycle component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CccTrend {
    pub first_row: usize,
    pub last_row: usize,
    pub dso_change: Days,
    pub dio_change: Days,
    pub dpo_change: Days,
    pub ccc_change: Days,
    pub dso_trend: TrendDirection,
    pub dio_trend: TrendDirection,
    pub dpo_trend: TrendDirection,
    pub ccc_trend: TrendDirection,
}

/// Movements within this many days count as stable.
pub fn trend_threshold() -> Days {
    dec!(5)
}

/// Compare the first and last valid periods. Returns `None` for an empty
/// series or when a change overflows; a single period is stable with zero
/// change.
pub fn compute_trend(ratios: &[DerivedRatios]) -> Option<CccTrend> {
    let first = ratios.first()?;
    let last = ratios.last()?;
    let threshold = trend_threshold();

    let dso_change = last.dso.checked_sub(first.dso)?;
    let dio_change = last.dio.checked_sub(first.dio)?;
    let dpo_change = last.dpo.checked_sub(first.dpo)?;
    let ccc_change = last.ccc.checked_sub(first.ccc)?;

    Some(CccTrend {
        first_row: first.record.row,
        last_row: last.record.row,
        dso_change,
        dio_change,
        dpo_change,
        ccc_change,
        dso_trend: lower_is_better(dso_change, threshold),
        dio_trend: lower_is_better(dio_change, threshold),
        // Paying suppliers later frees cash
        dpo_trend: lower_is_better(-dpo_change, threshold),
        ccc_trend: lower_is_better(ccc_change, threshold),
    })
}

fn lower_is_better(change: Decimal, threshold: Decimal) -> TrendDirection {
    if change < -threshold {
        TrendDirection::Improving
    } else if change > threshold {
        TrendDirection::Deteriorating
    } else {
        TrendDirection::Stable
    }
}
