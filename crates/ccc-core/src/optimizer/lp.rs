use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CccError;
use crate::optimizer::bounds::{DecisionVariable, OptimizationBounds, Relation};
use crate::types::{with_metadata, ComputationOutput, Days, Precision};
use crate::CccResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverStatus {
    /// Infeasible programs are reported as `CccError::Infeasible` instead.
    Optimal,
}

/// Where an optimal value came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BindingSource {
    LowerBound,
    UpperBound,
    /// A policy constraint, rendered e.g. `DSO_opt >= 30`
    Constraint { constraint: String },
}

/// The constraint each variable ends up resting on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub variable: DecisionVariable,
    pub value: Days,
    pub source: BindingSource,
}

/// Feasible interval of one variable after intersecting its box with every
/// policy constraint on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TightenedInterval {
    pub variable: DecisionVariable,
    pub lower: Days,
    pub lower_source: BindingSource,
    pub upper: Days,
    pub upper_source: BindingSource,
}

impl TightenedInterval {
    pub fn is_empty(&self) -> bool {
        self.lower > self.upper
    }
}

/// Optimal day counts that minimise the cash conversion cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub dso: Days,
    pub dio: Days,
    pub dpo: Days,
    /// Objective value: DSO + DIO - DPO
    pub ccc: Days,
    pub status: SolverStatus,
    pub bindings: Vec<Binding>,
}

impl OptimizationResult {
    pub fn value_of(&self, variable: DecisionVariable) -> Days {
        match variable {
            DecisionVariable::Dso => self.dso,
            DecisionVariable::Dio => self.dio,
            DecisionVariable::Dpo => self.dpo,
        }
    }
}

// ---------------------------------------------------------------------------
// Solver
// ---------------------------------------------------------------------------

/// Intersect a variable's box with the policy constraints that name it.
pub fn tighten(bounds: &OptimizationBounds, variable: DecisionVariable) -> TightenedInterval {
    let b = bounds.bounds_for(variable);
    let mut interval = TightenedInterval {
        variable,
        lower: b.lower,
        lower_source: BindingSource::LowerBound,
        upper: b.upper,
        upper_source: BindingSource::UpperBound,
    };

    for c in bounds.constraints_on(variable) {
        match c.relation {
            Relation::AtLeast if c.value > interval.lower => {
                interval.lower = c.value;
                interval.lower_source = BindingSource::Constraint {
                    constraint: c.to_string(),
                };
            }
            Relation::AtMost if c.value < interval.upper => {
                interval.upper = c.value;
                interval.upper_source = BindingSource::Constraint {
                    constraint: c.to_string(),
                };
            }
            _ => {}
        }
    }

    interval
}

/// Minimise `DSO + DIO - DPO` over the policy bounds.
///
/// Variables never interact in the objective or the constraints, so the
/// program separates per variable: a positive coefficient settles on the
/// tightened lower bound and a negative one on the tightened upper bound.
/// The answer is the same vertex a simplex solver would reach.
pub fn optimize(bounds: &OptimizationBounds) -> CccResult<OptimizationResult> {
    bounds.validate()?;

    let mut values = [Decimal::ZERO; 3];
    let mut bindings = Vec::with_capacity(3);

    for (slot, variable) in values.iter_mut().zip(DecisionVariable::ALL) {
        let interval = tighten(bounds, variable);
        if interval.is_empty() {
            tracing::debug!(%variable, lower = %interval.lower, upper = %interval.upper, "infeasible");
            return Err(CccError::Infeasible {
                variable: variable.to_string(),
                lower: interval.lower,
                upper: interval.upper,
            });
        }

        let (value, source) = if variable.objective_coefficient() > Decimal::ZERO {
            (interval.lower, interval.lower_source)
        } else {
            (interval.upper, interval.upper_source)
        };
        *slot = value;
        bindings.push(Binding {
            variable,
            value,
            source,
        });
    }

    let [dso, dio, dpo] = values;
    let ccc = DecisionVariable::ALL
        .iter()
        .zip(values)
        .try_fold(Decimal::ZERO, |acc, (v, x)| {
            v.objective_coefficient()
                .checked_mul(x)
                .and_then(|term| acc.checked_add(term))
        })
        .ok_or_else(|| CccError::InvalidConfiguration {
            field: "bounds".into(),
            reason: "Objective overflows the decimal range".into(),
        })?;

    let result = OptimizationResult {
        dso,
        dio,
        dpo,
        ccc,
        status: SolverStatus::Optimal,
        bindings,
    };
    verify(bounds, &result)?;

    tracing::debug!(%dso, %dio, %dpo, %ccc, "optimal cycle found");
    Ok(result)
}

/// Check a solution against every bound and constraint.
pub fn verify(bounds: &OptimizationBounds, result: &OptimizationResult) -> CccResult<()> {
    for variable in DecisionVariable::ALL {
        let x = result.value_of(variable);
        if !bounds.bounds_for(variable).contains(x) {
            return Err(CccError::Solver(format!(
                "{variable} = {x} lies outside its bounds"
            )));
        }
    }
    if let Some(c) = bounds
        .constraints
        .iter()
        .find(|c| !c.is_satisfied_by(result.value_of(c.variable)))
    {
        return Err(CccError::Solver(format!(
            "Solution violates constraint {c}"
        )));
    }
    Ok(())
}

/// Solve the policy program and wrap it in the standard output envelope.
pub fn optimize_policy(
    bounds: &OptimizationBounds,
) -> CccResult<ComputationOutput<OptimizationResult>> {
    let start = Instant::now();
    let result = optimize(bounds)?;
    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Linear program: minimise DSO + DIO - DPO subject to policy bounds",
        bounds,
        Vec::new(),
        elapsed,
        Precision::Decimal,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
