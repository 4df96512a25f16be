use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CccError;
use crate::types::Days;
use crate::CccResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Decision variables of the cycle-minimisation program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionVariable {
    Dso,
    Dio,
    Dpo,
}

impl DecisionVariable {
    pub const ALL: [DecisionVariable; 3] = [
        DecisionVariable::Dso,
        DecisionVariable::Dio,
        DecisionVariable::Dpo,
    ];

    /// Coefficient in the objective `DSO + DIO - DPO`.
    pub fn objective_coefficient(self) -> Decimal {
        match self {
            DecisionVariable::Dso | DecisionVariable::Dio => Decimal::ONE,
            DecisionVariable::Dpo => Decimal::NEGATIVE_ONE,
        }
    }
}

impl fmt::Display for DecisionVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DecisionVariable::Dso => "DSO_opt",
            DecisionVariable::Dio => "DIO_opt",
            DecisionVariable::Dpo => "DPO_opt",
        };
        f.write_str(label)
    }
}

/// Closed interval a decision variable must stay within.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VariableBounds {
    pub lower: Days,
    pub upper: Days,
}

impl VariableBounds {
    pub fn new(lower: Days, upper: Days) -> Self {
        VariableBounds { lower, upper }
    }

    pub fn contains(&self, value: Days) -> bool {
        value >= self.lower && value <= self.upper
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    #[serde(rename = ">=")]
    AtLeast,
    #[serde(rename = "<=")]
    AtMost,
}

/// A one-sided policy constraint on a single variable, e.g. `DPO_opt <= 60`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolicyConstraint {
    pub variable: DecisionVariable,
    pub relation: Relation,
    pub value: Days,
}

impl PolicyConstraint {
    pub fn at_least(variable: DecisionVariable, value: Days) -> Self {
        PolicyConstraint {
            variable,
            relation: Relation::AtLeast,
            value,
        }
    }

    pub fn at_most(variable: DecisionVariable, value: Days) -> Self {
        PolicyConstraint {
            variable,
            relation: Relation::AtMost,
            value,
        }
    }

    pub fn is_satisfied_by(&self, x: Days) -> bool {
        match self.relation {
            Relation::AtLeast => x >= self.value,
            Relation::AtMost => x <= self.value,
        }
    }
}

impl fmt::Display for PolicyConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.relation {
            Relation::AtLeast => ">=",
            Relation::AtMost => "<=",
        };
        write!(f, "{} {} {}", self.variable, op, self.value)
    }
}

/// Business-policy limits for the optimised day counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationBounds {
    #[serde(default = "default_dso_bounds")]
    pub dso: VariableBounds,
    #[serde(default = "default_dio_bounds")]
    pub dio: VariableBounds,
    #[serde(default = "default_dpo_bounds")]
    pub dpo: VariableBounds,
    #[serde(default = "default_constraints")]
    pub constraints: Vec<PolicyConstraint>,
}

fn default_dso_bounds() -> VariableBounds {
    VariableBounds::new(dec!(20), dec!(100))
}

fn default_dio_bounds() -> VariableBounds {
    VariableBounds::new(dec!(30), dec!(100))
}

fn default_dpo_bounds() -> VariableBounds {
    VariableBounds::new(dec!(15), dec!(150))
}

fn default_constraints() -> Vec<PolicyConstraint> {
    vec![
        // Credit terms below 30 days are not offered
        PolicyConstraint::at_least(DecisionVariable::Dso, dec!(30)),
        // Safety stock floor
        PolicyConstraint::at_least(DecisionVariable::Dio, dec!(45)),
        // Supplier terms cap
        PolicyConstraint::at_most(DecisionVariable::Dpo, dec!(60)),
    ]
}

impl Default for OptimizationBounds {
    fn default() -> Self {
        OptimizationBounds {
            dso: default_dso_bounds(),
            dio: default_dio_bounds(),
            dpo: default_dpo_bounds(),
            constraints: default_constraints(),
        }
    }
}

impl OptimizationBounds {
    pub fn bounds_for(&self, variable: DecisionVariable) -> &VariableBounds {
        match variable {
            DecisionVariable::Dso => &self.dso,
            DecisionVariable::Dio => &self.dio,
            DecisionVariable::Dpo => &self.dpo,
        }
    }

    pub fn constraints_on(
        &self,
        variable: DecisionVariable,
    ) -> impl Iterator<Item = &PolicyConstraint> {
        self.constraints
            .iter()
            .filter(move |c| c.variable == variable)
    }

    /// Reject malformed box bounds before any data is looked at.
    ///
    /// Constraints that merely contradict the box are left to the solver,
    /// which reports them as infeasible.
    pub fn validate(&self) -> CccResult<()> {
        for variable in DecisionVariable::ALL {
            let b = self.bounds_for(variable);
            if b.lower < Decimal::ZERO {
                return Err(CccError::InvalidConfiguration {
                    field: format!("{variable}.lower"),
                    reason: format!("Day bounds cannot be negative (got {})", b.lower),
                });
            }
            if b.lower > b.upper {
                return Err(CccError::InvalidConfiguration {
                    field: variable.to_string(),
                    reason: format!("Lower bound {} exceeds upper bound {}", b.lower, b.upper),
                });
            }
        }
        Ok(())
    }
}
