/// The outcome of one LP solve
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: SolutionStatus,
    /// Optimal value per variable, in problem column order (empty unless Optimal)
    pub values: Vec<f64>,
    /// Objective value at the optimum (meaningless unless Optimal)
    pub objective_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// A bounded feasible optimum was found
    Optimal,
    /// No assignment satisfies all constraints
    Infeasible,
    /// The objective can improve without bound
    Unbounded,
    /// The solver stopped without reaching a verdict (iteration cap, numerics)
    Undefined,
}

impl Solution {
    pub fn optimal(values: Vec<f64>, objective_value: f64) -> Self {
        Self {
            status: SolutionStatus::Optimal,
            values,
            objective_value,
        }
    }

    pub fn infeasible() -> Self {
        Self {
            status: SolutionStatus::Infeasible,
            values: Vec::new(),
            objective_value: f64::NAN,
        }
    }

    pub fn unbounded() -> Self {
        Self {
            status: SolutionStatus::Unbounded,
            values: Vec::new(),
            objective_value: f64::NAN,
        }
    }

    pub fn undefined() -> Self {
        Self {
            status: SolutionStatus::Undefined,
            values: Vec::new(),
            objective_value: f64::NAN,
        }
    }
}
