mod problem;
mod simplex;
mod solution;

pub use problem::{Constraint, ConstraintOp, LpProblem, Objective, ObjectiveSense};
pub use simplex::Solver;
pub use solution::{Solution, SolutionStatus};
