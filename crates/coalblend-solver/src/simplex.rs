use crate::problem::{ConstraintOp, LpProblem, ObjectiveSense};
use crate::solution::Solution;

/// Two-phase tableau simplex for small dense problems
pub struct Solver {
    /// Pivot budget per phase before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            tolerance: 1e-9,
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Solve the problem. Never panics on solver-level trouble: an exhausted
    /// pivot budget or a degenerate basis comes back as `Undefined`.
    pub fn solve(&self, problem: &LpProblem) -> Solution {
        let mut tableau = self.build_tableau(problem);

        if tableau.n_artificial > 0 {
            match self.phase1(&mut tableau) {
                Phase1::Feasible => {}
                Phase1::Infeasible => return Solution::infeasible(),
                Phase1::IterationLimit => return Solution::undefined(),
            }
        }

        match self.phase2(&mut tableau) {
            Phase2::Optimal => {}
            Phase2::Unbounded => return Solution::unbounded(),
            Phase2::IterationLimit => return Solution::undefined(),
        }

        self.extract_solution(&tableau, problem)
    }

    /// Standard-form rows with non-negative right-hand sides. Negating a row
    /// swaps Le and Ge; Eq is unchanged.
    fn normalize(&self, problem: &LpProblem) -> Vec<(Vec<f64>, ConstraintOp, f64)> {
        let n_vars = problem.num_variables();
        problem
            .constraints
            .iter()
            .map(|c| {
                let mut coeffs = vec![0.0; n_vars];
                for (j, &coef) in c.coefficients.iter().enumerate().take(n_vars) {
                    coeffs[j] = coef;
                }
                if c.rhs < 0.0 {
                    for v in &mut coeffs {
                        *v = -*v;
                    }
                    let op = match c.op {
                        ConstraintOp::Le => ConstraintOp::Ge,
                        ConstraintOp::Ge => ConstraintOp::Le,
                        ConstraintOp::Eq => ConstraintOp::Eq,
                    };
                    (coeffs, op, -c.rhs)
                } else {
                    (coeffs, c.op, c.rhs)
                }
            })
            .collect()
    }

    fn build_tableau(&self, problem: &LpProblem) -> Tableau {
        let rows = self.normalize(problem);
        let n_vars = problem.num_variables();
        let n_rows = rows.len();

        let mut n_slack = 0;
        let mut n_artificial = 0;
        for (_, op, _) in &rows {
            match op {
                ConstraintOp::Le => n_slack += 1,
                ConstraintOp::Ge => {
                    n_slack += 1; // surplus
                    n_artificial += 1;
                }
                ConstraintOp::Eq => n_artificial += 1,
            }
        }

        let n_cols = n_vars + n_slack + n_artificial + 1; // +1 for RHS
        let mut tableau = Tableau {
            data: vec![vec![0.0; n_cols]; n_rows + 1],
            basic: vec![0; n_rows],
            n_vars,
            n_slack,
            n_artificial,
        };

        let mut slack_col = n_vars;
        let mut art_col = n_vars + n_slack;
        for (i, (coeffs, op, rhs)) in rows.iter().enumerate() {
            tableau.data[i][..n_vars].copy_from_slice(coeffs);
            tableau.data[i][n_cols - 1] = *rhs;
            match op {
                ConstraintOp::Le => {
                    tableau.data[i][slack_col] = 1.0;
                    tableau.basic[i] = slack_col;
                    slack_col += 1;
                }
                ConstraintOp::Ge => {
                    tableau.data[i][slack_col] = -1.0;
                    slack_col += 1;
                    tableau.data[i][art_col] = 1.0;
                    tableau.basic[i] = art_col;
                    art_col += 1;
                }
                ConstraintOp::Eq => {
                    tableau.data[i][art_col] = 1.0;
                    tableau.basic[i] = art_col;
                    art_col += 1;
                }
            }
        }

        // Objective row holds coefficients for an internal maximization; a
        // minimization is negated on the way in and recomputed on the way out.
        let obj_row = n_rows;
        for (j, &coef) in problem.objective.coefficients.iter().enumerate().take(n_vars) {
            tableau.data[obj_row][j] = match problem.objective.sense {
                ObjectiveSense::Maximize => coef,
                ObjectiveSense::Minimize => -coef,
            };
        }

        tableau
    }

    /// Drive the artificial sum to zero, then restore the real objective.
    fn phase1(&self, tableau: &mut Tableau) -> Phase1 {
        let n_rows = tableau.data.len() - 1;
        let n_cols = tableau.data[0].len();
        let art_start = tableau.n_vars + tableau.n_slack;

        let saved_objective = tableau.data[n_rows].clone();

        // Auxiliary objective: maximize -(sum of artificials)
        for v in &mut tableau.data[n_rows] {
            *v = 0.0;
        }
        for j in art_start..art_start + tableau.n_artificial {
            tableau.data[n_rows][j] = -1.0;
        }
        // Price out the artificials currently in the basis
        for i in 0..n_rows {
            if tableau.basic[i] >= art_start {
                for j in 0..n_cols {
                    tableau.data[n_rows][j] += tableau.data[i][j];
                }
            }
        }

        let mut converged = false;
        for _ in 0..self.max_iterations {
            let Some(col) = self.entering_column(tableau, art_start) else {
                converged = true;
                break;
            };
            let Some(row) = self.leaving_row(tableau, col) else {
                // The auxiliary objective is bounded; a failed ratio test
                // here means the original problem has no feasible point.
                return Phase1::Infeasible;
            };
            tableau.pivot(row, col);
        }
        if !converged {
            return Phase1::IterationLimit;
        }

        // Any artificial still at a positive level proves infeasibility
        let rhs_col = n_cols - 1;
        for i in 0..n_rows {
            if tableau.basic[i] >= art_start && tableau.data[i][rhs_col].abs() > self.tolerance {
                return Phase1::Infeasible;
            }
        }

        // Pivot out artificials sitting in the basis at level zero so phase 2
        // never reactivates them. A row with no real-column entry left is a
        // redundant constraint and stays inert.
        for i in 0..n_rows {
            if tableau.basic[i] >= art_start {
                if let Some(col) =
                    (0..art_start).find(|&j| tableau.data[i][j].abs() > self.tolerance)
                {
                    tableau.pivot(i, col);
                }
            }
        }

        // Restore the real objective, priced out against the current basis
        tableau.data[n_rows] = saved_objective;
        for i in 0..n_rows {
            let basic = tableau.basic[i];
            let factor = tableau.data[n_rows][basic];
            if factor.abs() > self.tolerance {
                for j in 0..n_cols {
                    tableau.data[n_rows][j] -= factor * tableau.data[i][j];
                }
            }
        }

        Phase1::Feasible
    }

    fn phase2(&self, tableau: &mut Tableau) -> Phase2 {
        let art_start = tableau.n_vars + tableau.n_slack;
        for _ in 0..self.max_iterations {
            let Some(col) = self.entering_column(tableau, art_start) else {
                return Phase2::Optimal;
            };
            let Some(row) = self.leaving_row(tableau, col) else {
                return Phase2::Unbounded;
            };
            tableau.pivot(row, col);
        }
        Phase2::IterationLimit
    }

    /// Dantzig rule: most positive reduced cost among the non-artificial columns
    fn entering_column(&self, tableau: &Tableau, limit: usize) -> Option<usize> {
        let obj_row = tableau.data.len() - 1;
        let mut best = self.tolerance;
        let mut best_col = None;
        for j in 0..limit {
            if tableau.data[obj_row][j] > best {
                best = tableau.data[obj_row][j];
                best_col = Some(j);
            }
        }
        best_col
    }

    fn leaving_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let n_rows = tableau.data.len() - 1;
        let rhs_col = tableau.data[0].len() - 1;
        let mut min_ratio = f64::INFINITY;
        let mut min_row = None;
        for i in 0..n_rows {
            let val = tableau.data[i][col];
            if val > self.tolerance {
                let ratio = tableau.data[i][rhs_col] / val;
                if ratio >= 0.0 && ratio < min_ratio {
                    min_ratio = ratio;
                    min_row = Some(i);
                }
            }
        }
        min_row
    }

    fn extract_solution(&self, tableau: &Tableau, problem: &LpProblem) -> Solution {
        let n_rows = tableau.data.len() - 1;
        let rhs_col = tableau.data[0].len() - 1;

        let mut values = vec![0.0; tableau.n_vars];
        for i in 0..n_rows {
            let basic = tableau.basic[i];
            if basic < tableau.n_vars {
                values[basic] = tableau.data[i][rhs_col];
            }
        }

        let objective_value = values
            .iter()
            .zip(&problem.objective.coefficients)
            .map(|(v, c)| v * c)
            .sum();

        Solution::optimal(values, objective_value)
    }
}

struct Tableau {
    /// Constraint rows followed by the objective row; last column is the RHS
    data: Vec<Vec<f64>>,
    /// Basic variable (column index) per constraint row
    basic: Vec<usize>,
    n_vars: usize,
    n_slack: usize,
    n_artificial: usize,
}

impl Tableau {
    fn pivot(&mut self, row: usize, col: usize) {
        let n_rows = self.data.len();
        let n_cols = self.data[0].len();

        self.basic[row] = col;

        let pivot_val = self.data[row][col];
        for j in 0..n_cols {
            self.data[row][j] /= pivot_val;
        }

        for i in 0..n_rows {
            if i != row {
                let factor = self.data[i][col];
                if factor != 0.0 {
                    for j in 0..n_cols {
                        self.data[i][j] -= factor * self.data[row][j];
                    }
                }
            }
        }
    }
}

enum Phase1 {
    Feasible,
    Infeasible,
    IterationLimit,
}

enum Phase2 {
    Optimal,
    Unbounded,
    IterationLimit,
}
