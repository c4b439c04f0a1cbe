/// A linear program over continuous, non-negative variables
#[derive(Debug, Clone)]
pub struct LpProblem {
    /// Variable names, fixing the column order of every coefficient vector
    pub variables: Vec<String>,
    pub objective: Objective,
    pub constraints: Vec<Constraint>,
}

#[derive(Debug, Clone)]
pub struct Objective {
    /// One coefficient per variable
    pub coefficients: Vec<f64>,
    pub sense: ObjectiveSense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveSense {
    Minimize,
    Maximize,
}

#[derive(Debug, Clone)]
pub struct Constraint {
    /// Label used in diagnostics
    pub name: String,
    /// One coefficient per variable
    pub coefficients: Vec<f64>,
    pub op: ConstraintOp,
    pub rhs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

impl LpProblem {
    /// A problem with no variables is legal: every constraint row is then a
    /// pure feasibility check on its right-hand side.
    pub fn new(variables: Vec<String>) -> Self {
        let n = variables.len();
        Self {
            variables,
            objective: Objective {
                coefficients: vec![0.0; n],
                sense: ObjectiveSense::Maximize,
            },
            constraints: Vec::new(),
        }
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>, sense: ObjectiveSense) {
        self.objective = Objective { coefficients, sense };
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        coefficients: Vec<f64>,
        op: ConstraintOp,
        rhs: f64,
    ) {
        self.constraints.push(Constraint {
            name: name.into(),
            coefficients,
            op,
            rhs,
        });
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }
}
