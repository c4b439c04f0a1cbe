use std::collections::BTreeMap;

/// Quality attributes of one coal lot. Immutable for the duration of a solve;
/// quantities and attributes must share a consistent unit system (kg and
/// kcal/kg as conventionally paired).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Calorific value, kcal per mass unit
    pub cv: f64,
    /// Total moisture, % by mass
    pub tm: f64,
    /// Ash, % by mass
    pub ash: f64,
    /// Total sulfur, % by mass
    pub ts: f64,
}

/// Buyer bounds, each expressed as a limit on the average quality of the
/// entire blend (not just the optimized residual).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Specification {
    pub min_cv: f64,
    pub max_cv: f64,
    pub max_ash: f64,
    pub max_ts: f64,
    pub max_tm: f64,
}

/// One blending request: which lots to mix, how much blend to produce, and
/// which lots the operator has pinned to a manual quantity.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub selected: Vec<String>,
    pub total_quantity: f64,
    /// Operator-pinned quantities, keyed by selected id
    #[cfg_attr(feature = "serde", serde(default))]
    pub fixed: BTreeMap<String, f64>,
}

impl Scenario {
    pub fn fixed_total(&self) -> f64 {
        self.fixed.values().sum()
    }

    /// Quantity left for the optimizer to distribute
    pub fn residual(&self) -> f64 {
        self.total_quantity - self.fixed_total()
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    Undefined,
}

/// One line of the final allocation, in selection order
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct AllocatedMaterial {
    pub id: String,
    pub quantity: f64,
    /// True when the quantity came from the operator, not the solver
    pub pinned: bool,
}

/// Mass-weighted average quality of the full blend
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendQuality {
    pub cv: f64,
    pub tm: f64,
    pub ash: f64,
    pub ts: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Blend {
    pub allocation: Vec<AllocatedMaterial>,
    pub quality: BlendQuality,
}

impl Blend {
    pub fn total_quantity(&self) -> f64 {
        self.allocation.iter().map(|a| a.quantity).sum()
    }

    pub fn quantity_of(&self, id: &str) -> Option<f64> {
        self.allocation
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.quantity)
    }
}

/// Built fresh per solve; `blend` is present only when `status` is Optimal
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SolveResult {
    pub status: SolveStatus,
    pub blend: Option<Blend>,
}
