use thiserror::Error;

/// A malformed request, rejected before the solver ever runs. Distinct from
/// an Infeasible outcome: Infeasible means no blend satisfies the bounds,
/// while these mean the scenario itself is self-contradicting.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScenarioError {
    #[error("no materials selected")]
    EmptySelection,
    #[error("total quantity must be a positive number, got {0}")]
    NonPositiveTotal(f64),
    #[error("unknown material: {0}")]
    UnknownMaterial(String),
    #[error("material selected more than once: {0}")]
    DuplicateSelection(String),
    #[error("fixed quantity given for {0}, which is not in the selection")]
    FixedNotSelected(String),
    #[error("invalid fixed quantity for {id}: {quantity}")]
    InvalidFixedQuantity { id: String, quantity: f64 },
    #[error("fixed quantities sum to {fixed_total}, exceeding the total quantity {total_quantity}")]
    FixedExceedsTotal { fixed_total: f64, total_quantity: f64 },
}
