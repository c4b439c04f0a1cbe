pub mod error;
pub mod optimizer;
pub mod types;

pub use error::ScenarioError;
pub use optimizer::{solve, validate};
pub use types::{
    AllocatedMaterial, Blend, BlendQuality, Material, Scenario, SolveResult, SolveStatus,
    Specification,
};
