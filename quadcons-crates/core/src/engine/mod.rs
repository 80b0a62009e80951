//! The [`QuadraticEngine`] together with the variable [`Domains`] it reasons over.
mod constraint_id;
mod domains;
pub mod notifications;
mod options;
mod quadratic_engine;
pub mod variables;

pub use constraint_id::ConstraintId;
pub use domains::Domains;
pub use domains::EmptyDomain;
pub use domains::DEFAULT_INFINITY;
pub use options::CurvatureCheck;
pub use options::QuadraticOptions;
pub use quadratic_engine::EngineStatistics;
pub use quadratic_engine::PresolveOutcome;
pub use quadratic_engine::PropagationOutcome;
pub use quadratic_engine::QuadraticEngine;
