//! The quadratic constraint `lhs ≤ linear terms + quadratic terms ≤ rhs` and the reasoning on it:
//! activity bounds, curvature, bound propagation, cut generation, canonicalisation,
//! disaggregation and upgrades to other constraint types.
mod activity;
mod canonicalize;
mod constraint;
mod curvature;
mod cuts;
mod disaggregation;
mod propagation;
mod terms;
mod upgrade;

pub use constraint::ConstraintStatistics;
pub use constraint::QuadraticConstraint;
pub use constraint::Side;
#[cfg(feature = "eigen")]
pub use curvature::NalgebraEigenvalueOracle;
pub use curvature::Curvature;
pub use curvature::EigenvalueOracle;
pub use curvature::NoEigenvalueOracle;
pub use cuts::LinearCut;
pub use disaggregation::Disaggregation;
pub use terms::BilinearTerm;
pub use terms::LinearTerm;
pub use terms::QuadVarTerm;
pub use terms::TermPosition;
pub use upgrade::ConstraintUpgrade;
pub use upgrade::DisaggregationUpgrade;
pub use upgrade::LinearConstraint;
pub use upgrade::LinearUpgrade;
pub use upgrade::Replacement;
pub use upgrade::UpgradeRegistry;
