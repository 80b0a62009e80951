use thiserror::Error;

use crate::engine::variables::VariableId;
#[cfg(doc)]
use crate::constraints::quadratic::QuadraticConstraint;

/// Errors related to building or editing a [`QuadraticConstraint`].
///
/// These are structural errors in the input; they are reported immediately and the constraint is
/// left unchanged.
#[derive(Error, Debug, Copy, Clone, PartialEq)]
pub enum ConstraintOperationError {
    /// A bilinear term was requested for a variable with itself; this has to be expressed as a
    /// square term instead.
    #[error("A bilinear term needs two distinct variables, but {0} was given twice")]
    BilinearSameVariable(VariableId),
    /// A term position does not exist in the constraint.
    #[error("Term position {position} is out of range for {len} terms")]
    TermPositionOutOfRange { position: usize, len: usize },
    /// The sides of the constraint do not describe an interval.
    #[error("The left-hand side {lhs} exceeds the right-hand side {rhs}")]
    InvalidSides { lhs: f64, rhs: f64 },
    /// A coefficient was NaN or infinite.
    #[error("Coefficients have to be finite, got {0}")]
    NonFiniteCoefficient(f64),
}
