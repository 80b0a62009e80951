use crate::engine::EmptyDomain;
use crate::engine::variables::VariableId;

/// The result of propagating quadratic constraints. The propagation either succeeds or proves that
/// the current node is infeasible, in which case the search driver should cut it off.
pub type PropagationStatus<T = ()> = Result<T, Infeasible>;

/// The reason the current node is infeasible.
///
/// Infeasibility is an expected outcome of propagation during search, not a fault.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Infeasible {
    /// A bound tightening emptied the domain of the variable.
    EmptyDomain(VariableId),
    /// The activity of the constraint cannot reach its sides under the current bounds.
    ActivityOutOfRange,
}

impl From<EmptyDomain> for Infeasible {
    fn from(empty_domain: EmptyDomain) -> Self {
        Infeasible::EmptyDomain(empty_domain.variable)
    }
}
