//! Identifiers of the variables which occur in quadratic constraints.
mod variable_id;

pub use variable_id::VariableId;
pub use variable_id::VariableType;
