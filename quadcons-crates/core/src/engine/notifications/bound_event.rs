use std::fmt::Display;

use enumset::EnumSetType;

/// A description of the kinds of changes that can happen to the bounds of a variable.
///
/// Events are raised both when a bound is tightened and when it is restored by backtracking.
#[derive(Debug, EnumSetType, Hash)]
pub enum BoundEvent {
    /// The lower bound of the variable changed.
    LowerBound,
    /// The upper bound of the variable changed.
    UpperBound,
    /// The lower and upper bound of the variable became equal.
    Fixed,
}

impl Display for BoundEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundEvent::LowerBound => write!(f, "[Event:LB]"),
            BoundEvent::UpperBound => write!(f, "[Event:UB]"),
            BoundEvent::Fixed => write!(f, "[Event:Fixed]"),
        }
    }
}
