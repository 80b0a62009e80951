use crate::containers::KeyedVec;
use crate::engine::variables::VariableId;
use crate::engine::Domains;

/// An assignment of a value to every variable, e.g. the solution of the LP relaxation which is
/// used as the reference point for separation, or a candidate solution which is checked.
#[derive(Clone, Debug, Default)]
pub struct Solution {
    values: KeyedVec<VariableId, f64>,
}

impl Solution {
    /// Creates a solution in which every variable of `domains` takes the value `0.0`.
    pub fn zeros(domains: &Domains) -> Solution {
        Solution::from_values(domains.variables().map(|_| 0.0))
    }

    /// Creates a solution from the values in variable order.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Solution {
        let mut keyed_values = KeyedVec::default();
        for value in values {
            let _ = keyed_values.push(value);
        }
        Solution {
            values: keyed_values,
        }
    }

    /// Returns the value of `variable`.
    ///
    /// Variables which were created after the solution are considered to take value `0.0`.
    pub fn value(&self, variable: VariableId) -> f64 {
        self.values.get(variable).copied().unwrap_or(0.0)
    }

    pub fn set_value(&mut self, variable: VariableId, value: f64) {
        self.values.accomodate(variable, 0.0);
        self.values[variable] = value;
    }

    pub fn num_values(&self) -> usize {
        self.values.len()
    }
}
