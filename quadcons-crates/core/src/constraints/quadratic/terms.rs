use std::fmt::Display;

use crate::engine::variables::VariableId;

/// A term `coefficient · variable`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearTerm {
    pub variable: VariableId,
    pub coefficient: f64,
}

/// The terms `square_coefficient · variable² + linear_coefficient · variable` of a variable which
/// occurs quadratically, together with the positions of the bilinear terms it occurs in.
#[derive(Clone, Debug, PartialEq)]
pub struct QuadVarTerm {
    pub variable: VariableId,
    pub linear_coefficient: f64,
    pub square_coefficient: f64,
    /// Positions in the bilinear terms of the constraint which contain `variable`.
    pub adjacent_bilinear: Vec<usize>,
}

impl QuadVarTerm {
    pub(crate) fn new(
        variable: VariableId,
        linear_coefficient: f64,
        square_coefficient: f64,
    ) -> QuadVarTerm {
        QuadVarTerm {
            variable,
            linear_coefficient,
            square_coefficient,
            adjacent_bilinear: Vec::new(),
        }
    }
}

/// A term `coefficient · var1 · var2` with `var1 > var2`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BilinearTerm {
    pub var1: VariableId,
    pub var2: VariableId,
    pub coefficient: f64,
}

impl BilinearTerm {
    /// Creates the term with its variables in canonical order.
    pub(crate) fn new(x: VariableId, y: VariableId, coefficient: f64) -> BilinearTerm {
        let (var1, var2) = if x > y { (x, y) } else { (y, x) };
        BilinearTerm {
            var1,
            var2,
            coefficient,
        }
    }

    pub fn contains(&self, variable: VariableId) -> bool {
        self.var1 == variable || self.var2 == variable
    }

    /// Returns the variable of the term which is not `variable`.
    pub fn other(&self, variable: VariableId) -> VariableId {
        if self.var1 == variable {
            self.var2
        } else {
            self.var1
        }
    }
}

/// Where the terms of a variable are stored in a constraint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TermPosition {
    Linear(usize),
    Quadratic(usize),
}

impl Display for LinearTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}*{}", self.coefficient, self.variable)
    }
}

impl Display for QuadVarTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.square_coefficient != 0.0, self.linear_coefficient != 0.0) {
            (true, true) => write!(
                f,
                "{}*{}^2 + {}*{}",
                self.square_coefficient, self.variable, self.linear_coefficient, self.variable
            ),
            (true, false) => write!(f, "{}*{}^2", self.square_coefficient, self.variable),
            (false, true) => write!(f, "{}*{}", self.linear_coefficient, self.variable),
            (false, false) => write!(f, "0*{}", self.variable),
        }
    }
}

impl Display for BilinearTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}*{}*{}", self.coefficient, self.var1, self.var2)
    }
}
