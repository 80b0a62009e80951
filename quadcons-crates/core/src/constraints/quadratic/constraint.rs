use std::fmt::Display;

use itertools::Itertools;

use super::activity::LinearActivity;
use super::activity::QuadraticActivity;
use super::curvature::Curvature;
use super::terms::BilinearTerm;
use super::terms::LinearTerm;
use super::terms::QuadVarTerm;
use super::terms::TermPosition;
use crate::basic_types::ConstraintOperationError;
use crate::basic_types::Solution;
use crate::containers::HashMap;
use crate::create_statistics_struct;
use crate::engine::variables::VariableId;
use crate::quadcons_assert_moderate;
use crate::quadcons_assert_simple;

create_statistics_struct!(
    /// Counters of the work done for a single constraint.
    ConstraintStatistics {
        activity_recomputations: usize,
        bound_tightenings: usize,
        propagation_calls: usize,
        oracle_calls: usize,
        cuts_generated: usize,
        cuts_rejected: usize,
});

/// A side of a constraint `lhs ≤ activity ≤ rhs`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Lhs,
    Rhs,
}

/// The constraint `lhs ≤ Σ linear terms + Σ quadratic variable terms + Σ bilinear terms ≤ rhs`.
///
/// The constraint owns its terms and caches the activity and curvature derived from them. Every
/// structural edit invalidates the caches; bound changes of its variables are passed in by the
/// [`QuadraticEngine`](crate::engine::QuadraticEngine) and update the activity incrementally.
#[derive(Clone, Debug)]
pub struct QuadraticConstraint {
    pub(super) lhs: f64,
    pub(super) rhs: f64,
    pub(super) linear_terms: Vec<LinearTerm>,
    pub(super) quad_var_terms: Vec<QuadVarTerm>,
    pub(super) bilinear_terms: Vec<BilinearTerm>,

    pub(super) linear_activity: LinearActivity,
    pub(super) quadratic_activity: QuadraticActivity,
    /// `None` if the curvature has not been analysed since the last structural edit.
    pub(super) curvature: Option<Curvature>,
    pub(super) is_propagated: bool,
    pub(super) is_canonical: bool,
    /// For every variable, the positions of its linear and quadratic variable terms.
    pub(super) occurrences: HashMap<VariableId, Vec<TermPosition>>,

    pub(crate) statistics: ConstraintStatistics,
}

impl QuadraticConstraint {
    /// Creates the constraint `lhs ≤ 0 ≤ rhs` without terms.
    pub fn new(lhs: f64, rhs: f64) -> Result<QuadraticConstraint, ConstraintOperationError> {
        if lhs.is_nan() || rhs.is_nan() || lhs > rhs {
            return Err(ConstraintOperationError::InvalidSides { lhs, rhs });
        }

        Ok(QuadraticConstraint {
            lhs,
            rhs,
            linear_terms: Vec::new(),
            quad_var_terms: Vec::new(),
            bilinear_terms: Vec::new(),
            linear_activity: LinearActivity::default(),
            quadratic_activity: QuadraticActivity::default(),
            curvature: None,
            is_propagated: false,
            is_canonical: false,
            occurrences: HashMap::default(),
            statistics: ConstraintStatistics::default(),
        })
    }

    pub fn lhs(&self) -> f64 {
        self.lhs
    }

    pub fn rhs(&self) -> f64 {
        self.rhs
    }

    pub fn linear_terms(&self) -> &[LinearTerm] {
        &self.linear_terms
    }

    pub fn quad_var_terms(&self) -> &[QuadVarTerm] {
        &self.quad_var_terms
    }

    pub fn bilinear_terms(&self) -> &[BilinearTerm] {
        &self.bilinear_terms
    }

    pub fn has_quadratic_part(&self) -> bool {
        !self.bilinear_terms.is_empty()
            || self
                .quad_var_terms
                .iter()
                .any(|term| term.square_coefficient != 0.0)
    }

    pub fn is_canonical(&self) -> bool {
        self.is_canonical
    }

    pub fn is_propagated(&self) -> bool {
        self.is_propagated
    }

    /// The curvature of the constraint function, if it has been analysed.
    pub fn curvature(&self) -> Option<Curvature> {
        self.curvature
    }

    pub fn statistics(&self) -> &ConstraintStatistics {
        &self.statistics
    }

    /// Returns every variable of the constraint once, in order of first occurrence.
    pub fn variables(&self) -> impl Iterator<Item = VariableId> + '_ {
        self.linear_terms
            .iter()
            .map(|term| term.variable)
            .chain(self.quad_var_terms.iter().map(|term| term.variable))
            .unique()
    }

    /// Returns the positions of the terms of `variable`.
    pub fn term_positions(&self, variable: VariableId) -> &[TermPosition] {
        self.occurrences
            .get(&variable)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns the position of the first quadratic variable term of `variable`.
    pub fn quad_var_position(&self, variable: VariableId) -> Option<usize> {
        self.term_positions(variable)
            .iter()
            .find_map(|position| match position {
                TermPosition::Quadratic(index) => Some(*index),
                TermPosition::Linear(_) => None,
            })
    }

    /// Replaces values beyond `infinity` in the sides by `±∞`.
    pub(crate) fn normalise_sides(&mut self, infinity: f64) {
        if self.lhs <= -infinity {
            self.lhs = f64::NEG_INFINITY;
        }
        if self.rhs >= infinity {
            self.rhs = f64::INFINITY;
        }
    }
}

// adding terms
impl QuadraticConstraint {
    /// Adds the term `coefficient · variable`.
    ///
    /// If `variable` occurs quadratically, the coefficient is added to the linear coefficient of
    /// its quadratic variable term instead.
    pub fn add_linear(
        &mut self,
        variable: VariableId,
        coefficient: f64,
    ) -> Result<(), ConstraintOperationError> {
        check_finite(coefficient)?;

        if let Some(position) = self.quad_var_position(variable) {
            self.quad_var_terms[position].linear_coefficient += coefficient;
            self.quadratic_activity.mark_stale();
        } else {
            self.linear_terms.push(LinearTerm {
                variable,
                coefficient,
            });
            self.occurrences
                .entry(variable)
                .or_default()
                .push(TermPosition::Linear(self.linear_terms.len() - 1));
            self.linear_activity.invalidate();
        }

        self.on_structural_edit();
        Ok(())
    }

    /// Adds the terms `square_coefficient · variable² + linear_coefficient · variable` and
    /// returns the position of the new quadratic variable term.
    ///
    /// Linear terms of `variable` are absorbed into the linear coefficient of the new term.
    pub fn add_quad_var(
        &mut self,
        variable: VariableId,
        linear_coefficient: f64,
        square_coefficient: f64,
    ) -> Result<usize, ConstraintOperationError> {
        check_finite(linear_coefficient)?;
        check_finite(square_coefficient)?;

        let linear_positions = self
            .term_positions(variable)
            .iter()
            .filter_map(|position| match position {
                TermPosition::Linear(index) => Some(*index),
                TermPosition::Quadratic(_) => None,
            })
            .collect::<Vec<_>>();
        let absorbed: f64 = linear_positions
            .iter()
            .map(|&index| self.linear_terms[index].coefficient)
            .sum();
        if !linear_positions.is_empty() {
            self.remove_linear_terms(&linear_positions)?;
        }

        self.quad_var_terms.push(QuadVarTerm::new(
            variable,
            linear_coefficient + absorbed,
            square_coefficient,
        ));
        let position = self.quad_var_terms.len() - 1;
        self.occurrences
            .entry(variable)
            .or_default()
            .push(TermPosition::Quadratic(position));

        self.quadratic_activity.mark_stale();
        self.on_structural_edit();
        Ok(position)
    }

    /// Adds the term `coefficient · x · y` where `x` and `y` are the variables of the quadratic
    /// variable terms at `position_x` and `position_y`; returns the position of the new bilinear
    /// term.
    pub fn add_bilinear(
        &mut self,
        position_x: usize,
        position_y: usize,
        coefficient: f64,
    ) -> Result<usize, ConstraintOperationError> {
        check_finite(coefficient)?;
        for position in [position_x, position_y] {
            if position >= self.quad_var_terms.len() {
                return Err(ConstraintOperationError::TermPositionOutOfRange {
                    position,
                    len: self.quad_var_terms.len(),
                });
            }
        }

        let x = self.quad_var_terms[position_x].variable;
        let y = self.quad_var_terms[position_y].variable;
        if x == y {
            return Err(ConstraintOperationError::BilinearSameVariable(x));
        }

        self.bilinear_terms
            .push(BilinearTerm::new(x, y, coefficient));
        let bilinear_position = self.bilinear_terms.len() - 1;
        self.quad_var_terms[position_x]
            .adjacent_bilinear
            .push(bilinear_position);
        self.quad_var_terms[position_y]
            .adjacent_bilinear
            .push(bilinear_position);

        self.quadratic_activity.mark_stale();
        self.on_structural_edit();
        Ok(bilinear_position)
    }

    /// Adds `coefficient · variable²`, reusing the quadratic variable term of `variable` if
    /// there is one.
    pub fn add_square(
        &mut self,
        variable: VariableId,
        coefficient: f64,
    ) -> Result<(), ConstraintOperationError> {
        check_finite(coefficient)?;
        match self.quad_var_position(variable) {
            Some(position) => {
                self.quad_var_terms[position].square_coefficient += coefficient;
                self.quadratic_activity.mark_stale();
                self.on_structural_edit();
            }
            None => {
                let _ = self.add_quad_var(variable, 0.0, coefficient)?;
            }
        }
        Ok(())
    }

    /// Adds `coefficient · x · y`, creating quadratic variable terms for `x` and `y` if needed;
    /// a product of a variable with itself is added as a square.
    pub fn add_product(
        &mut self,
        x: VariableId,
        y: VariableId,
        coefficient: f64,
    ) -> Result<(), ConstraintOperationError> {
        if x == y {
            return self.add_square(x, coefficient);
        }

        let position_x = self.find_or_create_quad_var(x)?;
        let position_y = self.find_or_create_quad_var(y)?;
        let _ = self.add_bilinear(position_x, position_y, coefficient)?;
        Ok(())
    }

    fn find_or_create_quad_var(
        &mut self,
        variable: VariableId,
    ) -> Result<usize, ConstraintOperationError> {
        match self.quad_var_position(variable) {
            Some(position) => Ok(position),
            None => self.add_quad_var(variable, 0.0, 0.0),
        }
    }
}

// replacing and removing terms
impl QuadraticConstraint {
    /// Substitutes `x ← coefficient · new_variable + offset` in the quadratic variable term at
    /// `position`, where `x` is the variable of that term.
    ///
    /// If `new_variable` is `None` or `coefficient` is zero, `x` is replaced by the constant
    /// `offset`. Constants are moved into the sides; bilinear terms of `x` with `new_variable`
    /// become square terms.
    pub fn replace_quad_var(
        &mut self,
        position: usize,
        new_variable: Option<VariableId>,
        coefficient: f64,
        offset: f64,
    ) -> Result<(), ConstraintOperationError> {
        check_finite(coefficient)?;
        check_finite(offset)?;
        if position >= self.quad_var_terms.len() {
            return Err(ConstraintOperationError::TermPositionOutOfRange {
                position,
                len: self.quad_var_terms.len(),
            });
        }

        let new_variable = new_variable.filter(|_| coefficient != 0.0);
        let QuadVarTerm {
            variable: old_variable,
            linear_coefficient,
            square_coefficient,
            ..
        } = self.quad_var_terms[position].clone();

        // a · (c·y + d)² + b · (c·y + d) = a·c²·y² + (2·a·c·d + b·c)·y + a·d² + b·d
        let constant = square_coefficient * offset * offset + linear_coefficient * offset;
        check_finite(constant)?;
        self.shift_sides(constant);

        let adjacent = self.quad_var_terms[position].adjacent_bilinear.clone();
        let mut folded_bilinear = Vec::new();
        let mut folded_square_coefficient = 0.0;

        for &bilinear_position in &adjacent {
            let bilinear = self.bilinear_terms[bilinear_position];
            let other = bilinear.other(old_variable);

            // d·x·z becomes d·c·y·z + d·offset·z
            if offset != 0.0 {
                if let Some(other_position) = self.quad_var_position(other) {
                    self.quad_var_terms[other_position].linear_coefficient +=
                        bilinear.coefficient * offset;
                }
            }

            match new_variable {
                Some(y) if y == other => {
                    folded_square_coefficient += bilinear.coefficient * coefficient;
                    folded_bilinear.push(bilinear_position);
                }
                Some(y) => {
                    self.bilinear_terms[bilinear_position] =
                        BilinearTerm::new(y, other, bilinear.coefficient * coefficient);
                }
                None => folded_bilinear.push(bilinear_position),
            }
        }

        match new_variable {
            Some(y) => {
                let term = &mut self.quad_var_terms[position];
                term.variable = y;
                term.square_coefficient =
                    square_coefficient * coefficient * coefficient + folded_square_coefficient;
                term.linear_coefficient = 2.0 * square_coefficient * coefficient * offset
                    + linear_coefficient * coefficient;
            }
            None => {
                let term = &mut self.quad_var_terms[position];
                term.square_coefficient = 0.0;
                term.linear_coefficient = 0.0;
            }
        }

        self.remove_bilinear_terms(&folded_bilinear);

        if new_variable.is_none() {
            self.remove_quad_var_terms(&[position])?;
        } else if let Some(y) = new_variable {
            self.rebuild_occurrences();
            self.absorb_linear_terms(y, position)?;
        }

        self.linear_activity.invalidate();
        self.quadratic_activity.mark_stale();
        self.on_structural_edit();
        Ok(())
    }

    /// Removes the bilinear terms at `positions`; the adjacency lists of the remaining terms are
    /// renumbered.
    pub fn remove_bilinear_terms(&mut self, positions: &[usize]) {
        if positions.is_empty() {
            return;
        }

        quadcons_assert_simple!(positions
            .iter()
            .all(|&position| position < self.bilinear_terms.len()));
        let is_removed = removal_mask(positions, self.bilinear_terms.len());

        // new_position[i] is i minus the number of removed terms before i
        let mut new_position = vec![0; self.bilinear_terms.len()];
        let mut num_removed = 0;
        for (position, removed) in is_removed.iter().enumerate() {
            new_position[position] = position - num_removed;
            if *removed {
                num_removed += 1;
            }
        }

        let mut position = 0;
        self.bilinear_terms.retain(|_| {
            let keep = !is_removed[position];
            position += 1;
            keep
        });

        for term in &mut self.quad_var_terms {
            term.adjacent_bilinear.retain(|&index| !is_removed[index]);
            for index in &mut term.adjacent_bilinear {
                *index = new_position[*index];
            }
        }

        self.quadratic_activity.mark_stale();
        self.on_structural_edit();
        quadcons_assert_moderate!(self.adjacency_is_consistent());
    }

    /// Removes the linear terms at `positions`.
    pub fn remove_linear_terms(
        &mut self,
        positions: &[usize],
    ) -> Result<(), ConstraintOperationError> {
        let len = self.linear_terms.len();
        if let Some(&position) = positions.iter().find(|&&position| position >= len) {
            return Err(ConstraintOperationError::TermPositionOutOfRange { position, len });
        }

        let is_removed = removal_mask(positions, len);
        let mut position = 0;
        self.linear_terms.retain(|_| {
            let keep = !is_removed[position];
            position += 1;
            keep
        });

        self.rebuild_occurrences();
        self.linear_activity.invalidate();
        self.on_structural_edit();
        Ok(())
    }

    /// Removes the quadratic variable terms at `positions`; the terms may not occur in bilinear
    /// terms.
    pub fn remove_quad_var_terms(
        &mut self,
        positions: &[usize],
    ) -> Result<(), ConstraintOperationError> {
        let len = self.quad_var_terms.len();
        if let Some(&position) = positions.iter().find(|&&position| position >= len) {
            return Err(ConstraintOperationError::TermPositionOutOfRange { position, len });
        }
        quadcons_assert_simple!(
            positions
                .iter()
                .all(|&position| self.quad_var_terms[position].adjacent_bilinear.is_empty()),
            "Quadratic variable terms can only be removed once their bilinear terms are removed"
        );

        let is_removed = removal_mask(positions, len);
        let mut position = 0;
        self.quad_var_terms.retain(|_| {
            let keep = !is_removed[position];
            position += 1;
            keep
        });

        self.rebuild_occurrences();
        self.quadratic_activity.mark_stale();
        self.on_structural_edit();
        Ok(())
    }

    /// Substitutes `variable ← coefficient · new_variable + offset` in the linear terms.
    pub(crate) fn replace_linear_var(
        &mut self,
        position: usize,
        new_variable: Option<VariableId>,
        coefficient: f64,
        offset: f64,
    ) -> Result<(), ConstraintOperationError> {
        check_finite(coefficient)?;
        check_finite(offset)?;
        let len = self.linear_terms.len();
        if position >= len {
            return Err(ConstraintOperationError::TermPositionOutOfRange { position, len });
        }

        let term = self.linear_terms[position];
        let constant = term.coefficient * offset;
        check_finite(constant)?;
        self.shift_sides(constant);

        match new_variable.filter(|_| coefficient != 0.0) {
            Some(y) => {
                self.remove_linear_terms(&[position])?;
                self.add_linear(y, term.coefficient * coefficient)?;
            }
            None => self.remove_linear_terms(&[position])?,
        }
        Ok(())
    }

    /// Moves linear terms of `variable` into the quadratic variable term at `position`.
    fn absorb_linear_terms(
        &mut self,
        variable: VariableId,
        position: usize,
    ) -> Result<(), ConstraintOperationError> {
        let linear_positions = self
            .term_positions(variable)
            .iter()
            .filter_map(|position| match position {
                TermPosition::Linear(index) => Some(*index),
                TermPosition::Quadratic(_) => None,
            })
            .collect::<Vec<_>>();
        if linear_positions.is_empty() {
            return Ok(());
        }

        let absorbed: f64 = linear_positions
            .iter()
            .map(|&index| self.linear_terms[index].coefficient)
            .sum();
        self.quad_var_terms[position].linear_coefficient += absorbed;
        self.remove_linear_terms(&linear_positions)
    }

    /// Subtracts `constant` from both sides.
    pub(super) fn shift_sides(&mut self, constant: f64) {
        if constant == 0.0 {
            return;
        }
        if self.lhs.is_finite() {
            self.lhs -= constant;
        }
        if self.rhs.is_finite() {
            self.rhs -= constant;
        }
        self.is_propagated = false;
    }

    pub(super) fn rebuild_occurrences(&mut self) {
        self.occurrences.clear();
        for (index, term) in self.linear_terms.iter().enumerate() {
            self.occurrences
                .entry(term.variable)
                .or_default()
                .push(TermPosition::Linear(index));
        }
        for (index, term) in self.quad_var_terms.iter().enumerate() {
            self.occurrences
                .entry(term.variable)
                .or_default()
                .push(TermPosition::Quadratic(index));
        }
    }

    pub(super) fn on_structural_edit(&mut self) {
        self.curvature = None;
        self.is_propagated = false;
        self.is_canonical = false;
    }

    /// Every bilinear term is referenced by the quadratic variable terms of both its variables.
    pub(crate) fn adjacency_is_consistent(&self) -> bool {
        self.bilinear_terms
            .iter()
            .enumerate()
            .all(|(position, bilinear)| {
                [bilinear.var1, bilinear.var2].iter().all(|&variable| {
                    self.quad_var_terms.iter().any(|term| {
                        term.variable == variable && term.adjacent_bilinear.contains(&position)
                    })
                })
            })
            && self.quad_var_terms.iter().all(|term| {
                term.adjacent_bilinear.iter().all(|&position| {
                    self.bilinear_terms
                        .get(position)
                        .is_some_and(|bilinear| bilinear.contains(term.variable))
                })
            })
    }
}

// evaluation
impl QuadraticConstraint {
    /// The value of the constraint function at `solution`.
    pub fn evaluate(&self, solution: &Solution) -> f64 {
        let linear: f64 = self
            .linear_terms
            .iter()
            .map(|term| term.coefficient * solution.value(term.variable))
            .sum();
        let quadratic: f64 = self
            .quad_var_terms
            .iter()
            .map(|term| {
                let value = solution.value(term.variable);
                (term.square_coefficient * value + term.linear_coefficient) * value
            })
            .sum();
        let bilinear: f64 = self
            .bilinear_terms
            .iter()
            .map(|term| {
                term.coefficient * solution.value(term.var1) * solution.value(term.var2)
            })
            .sum();

        linear + quadratic + bilinear
    }

    /// By how much `solution` violates the constraint; zero if it is satisfied.
    pub fn violation(&self, solution: &Solution) -> f64 {
        let activity = self.evaluate(solution);
        (self.lhs - activity).max(activity - self.rhs).max(0.0)
    }

    /// Returns the side which `solution` violates by more than `feasibility_tolerance`.
    pub fn violated_side(&self, solution: &Solution, feasibility_tolerance: f64) -> Option<Side> {
        let activity = self.evaluate(solution);
        if activity > self.rhs + feasibility_tolerance {
            Some(Side::Rhs)
        } else if activity < self.lhs - feasibility_tolerance {
            Some(Side::Lhs)
        } else {
            None
        }
    }
}

/// Marks the entries at `positions` among `len` entries; every position has to be below `len`.
fn removal_mask(positions: &[usize], len: usize) -> Vec<bool> {
    let mut is_removed = vec![false; len];
    for &position in positions {
        is_removed[position] = true;
    }
    is_removed
}

fn check_finite(coefficient: f64) -> Result<(), ConstraintOperationError> {
    if coefficient.is_finite() {
        Ok(())
    } else {
        Err(ConstraintOperationError::NonFiniteCoefficient(coefficient))
    }
}

impl Display for QuadraticConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.lhs.is_finite() {
            write!(f, "{} <= ", self.lhs)?;
        }

        let terms = self
            .linear_terms
            .iter()
            .map(ToString::to_string)
            .chain(self.quad_var_terms.iter().map(ToString::to_string))
            .chain(self.bilinear_terms.iter().map(ToString::to_string))
            .join(" + ");
        if terms.is_empty() {
            write!(f, "0")?;
        } else {
            write!(f, "{terms}")?;
        }

        if self.rhs.is_finite() {
            write!(f, " <= {}", self.rhs)?;
        }
        Ok(())
    }
}
