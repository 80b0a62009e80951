use super::constraint::QuadraticConstraint;
use super::terms::BilinearTerm;
use super::terms::LinearTerm;
use super::terms::QuadVarTerm;
use super::terms::TermPosition;
use crate::engine::variables::VariableId;
use crate::engine::Domains;
use crate::math::rounding::add_down;
use crate::math::rounding::add_up;
use crate::math::rounding::sub_down;
use crate::math::rounding::sub_up;
use crate::math::Interval;
use crate::quadcons_assert_advanced;
use crate::quadcons_assert_simple;

/// After this many incremental updates the linear activity is recomputed from scratch, which
/// bounds the widening caused by rounding outward in every update.
const RECOMPUTE_PERIOD: usize = 1000;

/// A sum of contribution intervals, where infinite contributions are counted instead of summed.
///
/// Keeping the finite parts separately allows removing a contribution again: if a term is the
/// only infinite contributor to a bound, the sum of the other terms is still known exactly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ActivityBounds {
    min_sum: f64,
    max_sum: f64,
    num_min_infinite: usize,
    num_max_infinite: usize,
}

impl Default for ActivityBounds {
    fn default() -> Self {
        ActivityBounds {
            min_sum: 0.0,
            max_sum: 0.0,
            num_min_infinite: 0,
            num_max_infinite: 0,
        }
    }
}

impl ActivityBounds {
    pub(crate) fn add(&mut self, contribution: Interval) {
        quadcons_assert_simple!(!contribution.is_empty());

        if contribution.lower() == f64::NEG_INFINITY {
            self.num_min_infinite += 1;
        } else {
            self.min_sum = add_down(self.min_sum, contribution.lower());
        }

        if contribution.upper() == f64::INFINITY {
            self.num_max_infinite += 1;
        } else {
            self.max_sum = add_up(self.max_sum, contribution.upper());
        }
    }

    /// Removes a contribution which was previously added.
    pub(crate) fn remove(&mut self, contribution: Interval) {
        if contribution.lower() == f64::NEG_INFINITY {
            quadcons_assert_simple!(self.num_min_infinite > 0);
            self.num_min_infinite -= 1;
        } else {
            self.min_sum = sub_down(self.min_sum, contribution.lower());
        }

        if contribution.upper() == f64::INFINITY {
            quadcons_assert_simple!(self.num_max_infinite > 0);
            self.num_max_infinite -= 1;
        } else {
            self.max_sum = sub_up(self.max_sum, contribution.upper());
        }
    }

    pub(crate) fn merge(&mut self, other: ActivityBounds) {
        self.min_sum = add_down(self.min_sum, other.min_sum);
        self.max_sum = add_up(self.max_sum, other.max_sum);
        self.num_min_infinite += other.num_min_infinite;
        self.num_max_infinite += other.num_max_infinite;
    }

    pub(crate) fn interval(&self) -> Interval {
        let lower = if self.num_min_infinite > 0 {
            f64::NEG_INFINITY
        } else {
            self.min_sum
        };
        let upper = if self.num_max_infinite > 0 {
            f64::INFINITY
        } else {
            self.max_sum
        };
        Interval::new(lower, upper)
    }

    /// Finite sums which cross without an infinite contributor indicate accumulated errors.
    fn is_consistent(&self) -> bool {
        self.num_min_infinite > 0 || self.num_max_infinite > 0 || self.min_sum <= self.max_sum
    }
}

/// The activity of the linear terms, updated incrementally from bound changes.
///
/// For every term the bounds which are included in the sums are cached; an update for bounds which
/// are already included has no effect.
#[derive(Clone, Debug, Default)]
pub(crate) struct LinearActivity {
    bounds: ActivityBounds,
    cached_bounds: Vec<Interval>,
    is_valid: bool,
    num_updates: usize,
}

impl LinearActivity {
    pub(crate) fn invalidate(&mut self) {
        self.is_valid = false;
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub(crate) fn recompute(&mut self, terms: &[LinearTerm], domains: &Domains) {
        self.bounds = ActivityBounds::default();
        self.cached_bounds.clear();
        for term in terms {
            let bounds = domains.bounds(term.variable);
            self.bounds.add(bounds.mul_scalar(term.coefficient));
            self.cached_bounds.push(bounds);
        }
        self.is_valid = true;
        self.num_updates = 0;
    }

    /// Replaces the bounds of the term at `position` in the sums by `bounds`.
    pub(crate) fn update(&mut self, position: usize, coefficient: f64, bounds: Interval) {
        if !self.is_valid || self.cached_bounds[position] == bounds {
            return;
        }

        self.bounds
            .remove(self.cached_bounds[position].mul_scalar(coefficient));
        self.bounds.add(bounds.mul_scalar(coefficient));
        self.cached_bounds[position] = bounds;
        self.num_updates += 1;

        if !self.bounds.is_consistent() || self.num_updates >= RECOMPUTE_PERIOD {
            self.is_valid = false;
        }
    }

    pub(crate) fn activity(&self) -> Interval {
        quadcons_assert_simple!(self.is_valid);
        self.bounds.interval()
    }

    pub(crate) fn bounds(&self) -> ActivityBounds {
        self.bounds
    }

    /// The activity bounds without the contribution of the term at `position`.
    pub(crate) fn bounds_without(&self, position: usize, coefficient: f64) -> ActivityBounds {
        let mut bounds = self.bounds;
        bounds.remove(self.cached_bounds[position].mul_scalar(coefficient));
        bounds
    }
}

/// The activity of the quadratic part, recomputed on demand after bound changes.
///
/// Every bilinear term is accounted for in the contribution of the quadratic variable term of its
/// `var1`.
#[derive(Clone, Debug)]
pub(crate) struct QuadraticActivity {
    bounds: ActivityBounds,
    contributions: Vec<Interval>,
    is_stale: bool,
}

impl Default for QuadraticActivity {
    fn default() -> Self {
        QuadraticActivity {
            bounds: ActivityBounds::default(),
            contributions: Vec::new(),
            is_stale: true,
        }
    }
}

impl QuadraticActivity {
    pub(crate) fn mark_stale(&mut self) {
        self.is_stale = true;
    }

    pub(crate) fn is_stale(&self) -> bool {
        self.is_stale
    }

    pub(crate) fn recompute(
        &mut self,
        quad_var_terms: &[QuadVarTerm],
        bilinear_terms: &[BilinearTerm],
        domains: &Domains,
    ) {
        self.bounds = ActivityBounds::default();
        self.contributions.clear();
        for term in quad_var_terms {
            let contribution = term_contribution(term, bilinear_terms, domains, None);
            self.bounds.add(contribution);
            self.contributions.push(contribution);
        }
        self.is_stale = false;
    }

    pub(crate) fn activity(&self) -> Interval {
        quadcons_assert_simple!(!self.is_stale);
        self.bounds.interval()
    }

    pub(crate) fn bounds(&self) -> ActivityBounds {
        self.bounds
    }

    pub(crate) fn contribution(&self, position: usize) -> Interval {
        self.contributions[position]
    }
}

/// The range of the quadratic variable term, including the bilinear terms of which its variable
/// is `var1`, optionally leaving out the bilinear terms with `excluded`.
pub(crate) fn term_contribution(
    term: &QuadVarTerm,
    bilinear_terms: &[BilinearTerm],
    domains: &Domains,
    excluded: Option<VariableId>,
) -> Interval {
    let mut linear_coefficient = Interval::point(term.linear_coefficient);
    for &position in &term.adjacent_bilinear {
        let bilinear = &bilinear_terms[position];
        if bilinear.var1 != term.variable || Some(bilinear.var2) == excluded {
            continue;
        }
        linear_coefficient =
            linear_coefficient + domains.bounds(bilinear.var2).mul_scalar(bilinear.coefficient);
    }

    Interval::quadratic(
        term.square_coefficient,
        linear_coefficient,
        domains.bounds(term.variable),
    )
}

// activity of a constraint
impl QuadraticConstraint {
    /// Makes sure the cached activities reflect the bounds in `domains`.
    pub(crate) fn update_activities(&mut self, domains: &Domains) {
        if !self.linear_activity.is_valid() {
            self.linear_activity.recompute(&self.linear_terms, domains);
            self.statistics.activity_recomputations += 1;
        }
        if self.quadratic_activity.is_stale() {
            self.quadratic_activity
                .recompute(&self.quad_var_terms, &self.bilinear_terms, domains);
            self.statistics.activity_recomputations += 1;
        }
    }

    pub fn linear_activity(&mut self, domains: &Domains) -> Interval {
        self.update_activities(domains);
        self.linear_activity.activity()
    }

    pub fn quadratic_activity(&mut self, domains: &Domains) -> Interval {
        self.update_activities(domains);
        self.quadratic_activity.activity()
    }

    /// An enclosure of the values of the constraint function under the bounds in `domains`.
    pub fn activity(&mut self, domains: &Domains) -> Interval {
        self.update_activities(domains);
        self.total_activity_bounds().interval()
    }

    pub(crate) fn total_activity_bounds(&self) -> ActivityBounds {
        let mut bounds = self.linear_activity.bounds();
        bounds.merge(self.quadratic_activity.bounds());
        bounds
    }

    /// Brings the cached activities up to date with the current bounds of `variable`.
    ///
    /// Repeated notifications for the same bounds have no effect.
    pub(crate) fn notify_bound_change(&mut self, variable: VariableId, domains: &Domains) {
        self.is_propagated = false;

        let bounds = domains.bounds(variable);
        for index in 0..self.term_positions(variable).len() {
            match self.term_positions(variable)[index] {
                TermPosition::Linear(position) => {
                    let coefficient = self.linear_terms[position].coefficient;
                    self.linear_activity.update(position, coefficient, bounds);
                }
                TermPosition::Quadratic(_) => self.quadratic_activity.mark_stale(),
            }
        }

        // Variables which only occur as var2 of bilinear terms have no quadratic variable term of
        // their own in a non-canonical constraint.
        if self
            .bilinear_terms
            .iter()
            .any(|bilinear| bilinear.contains(variable))
        {
            self.quadratic_activity.mark_stale();
        }

        quadcons_assert_advanced!(self.activity_agrees_with_recomputation(domains));
    }

    /// Compares the incrementally maintained linear activity with one computed from scratch.
    fn activity_agrees_with_recomputation(&self, domains: &Domains) -> bool {
        if !self.linear_activity.is_valid() {
            return true;
        }

        let mut scratch = LinearActivity::default();
        scratch.recompute(&self.linear_terms, domains);
        let incremental = self.linear_activity.activity();
        let recomputed = scratch.activity();

        let close = |a: f64, b: f64| {
            a == b || (a - b).abs() <= 1e-6 * a.abs().max(b.abs()).max(1.0)
        };
        close(incremental.lower(), recomputed.lower())
            && close(incremental.upper(), recomputed.upper())
    }
}
