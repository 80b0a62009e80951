use itertools::Itertools;
use log::debug;
use log::trace;

use super::activity::term_contribution;
use super::activity::ActivityBounds;
use super::constraint::QuadraticConstraint;
use super::constraint::Side;
use super::curvature::Curvature;
use super::terms::TermPosition;
use crate::basic_types::Infeasible;
use crate::basic_types::PropagationStatus;
use crate::engine::variables::VariableId;
use crate::engine::Domains;
use crate::engine::QuadraticOptions;
use crate::math::rounding::sub_down;
use crate::math::rounding::sub_up;
use crate::math::Interval;
use crate::quadcons_assert_simple;

impl QuadraticConstraint {
    /// Tightens the bounds of the variables of the constraint with interval arithmetic.
    ///
    /// For every term, the sides minus the activity of all other terms give the range which the
    /// term has to take; solving for the variable of the term gives its new bounds. Returns the
    /// number of tightened bounds, or [`Infeasible`] if the constraint cannot be satisfied under
    /// the current bounds.
    pub(crate) fn propagate(
        &mut self,
        domains: &mut Domains,
        options: &QuadraticOptions,
    ) -> PropagationStatus<usize> {
        self.statistics.propagation_calls += 1;
        self.update_activities(domains);

        let activity = self.total_activity_bounds().interval();
        let sides = Interval::new(self.lhs, self.rhs);
        if activity.lower() > sub_up(self.rhs, -options.feasibility_tolerance)
            || activity.upper() < sub_down(self.lhs, options.feasibility_tolerance)
        {
            debug!("Activity {activity} of {self} is disjoint from its sides");
            return Err(Infeasible::ActivityOutOfRange);
        }
        if sides.contains_interval(activity) {
            self.is_propagated = true;
            return Ok(0);
        }

        let mut num_tightenings = 0;

        for position in 0..self.linear_terms.len() {
            let term = self.linear_terms[position];
            if term.coefficient == 0.0 || domains.is_fixed(term.variable) {
                continue;
            }
            self.update_activities(domains);

            let mut others = self
                .linear_activity
                .bounds_without(position, term.coefficient);
            others.merge(self.quadratic_activity.bounds());

            let target = residual(sides, others);
            let new_bounds = target.div(Interval::point(term.coefficient));
            num_tightenings += self.tighten(term.variable, new_bounds, domains, options)?;
        }

        for position in 0..self.quad_var_terms.len() {
            let variable = self.quad_var_terms[position].variable;
            if domains.is_fixed(variable) || self.term_positions(variable).len() != 1 {
                continue;
            }
            self.update_activities(domains);

            let Some((square_coefficient, linear_coefficient, others)) =
                self.isolate_quad_var_term(position, domains)
            else {
                continue;
            };
            let target = residual(sides, others);

            if square_coefficient == 0.0 && linear_coefficient == Interval::ZERO {
                if !target.widen(options.feasibility_tolerance).contains(0.0) {
                    debug!("{variable} vanished from {self} which cannot be satisfied");
                    return Err(Infeasible::ActivityOutOfRange);
                }
                continue;
            }

            let solve = |target: Interval| {
                Interval::solve_univariate_quadratic(
                    Interval::point(square_coefficient),
                    linear_coefficient,
                    target,
                )
            };
            let mut new_bounds = solve(target);
            if new_bounds.is_empty() {
                // Only a violation beyond the tolerance proves infeasibility.
                new_bounds = solve(target.widen(options.feasibility_tolerance));
            }
            num_tightenings += self.tighten(variable, new_bounds, domains, options)?;
        }

        self.statistics.bound_tightenings += num_tightenings;
        self.is_propagated = true;
        Ok(num_tightenings)
    }

    /// Splits the constraint function into the quadratic variable term at `position`, with every
    /// adjacent bilinear term `c · x · y` absorbed into its linear coefficient as `c · [y]`, and
    /// the activity of all remaining terms.
    fn isolate_quad_var_term(
        &self,
        position: usize,
        domains: &Domains,
    ) -> Option<(f64, Interval, ActivityBounds)> {
        let term = &self.quad_var_terms[position];
        let variable = term.variable;

        let mut linear_coefficient = Interval::point(term.linear_coefficient);
        let mut neighbours = Vec::new();
        for &bilinear_position in &term.adjacent_bilinear {
            let bilinear = &self.bilinear_terms[bilinear_position];
            let other = bilinear.other(variable);
            linear_coefficient =
                linear_coefficient + domains.bounds(other).mul_scalar(bilinear.coefficient);

            if bilinear.var2 == variable {
                // The bilinear term is part of the contribution of the term of `other`.
                neighbours.push(self.accounting_position(bilinear_position)?);
            }
        }

        let mut others = self.quadratic_activity.bounds();
        others.remove(self.quadratic_activity.contribution(position));
        for neighbour in neighbours.into_iter().unique() {
            others.remove(self.quadratic_activity.contribution(neighbour));
            others.add(term_contribution(
                &self.quad_var_terms[neighbour],
                &self.bilinear_terms,
                domains,
                Some(variable),
            ));
        }
        others.merge(self.linear_activity.bounds());

        Some((term.square_coefficient, linear_coefficient, others))
    }

    /// The position of the quadratic variable term whose contribution includes the bilinear term
    /// at `bilinear_position`.
    fn accounting_position(&self, bilinear_position: usize) -> Option<usize> {
        let var1 = self.bilinear_terms[bilinear_position].var1;
        self.term_positions(var1)
            .iter()
            .find_map(|position| match position {
                TermPosition::Quadratic(index)
                    if self.quad_var_terms[*index]
                        .adjacent_bilinear
                        .contains(&bilinear_position) =>
                {
                    Some(*index)
                }
                _ => None,
            })
    }

    /// Intersects the domain of `variable` with `new_bounds`, applying only significant
    /// tightenings. Returns the number of tightened bounds.
    fn tighten(
        &mut self,
        variable: VariableId,
        new_bounds: Interval,
        domains: &mut Domains,
        options: &QuadraticOptions,
    ) -> PropagationStatus<usize> {
        let current = domains.bounds(variable);
        let tolerance = options.feasibility_tolerance;

        if new_bounds.is_empty()
            || new_bounds.lower() > current.upper() + tolerance
            || new_bounds.upper() < current.lower() - tolerance
        {
            debug!("Propagating {self} empties the domain {current} of {variable}");
            return Err(Infeasible::EmptyDomain(variable));
        }

        let (mut lower, mut upper) = (new_bounds.lower(), new_bounds.upper());
        if domains.is_integer(variable) {
            lower = (lower - tolerance).ceil();
            upper = (upper + tolerance).floor();
            if lower > upper {
                return Err(Infeasible::EmptyDomain(variable));
            }
        }
        // Bounds within the tolerance of crossing are moved onto the other bound.
        let lower = lower.min(current.upper());
        let upper = upper.max(current.lower());

        let mut num_tightenings = 0;
        if is_significant_lower(lower, current, domains, options) {
            trace!("Tightening lower bound of {variable} from {} to {lower}", current.lower());
            if domains.tighten_lower_bound(variable, lower)? {
                num_tightenings += 1;
            }
        }
        let current = domains.bounds(variable);
        if is_significant_upper(upper, current, domains, options) {
            trace!("Tightening upper bound of {variable} from {} to {upper}", current.upper());
            if domains.tighten_upper_bound(variable, upper)? {
                num_tightenings += 1;
            }
        }

        if num_tightenings > 0 {
            self.notify_bound_change(variable, domains);
        }
        quadcons_assert_simple!(domains.lower_bound(variable) <= domains.upper_bound(variable));
        Ok(num_tightenings)
    }
}

// default bounds
impl QuadraticConstraint {
    /// Bounds the unbounded variables of quadratic terms by `±default_bound` if a finite side of
    /// the constraint does not describe a convex set; secants and McCormick inequalities for such
    /// a side need finite bounds. Returns the number of tightened bounds.
    pub(crate) fn impose_default_bounds(
        &self,
        domains: &mut Domains,
        curvature: Curvature,
        default_bound: f64,
    ) -> PropagationStatus<usize> {
        let needs_bounds = (self.rhs.is_finite() && !curvature.is_convex_side(Side::Rhs))
            || (self.lhs.is_finite() && !curvature.is_convex_side(Side::Lhs));
        if !needs_bounds {
            return Ok(0);
        }

        let mut num_tightenings = 0;
        for term in &self.quad_var_terms {
            if domains.lower_bound(term.variable) == f64::NEG_INFINITY
                && domains.tighten_lower_bound(term.variable, -default_bound)?
            {
                num_tightenings += 1;
            }
            if domains.upper_bound(term.variable) == f64::INFINITY
                && domains.tighten_upper_bound(term.variable, default_bound)?
            {
                num_tightenings += 1;
            }
        }
        if num_tightenings > 0 {
            debug!("Imposed {num_tightenings} default bounds for {self}");
        }
        Ok(num_tightenings)
    }
}

/// The range `sides ⊖ others` which the remaining term has to take, rounded outward.
fn residual(sides: Interval, others: ActivityBounds) -> Interval {
    let others = others.interval();
    Interval::new(
        sub_down(sides.lower(), others.upper()),
        sub_up(sides.upper(), others.lower()),
    )
}

fn is_significant_lower(
    new_lower: f64,
    current: Interval,
    domains: &Domains,
    options: &QuadraticOptions,
) -> bool {
    if new_lower <= current.lower() || domains.normalise(new_lower) == f64::NEG_INFINITY {
        return false;
    }
    if current.lower() == f64::NEG_INFINITY {
        return true;
    }
    new_lower - current.lower() > options.min_bound_improvement * reference_width(current)
}

fn is_significant_upper(
    new_upper: f64,
    current: Interval,
    domains: &Domains,
    options: &QuadraticOptions,
) -> bool {
    if new_upper >= current.upper() || domains.normalise(new_upper) == f64::INFINITY {
        return false;
    }
    if current.upper() == f64::INFINITY {
        return true;
    }
    current.upper() - new_upper > options.min_bound_improvement * reference_width(current)
}

/// The domain width, or the magnitude of the finite bound for half-unbounded domains.
fn reference_width(current: Interval) -> f64 {
    let width = current.upper() - current.lower();
    if width.is_finite() {
        width
    } else if current.lower().is_finite() {
        current.lower().abs().max(1.0)
    } else {
        current.upper().abs().max(1.0)
    }
}
