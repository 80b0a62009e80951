use std::fmt::Display;

use itertools::Itertools;
use log::debug;

use super::constraint::QuadraticConstraint;
use super::constraint::Side;
use super::curvature::Curvature;
use super::terms::LinearTerm;
use crate::basic_types::Solution;
use crate::containers::HashMap;
use crate::engine::variables::VariableId;
use crate::engine::Domains;
use crate::engine::QuadraticOptions;

/// A linear inequality `lhs ≤ Σ terms ≤ rhs` which is valid for the quadratic constraint it was
/// generated from, where one of the sides is infinite.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearCut {
    pub terms: Vec<LinearTerm>,
    pub lhs: f64,
    pub rhs: f64,
    /// Whether the cut depends on bounds which were tightened since the root.
    pub is_local: bool,
    /// Whether the LP may drop the cut again.
    pub is_removable: bool,
    /// The violation of the reference point divided by the Euclidean norm of the coefficients.
    pub efficacy: f64,
}

impl LinearCut {
    /// Evaluates the terms of the cut at `solution`.
    pub fn activity(&self, solution: &Solution) -> f64 {
        self.terms
            .iter()
            .map(|term| term.coefficient * solution.value(term.variable))
            .sum()
    }
}

impl Display for LinearCut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.lhs.is_finite() {
            write!(f, "{} <= ", self.lhs)?;
        }
        write!(f, "{}", self.terms.iter().join(" + "))?;
        if self.rhs.is_finite() {
            write!(f, " <= {}", self.rhs)?;
        }
        Ok(())
    }
}

/// Collects an underestimator `Σ coefficient · variable + constant` of a function, term by term.
#[derive(Debug)]
struct Underestimator<'a> {
    domains: &'a Domains,
    coefficients: HashMap<VariableId, f64>,
    constant: f64,
    is_local: bool,
}

impl<'a> Underestimator<'a> {
    fn new(domains: &'a Domains) -> Self {
        Underestimator {
            domains,
            coefficients: HashMap::default(),
            constant: 0.0,
            is_local: false,
        }
    }

    fn add_linear(&mut self, variable: VariableId, coefficient: f64) {
        *self.coefficients.entry(variable).or_insert(0.0) += coefficient;
    }

    /// The bounds of `variable` if both are finite; using them makes the cut local if they
    /// differ from the root bounds.
    fn finite_bounds(&mut self, variable: VariableId) -> Option<(f64, f64)> {
        let bounds = self.domains.bounds(variable);
        if !bounds.lower().is_finite() || !bounds.upper().is_finite() {
            return None;
        }
        if bounds != self.domains.root_bounds(variable) {
            self.is_local = true;
        }
        Some((bounds.lower(), bounds.upper()))
    }

    fn fixed_value(&self, variable: VariableId) -> Option<f64> {
        self.domains.fixed_value(variable)
    }

    /// Underestimates `a · x²`.
    fn add_square(
        &mut self,
        variable: VariableId,
        a: f64,
        reference: f64,
        integer_refinement: bool,
    ) -> Option<()> {
        if let Some(value) = self.fixed_value(variable) {
            self.constant += a * value * value;
            return Some(());
        }

        if a > 0.0 {
            if integer_refinement && reference.fract() != 0.0 {
                // At integers x² ≥ (⌊x̄⌋ + ⌈x̄⌉)·x − ⌊x̄⌋·⌈x̄⌉
                let (floor, ceil) = (reference.floor(), reference.ceil());
                self.add_linear(variable, a * (floor + ceil));
                self.constant -= a * floor * ceil;
            } else {
                // tangent at the reference point
                self.add_linear(variable, 2.0 * a * reference);
                self.constant -= a * reference * reference;
            }
        } else {
            // secant between the bounds
            let (lower, upper) = self.finite_bounds(variable)?;
            self.add_linear(variable, a * (lower + upper));
            self.constant -= a * lower * upper;
        }
        Some(())
    }

    /// Underestimates `c · x · y` by its linearisation at the reference point.
    fn add_bilinear_tangent(
        &mut self,
        (x, reference_x): (VariableId, f64),
        (y, reference_y): (VariableId, f64),
        c: f64,
    ) {
        self.add_linear(x, c * reference_y);
        self.add_linear(y, c * reference_x);
        self.constant -= c * reference_x * reference_y;
    }

    /// Underestimates `c · x · y` by the McCormick inequality which is tightest at the reference
    /// point.
    fn add_bilinear_mccormick(
        &mut self,
        (x, reference_x): (VariableId, f64),
        (y, reference_y): (VariableId, f64),
        c: f64,
    ) -> Option<()> {
        if let Some(value) = self.fixed_value(x) {
            self.add_linear(y, c * value);
            return Some(());
        }
        if let Some(value) = self.fixed_value(y) {
            self.add_linear(x, c * value);
            return Some(());
        }

        let (x_lower, x_upper) = self.finite_bounds(x)?;
        let (y_lower, y_upper) = self.finite_bounds(y)?;
        let weighted_reference =
            (x_upper - x_lower) * reference_y + (y_upper - y_lower) * reference_x;

        // The underestimators of xy meet at the corners (x_lower, y_lower) and (x_upper, y_upper),
        // the overestimators at (x_upper, y_lower) and (x_lower, y_upper).
        let (x_corner, y_corner) = if c > 0.0 {
            if weighted_reference <= x_upper * y_upper - x_lower * y_lower {
                (x_lower, y_lower)
            } else {
                (x_upper, y_upper)
            }
        } else {
            let weighted_reference =
                (x_upper - x_lower) * reference_y - (y_upper - y_lower) * reference_x;
            if weighted_reference <= x_upper * y_lower - x_lower * y_upper {
                (x_upper, y_lower)
            } else {
                (x_lower, y_upper)
            }
        };

        // c · (x_corner · y + y_corner · x − x_corner · y_corner)
        self.add_linear(x, c * y_corner);
        self.add_linear(y, c * x_corner);
        self.constant -= c * x_corner * y_corner;
        Some(())
    }
}

impl QuadraticConstraint {
    /// Generates a linear cut for the `side` of the constraint which `reference` violates.
    ///
    /// Returns `None` if no numerically safe cut with sufficient efficacy exists.
    pub(crate) fn generate_cut(
        &mut self,
        domains: &Domains,
        reference: &Solution,
        side: Side,
        curvature: Curvature,
        options: &QuadraticOptions,
    ) -> Option<LinearCut> {
        let cut = self.build_cut(domains, reference, side, curvature, options);
        if cut.is_some() {
            self.statistics.cuts_generated += 1;
        } else {
            self.statistics.cuts_rejected += 1;
        }
        cut
    }

    fn build_cut(
        &self,
        domains: &Domains,
        reference: &Solution,
        side: Side,
        curvature: Curvature,
        options: &QuadraticOptions,
    ) -> Option<LinearCut> {
        // The side is written as `sign · f(x) ≤ sign · side`, for which an underestimator of
        // `sign · f` is needed.
        let (sign, side_value) = match side {
            Side::Rhs => (1.0, self.rhs),
            Side::Lhs => (-1.0, -self.lhs),
        };
        if !side_value.is_finite() {
            return None;
        }

        let is_convex_side = curvature.is_convex_side(side);
        let clamped = |variable: VariableId| {
            let bounds = domains.bounds(variable);
            reference
                .value(variable)
                .max(bounds.lower())
                .min(bounds.upper())
        };

        let mut underestimator = Underestimator::new(domains);
        for term in &self.linear_terms {
            underestimator.add_linear(term.variable, sign * term.coefficient);
        }
        for term in &self.quad_var_terms {
            underestimator.add_linear(term.variable, sign * term.linear_coefficient);
            if term.square_coefficient != 0.0 {
                let integer_refinement = is_convex_side
                    && self.bilinear_terms.is_empty()
                    && domains.is_integer(term.variable);
                underestimator.add_square(
                    term.variable,
                    sign * term.square_coefficient,
                    clamped(term.variable),
                    integer_refinement,
                )?;
            }
        }
        for bilinear in &self.bilinear_terms {
            let x = (bilinear.var1, clamped(bilinear.var1));
            let y = (bilinear.var2, clamped(bilinear.var2));
            let c = sign * bilinear.coefficient;
            if is_convex_side {
                underestimator.add_bilinear_tangent(x, y, c);
            } else {
                underestimator.add_bilinear_mccormick(x, y, c)?;
            }
        }

        let is_local = underestimator.is_local;
        let mut rhs = side_value - underestimator.constant;
        let mut terms = underestimator
            .coefficients
            .into_iter()
            .filter(|(_, coefficient)| *coefficient != 0.0)
            .map(|(variable, coefficient)| LinearTerm {
                variable,
                coefficient,
            })
            .sorted_by_key(|term| term.variable)
            .collect::<Vec<_>>();

        let is_safe = |value: f64| value.is_finite() && value.abs() < options.infinity;
        if !is_safe(rhs) || terms.iter().any(|term| !is_safe(term.coefficient)) {
            debug!("Cut for {self} has values beyond infinity");
            return None;
        }

        // Tiny coefficients are moved into the side using the bound which keeps the cut valid.
        let mut is_local = is_local;
        for term in terms.iter().filter(|term| term.coefficient.abs() < options.epsilon) {
            let bounds = domains.bounds(term.variable);
            let bound = if term.coefficient > 0.0 {
                bounds.lower()
            } else {
                bounds.upper()
            };
            if !bound.is_finite() {
                debug!("Cannot relax the coefficient of unbounded {} in a cut", term.variable);
                return None;
            }
            if bounds != domains.root_bounds(term.variable) {
                is_local = true;
            }
            rhs -= term.coefficient * bound;
        }
        terms.retain(|term| term.coefficient.abs() >= options.epsilon);

        let (min, max) = terms
            .iter()
            .map(|term| term.coefficient.abs())
            .minmax()
            .into_option()?;
        if max / min > options.cut_max_range {
            debug!("Cut for {self} has coefficient range {} which is too large", max / min);
            return None;
        }

        let norm = terms
            .iter()
            .map(|term| term.coefficient * term.coefficient)
            .sum::<f64>()
            .sqrt();
        let activity: f64 = terms
            .iter()
            .map(|term| term.coefficient * reference.value(term.variable))
            .sum();
        let efficacy = (activity - rhs) / norm;
        if !(efficacy >= options.min_cut_efficacy) {
            debug!("Cut for {self} has efficacy {efficacy} which is too small");
            return None;
        }

        let (terms, lhs, rhs) = match side {
            Side::Rhs => (terms, f64::NEG_INFINITY, rhs),
            Side::Lhs => (
                terms
                    .into_iter()
                    .map(|term| LinearTerm {
                        variable: term.variable,
                        coefficient: -term.coefficient,
                    })
                    .collect(),
                -rhs,
                f64::INFINITY,
            ),
        };

        Some(LinearCut {
            terms,
            lhs,
            rhs,
            is_local,
            is_removable: !is_convex_side,
            efficacy,
        })
    }
}
