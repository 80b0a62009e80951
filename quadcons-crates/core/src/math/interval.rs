use std::fmt::Display;
use std::ops::Add;
use std::ops::Mul;
use std::ops::Neg;
use std::ops::Sub;

use super::rounding::*;

/// A closed interval `[lower, upper]` of reals whose bounds may be infinite.
///
/// All operations round outward, so the result of an operation always contains the exact result
/// of applying the operation to every pair of points of its operands. An interval with
/// `lower > upper` is empty.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interval {
    lower: f64,
    upper: f64,
}

impl Default for Interval {
    fn default() -> Self {
        Interval::ENTIRE
    }
}

impl Interval {
    pub const ENTIRE: Interval = Interval {
        lower: f64::NEG_INFINITY,
        upper: f64::INFINITY,
    };

    pub const EMPTY: Interval = Interval {
        lower: f64::INFINITY,
        upper: f64::NEG_INFINITY,
    };

    pub const ZERO: Interval = Interval {
        lower: 0.0,
        upper: 0.0,
    };

    /// Creates the interval `[lower, upper]`; if `lower > upper` the interval is empty.
    pub fn new(lower: f64, upper: f64) -> Interval {
        if lower > upper || lower.is_nan() || upper.is_nan() {
            Interval::EMPTY
        } else {
            Interval { lower, upper }
        }
    }

    pub fn point(value: f64) -> Interval {
        Interval::new(value, value)
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn is_empty(&self) -> bool {
        self.lower > self.upper
    }

    pub fn is_entire(&self) -> bool {
        self.lower == f64::NEG_INFINITY && self.upper == f64::INFINITY
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }

    /// Returns true if `other` is a subset of this interval.
    pub fn contains_interval(&self, other: Interval) -> bool {
        other.is_empty() || (self.lower <= other.lower && other.upper <= self.upper)
    }

    pub fn intersect(self, other: Interval) -> Interval {
        Interval::new(self.lower.max(other.lower), self.upper.min(other.upper))
    }

    /// The smallest interval containing both intervals.
    pub fn hull(self, other: Interval) -> Interval {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        Interval {
            lower: self.lower.min(other.lower),
            upper: self.upper.max(other.upper),
        }
    }

    /// Widens the interval by `amount` on both sides.
    pub fn widen(self, amount: f64) -> Interval {
        if self.is_empty() {
            return self;
        }
        Interval {
            lower: sub_down(self.lower, amount),
            upper: add_up(self.upper, amount),
        }
    }

    pub fn mul_scalar(self, scalar: f64) -> Interval {
        if self.is_empty() {
            return self;
        }
        if scalar >= 0.0 {
            Interval {
                lower: mul_down(self.lower, scalar),
                upper: mul_up(self.upper, scalar),
            }
        } else {
            Interval {
                lower: mul_down(self.upper, scalar),
                upper: mul_up(self.lower, scalar),
            }
        }
    }

    /// Divides this interval by `divisor`.
    ///
    /// The result encloses every `q` with `q · y ∈ self` for some `y ∈ divisor`. If both intervals
    /// contain zero this is [`Interval::ENTIRE`]; if zero is only one of the bounds of `divisor`
    /// the extended division gives a half-line.
    pub fn div(self, divisor: Interval) -> Interval {
        if self.is_empty() || divisor.is_empty() {
            return Interval::EMPTY;
        }
        if divisor == Interval::ZERO {
            return if self.contains(0.0) {
                Interval::ENTIRE
            } else {
                Interval::EMPTY
            };
        }
        if divisor.contains(0.0) && self.contains(0.0) {
            return Interval::ENTIRE;
        }

        if divisor.lower > 0.0 || divisor.upper < 0.0 {
            let candidates_down = [
                div_down(self.lower, divisor.lower),
                div_down(self.lower, divisor.upper),
                div_down(self.upper, divisor.lower),
                div_down(self.upper, divisor.upper),
            ];
            let candidates_up = [
                div_up(self.lower, divisor.lower),
                div_up(self.lower, divisor.upper),
                div_up(self.upper, divisor.lower),
                div_up(self.upper, divisor.upper),
            ];
            return Interval {
                lower: min_of(candidates_down),
                upper: max_of(candidates_up),
            };
        }

        let reciprocal = if divisor.lower == 0.0 && divisor.upper > 0.0 {
            Interval {
                lower: div_down(1.0, divisor.upper),
                upper: f64::INFINITY,
            }
        } else if divisor.upper == 0.0 && divisor.lower < 0.0 {
            Interval {
                lower: f64::NEG_INFINITY,
                upper: div_up(1.0, divisor.lower),
            }
        } else {
            return Interval::ENTIRE;
        };

        self * reciprocal
    }

    pub fn square(self) -> Interval {
        if self.is_empty() {
            return self;
        }

        if self.lower >= 0.0 {
            Interval {
                lower: mul_down(self.lower, self.lower),
                upper: mul_up(self.upper, self.upper),
            }
        } else if self.upper <= 0.0 {
            Interval {
                lower: mul_down(self.upper, self.upper),
                upper: mul_up(self.lower, self.lower),
            }
        } else {
            Interval {
                lower: 0.0,
                upper: mul_up(self.lower, self.lower).max(mul_up(self.upper, self.upper)),
            }
        }
    }

    /// The square root of the non-negative part of the interval.
    pub fn sqrt(self) -> Interval {
        if self.is_empty() || self.upper < 0.0 {
            return Interval::EMPTY;
        }
        Interval {
            lower: sqrt_down(self.lower.max(0.0)),
            upper: sqrt_up(self.upper),
        }
    }

    /// Encloses the range of `square_coefficient · x² + linear_coefficient · x` for `x` in `x` and
    /// every linear coefficient in `linear_coefficient`.
    ///
    /// Unlike evaluating the expression term by term, this does not overestimate the range due to
    /// the dependency between `x²` and `x`.
    pub fn quadratic(
        square_coefficient: f64,
        linear_coefficient: Interval,
        x: Interval,
    ) -> Interval {
        if x.is_empty() || linear_coefficient.is_empty() {
            return Interval::EMPTY;
        }
        if square_coefficient == 0.0 {
            return linear_coefficient * x;
        }

        let upper = quadratic_upper_bound(square_coefficient, linear_coefficient, x);
        let lower = -quadratic_upper_bound(-square_coefficient, -linear_coefficient, x);
        Interval { lower, upper }
    }

    /// Encloses all `x` for which `a · x² + b · x ∈ c` holds for some `a ∈ square_coefficient`,
    /// `b ∈ linear_coefficient` and `c ∈ rhs`.
    ///
    /// The result is an interval enclosure; holes in the solution set are not represented.
    pub fn solve_univariate_quadratic(
        square_coefficient: Interval,
        linear_coefficient: Interval,
        rhs: Interval,
    ) -> Interval {
        if square_coefficient.is_empty() || linear_coefficient.is_empty() || rhs.is_empty() {
            return Interval::EMPTY;
        }

        if square_coefficient == Interval::ZERO {
            if linear_coefficient == Interval::ZERO {
                return if rhs.contains(0.0) {
                    Interval::ENTIRE
                } else {
                    Interval::EMPTY
                };
            }
            return rhs.div(linear_coefficient);
        }

        if linear_coefficient == Interval::ZERO {
            let root = rhs.div(square_coefficient).sqrt();
            if root.is_empty() {
                return root;
            }
            return Interval::new(-root.upper, root.upper);
        }

        let positive =
            solve_positive_interval(square_coefficient, linear_coefficient, rhs);
        let negative =
            solve_positive_interval(square_coefficient, -linear_coefficient, rhs);

        positive.hull(-negative)
    }
}

fn min_of(values: [f64; 4]) -> f64 {
    values.into_iter().fold(f64::INFINITY, f64::min)
}

fn max_of(values: [f64; 4]) -> f64 {
    values.into_iter().fold(f64::NEG_INFINITY, f64::max)
}

/// Upper bound on `a · x² + b · x` for `b ∈ linear_coefficient` and `x ∈ x`, which is exact up to
/// rounding (Domes and Neumaier, Algorithm 2.2).
fn quadratic_upper_bound(a: f64, linear_coefficient: Interval, x: Interval) -> f64 {
    if a == 0.0 {
        return (linear_coefficient * x).upper;
    }

    // For x ≤ 0 we bound a · y² - b · y over y = -x ≥ 0 instead.
    let (x, b) = if x.upper <= 0.0 {
        (-x, -linear_coefficient.lower)
    } else {
        (x, linear_coefficient.upper)
    };

    if x.lower < 0.0 {
        let negative_part = Interval::new(x.lower, 0.0);
        let positive_part = Interval::new(0.0, x.upper);
        return quadratic_upper_bound(a, linear_coefficient, negative_part).max(
            quadratic_upper_bound(a, linear_coefficient, positive_part),
        );
    }

    if b == f64::INFINITY {
        return f64::INFINITY;
    }

    let at = |point: f64| mul_up(point, add_up(mul_up(a, point), b));
    let mut upper = at(x.lower).max(at(x.upper));

    // A concave parabola may attain its maximum at the vertex -b / 2a.
    if a < 0.0 {
        let half_b = b * 0.5;
        let vertex = div_up(half_b, -a);
        if vertex > x.lower && mul_up(-2.0 * a, x.upper) > b {
            upper = upper.max(mul_up(half_b, vertex));
        }
    }

    upper
}

/// Encloses all `x ≥ 0` for which `a · x² + b · x ∈ c` for some coefficients in the intervals.
fn solve_positive_interval(
    square_coefficient: Interval,
    linear_coefficient: Interval,
    rhs: Interval,
) -> Interval {
    // The expression can reach at most a.upper · x² + b.upper · x and at least
    // a.lower · x² + b.lower · x, so both inequalities below are necessary.
    let mut result = Interval::new(0.0, f64::INFINITY);

    if linear_coefficient.lower.is_finite()
        && rhs.upper.is_finite()
        && square_coefficient.lower.is_finite()
    {
        result = result.intersect(solve_positive_scalar(
            -square_coefficient.lower,
            -linear_coefficient.lower,
            -rhs.upper,
        ));
    }

    if linear_coefficient.upper.is_finite()
        && rhs.lower.is_finite()
        && square_coefficient.upper.is_finite()
    {
        result = result.intersect(solve_positive_scalar(
            square_coefficient.upper,
            linear_coefficient.upper,
            rhs.lower,
        ));
    }

    result
}

/// Encloses all `x ≥ 0` with `a · x² + b · x ≥ c` (Domes and Neumaier, Algorithm 3.2).
///
/// With `β = b / 2` and `Δ = β² + a · c`, the roots of `a · x² + b · x - c` are `c / (β + √Δ)` and
/// `c / (β - √Δ)`; the rationalised forms are used to avoid cancellation.
fn solve_positive_scalar(a: f64, b: f64, c: f64) -> Interval {
    let beta = b * 0.5;

    if beta >= 0.0 {
        if c > 0.0 {
            // x = 0 is infeasible; the expression is increasing unless a < 0.
            if a == 0.0 && b == 0.0 {
                return Interval::EMPTY;
            }
            let delta = add_up(mul_up(beta, beta), mul_up(a, c));
            if delta < 0.0 {
                return Interval::EMPTY;
            }
            let z = add_up(beta, sqrt_up(delta));
            let lower = div_down(c, z);
            let upper = if a < 0.0 {
                div_up(z, -a)
            } else {
                f64::INFINITY
            };
            Interval::new(lower, upper)
        } else if a < 0.0 {
            // Concave and feasible at 0, so feasible up to the positive root.
            let delta = add_up(mul_up(beta, beta), mul_up(a, c));
            let z = add_up(beta, sqrt_up(delta));
            Interval::new(0.0, div_up(z, -a))
        } else {
            Interval::new(0.0, f64::INFINITY)
        }
    } else if c > 0.0 {
        if a <= 0.0 {
            return Interval::EMPTY;
        }
        let delta = add_down(mul_down(beta, beta), mul_down(a, c));
        let z = add_down(-beta, sqrt_down(delta));
        Interval::new(div_down(z, a), f64::INFINITY)
    } else if a <= 0.0 {
        // Feasible at 0 and decreasing, so feasible up to the positive root c / (β - √Δ).
        let delta = add_down(mul_down(beta, beta), mul_down(a, c));
        let z = add_down(-beta, sqrt_down(delta));
        Interval::new(0.0, div_up(-c, z))
    } else {
        // Convex and feasible at 0: the feasible set may have a hole, which is not represented.
        Interval::new(0.0, f64::INFINITY)
    }
}

impl Add for Interval {
    type Output = Interval;

    fn add(self, rhs: Interval) -> Interval {
        if self.is_empty() || rhs.is_empty() {
            return Interval::EMPTY;
        }
        Interval {
            lower: add_down(self.lower, rhs.lower),
            upper: add_up(self.upper, rhs.upper),
        }
    }
}

impl Sub for Interval {
    type Output = Interval;

    fn sub(self, rhs: Interval) -> Interval {
        self + (-rhs)
    }
}

impl Neg for Interval {
    type Output = Interval;

    fn neg(self) -> Interval {
        if self.is_empty() {
            return self;
        }
        Interval {
            lower: -self.upper,
            upper: -self.lower,
        }
    }
}

impl Mul for Interval {
    type Output = Interval;

    fn mul(self, rhs: Interval) -> Interval {
        if self.is_empty() || rhs.is_empty() {
            return Interval::EMPTY;
        }

        let candidates_down = [
            mul_down(self.lower, rhs.lower),
            mul_down(self.lower, rhs.upper),
            mul_down(self.upper, rhs.lower),
            mul_down(self.upper, rhs.upper),
        ];
        let candidates_up = [
            mul_up(self.lower, rhs.lower),
            mul_up(self.lower, rhs.upper),
            mul_up(self.upper, rhs.lower),
            mul_up(self.upper, rhs.upper),
        ];
        Interval {
            lower: min_of(candidates_down),
            upper: max_of(candidates_up),
        }
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "∅")
        } else {
            write!(f, "[{}, {}]", self.lower, self.upper)
        }
    }
}
