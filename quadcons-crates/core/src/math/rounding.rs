//! Floating-point operations with directed rounding.
//!
//! Rust does not expose control over the rounding mode of the floating-point unit, so every
//! operation is computed with the default round-to-nearest mode and then corrected by one unit in
//! the last place whenever an error-free transformation shows that the rounded result lies on the
//! wrong side of the exact result. The `_down` variants never exceed the exact result and the
//! `_up` variants are never below it.
//!
//! Products involving a zero are zero, even if the other operand is infinite; this is the
//! convention needed when multiplying interval bounds.

/// Returns the smallest `f64` strictly greater than `value`.
///
/// `NaN` and `+∞` are returned unchanged.
pub fn next_up(value: f64) -> f64 {
    if value.is_nan() || value == f64::INFINITY {
        return value;
    }
    if value == 0.0 {
        return f64::from_bits(1);
    }

    let bits = value.to_bits();
    if value > 0.0 {
        f64::from_bits(bits + 1)
    } else {
        f64::from_bits(bits - 1)
    }
}

/// Returns the largest `f64` strictly smaller than `value`.
///
/// `NaN` and `-∞` are returned unchanged.
pub fn next_down(value: f64) -> f64 {
    -next_up(-value)
}

/// The error of `a + b` as computed in round-to-nearest (Knuth's TwoSum).
fn sum_error(a: f64, b: f64, sum: f64) -> f64 {
    let b_virtual = sum - a;
    let a_virtual = sum - b_virtual;
    (a - a_virtual) + (b - b_virtual)
}

pub fn add_down(a: f64, b: f64) -> f64 {
    let sum = a + b;
    if !sum.is_finite() {
        // Overflow of two finite numbers rounds to infinity, but rounding down should stay finite.
        return if sum == f64::INFINITY && a.is_finite() && b.is_finite() {
            f64::MAX
        } else {
            sum
        };
    }

    if sum_error(a, b, sum) < 0.0 {
        next_down(sum)
    } else {
        sum
    }
}

pub fn add_up(a: f64, b: f64) -> f64 {
    -add_down(-a, -b)
}

pub fn sub_down(a: f64, b: f64) -> f64 {
    add_down(a, -b)
}

pub fn sub_up(a: f64, b: f64) -> f64 {
    add_up(a, -b)
}

/// Below this magnitude the residual of a product may underflow, so the result is always widened.
const TINY: f64 = 1e-290;

pub fn mul_down(a: f64, b: f64) -> f64 {
    if a == 0.0 || b == 0.0 {
        return 0.0;
    }

    let product = a * b;
    if !product.is_finite() {
        return if product == f64::INFINITY && a.is_finite() && b.is_finite() {
            f64::MAX
        } else {
            product
        };
    }
    if product.abs() < TINY {
        return next_down(product);
    }

    if a.mul_add(b, -product) < 0.0 {
        next_down(product)
    } else {
        product
    }
}

pub fn mul_up(a: f64, b: f64) -> f64 {
    -mul_down(-a, b)
}

/// Divides `a` by `b` rounding towards `-∞`; `b` may not be zero.
pub fn div_down(a: f64, b: f64) -> f64 {
    debug_assert!(b != 0.0, "division by zero in directed rounding");

    if a == 0.0 {
        return 0.0;
    }
    if b.is_infinite() {
        // ∞/∞ is only reached for unbounded intervals, in which case any lower bound is valid.
        return if a.is_infinite() {
            f64::NEG_INFINITY
        } else {
            0.0
        };
    }

    let quotient = a / b;
    if !quotient.is_finite() {
        return if quotient == f64::INFINITY && a.is_finite() {
            f64::MAX
        } else {
            quotient
        };
    }
    if quotient.abs() < TINY {
        return next_down(quotient);
    }

    // The exact quotient is `quotient + residual / b`.
    let residual = (-quotient).mul_add(b, a);
    if (residual < 0.0) != (b < 0.0) && residual != 0.0 {
        next_down(quotient)
    } else {
        quotient
    }
}

pub fn div_up(a: f64, b: f64) -> f64 {
    -div_down(-a, b)
}

/// The square root of `value` rounded down; negative values are treated as zero.
pub fn sqrt_down(value: f64) -> f64 {
    if value <= 0.0 {
        return 0.0;
    }
    if value == f64::INFINITY {
        return value;
    }

    let root = value.sqrt();
    if (-root).mul_add(root, value) < 0.0 {
        next_down(root)
    } else {
        root
    }
}

/// The square root of `value` rounded up; negative values are treated as zero.
pub fn sqrt_up(value: f64) -> f64 {
    if value <= 0.0 {
        return 0.0;
    }
    if value == f64::INFINITY {
        return value;
    }

    let root = value.sqrt();
    if (-root).mul_add(root, value) > 0.0 {
        next_up(root)
    } else {
        root
    }
}
