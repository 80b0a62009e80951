#![cfg(test)]

use quadcons_core::constraints::quadratic::Curvature;
use quadcons_core::constraints::quadratic::NoEigenvalueOracle;
use quadcons_core::constraints::quadratic::QuadraticConstraint;
use quadcons_core::engine::CurvatureCheck;
use quadcons_core::QuadraticOptions;
use rand::rngs::SmallRng;
use rand::Rng;
use rand::SeedableRng;

use crate::quadratic_tests::set_up_domains;

/// The eigenvalues of `[[a, c/2], [c/2, b]]` in ascending order.
fn eigenvalues(a: f64, b: f64, c: f64) -> (f64, f64) {
    let mean = (a + b) / 2.0;
    let radius = (((a - b) / 2.0).powi(2) + (c / 2.0).powi(2)).sqrt();
    (mean - radius, mean + radius)
}

#[test]
fn two_dimensional_forms_agree_with_their_eigenvalues() {
    let mut rng = SmallRng::seed_from_u64(42);
    let (_, variables) = set_up_domains(&[(-1.0, 1.0); 2]);
    let mut num_checked = 0;

    for _ in 0..500 {
        let [a, b, c] = std::array::from_fn(|_| rng.gen_range(-2.0..2.0));
        let (min, max) = eigenvalues(a, b, c);
        if min.abs() < 1e-6 || max.abs() < 1e-6 {
            continue;
        }

        let mut constraint = QuadraticConstraint::new(f64::NEG_INFINITY, 1.0).unwrap();
        constraint.add_square(variables[0], a).unwrap();
        constraint.add_square(variables[1], b).unwrap();
        constraint.add_product(variables[0], variables[1], c).unwrap();

        let curvature = constraint.check_curvature(&NoEigenvalueOracle, &QuadraticOptions::default());

        num_checked += 1;
        assert_eq!(
            curvature,
            Curvature {
                convex: min >= 0.0,
                concave: max <= 0.0,
            },
            "a = {a}, b = {b}, c = {c}"
        );
        assert_eq!(constraint.statistics().oracle_calls, 0);
    }

    assert!(num_checked > 400);
}

#[test]
fn cheap_checks_do_not_call_the_oracle() {
    let (_, variables) = set_up_domains(&[(-1.0, 1.0); 3]);
    // x² + y² + z² + xy + yz is convex, but only an eigenvalue computation shows it
    let mut constraint = QuadraticConstraint::new(f64::NEG_INFINITY, 1.0).unwrap();
    for &variable in &variables {
        constraint.add_square(variable, 1.0).unwrap();
    }
    constraint.add_product(variables[0], variables[1], 1.0).unwrap();
    constraint.add_product(variables[1], variables[2], 1.0).unwrap();
    let options = QuadraticOptions {
        curvature_check: CurvatureCheck::Cheap,
        ..Default::default()
    };

    let curvature = constraint.check_curvature(&NoEigenvalueOracle, &options);

    assert_eq!(curvature, Curvature::INDEFINITE);
    assert_eq!(constraint.statistics().oracle_calls, 0);
}

#[cfg(feature = "eigen")]
#[test]
fn gram_matrices_are_convex() {
    use quadcons_core::constraints::quadratic::NalgebraEigenvalueOracle;

    let mut rng = SmallRng::seed_from_u64(11);
    let (_, variables) = set_up_domains(&[(-1.0, 1.0); 3]);
    let oracle = NalgebraEigenvalueOracle::default();

    for _ in 0..50 {
        // Q = BᵀB is positive semidefinite
        let b: [[f64; 3]; 3] = std::array::from_fn(|_| std::array::from_fn(|_| rng.gen_range(-1.0..1.0)));
        let q = |i: usize, j: usize| (0..3).map(|k| b[k][i] * b[k][j]).sum::<f64>();

        for sign in [1.0, -1.0] {
            let mut constraint = QuadraticConstraint::new(f64::NEG_INFINITY, 1.0).unwrap();
            for i in 0..3 {
                constraint.add_square(variables[i], sign * q(i, i)).unwrap();
                for j in i + 1..3 {
                    constraint
                        .add_product(variables[i], variables[j], sign * 2.0 * q(i, j))
                        .unwrap();
                }
            }

            let curvature = constraint.check_curvature(&oracle, &QuadraticOptions::default());

            assert_eq!(curvature.convex, sign > 0.0);
            assert_eq!(curvature.concave, sign < 0.0);
            assert_eq!(constraint.statistics().oracle_calls, 1);
        }
    }
}
