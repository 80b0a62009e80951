#![cfg(test)]

use quadcons_core::constraints::quadratic::QuadraticConstraint;
use quadcons_core::QuadraticEngine;
use quadcons_core::Solution;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::quadratic_tests::feasible_points;
use crate::quadratic_tests::random_constraint;
use crate::quadratic_tests::random_point;
use crate::quadratic_tests::set_up_domains;

#[test]
fn mccormick_cut_separates_the_reference_point() {
    let (mut domains, variables) = set_up_domains(&[(0.0, 5.0), (0.0, 5.0)]);
    let (x, y) = (variables[0], variables[1]);
    let mut constraint = QuadraticConstraint::new(f64::NEG_INFINITY, 10.0).unwrap();
    constraint.add_product(x, y, 1.0).unwrap();
    let mut engine = QuadraticEngine::default();
    let _ = engine.add_constraint(constraint, &domains);
    let reference = Solution::from_values([4.0, 4.0]);

    let cuts = engine.separate(&mut domains, &reference);

    assert_eq!(cuts.len(), 1);
    let (_, cut) = &cuts[0];
    assert_eq!(cut.to_string(), "5*x0 + 5*x1 <= 35");
    assert!(cut.activity(&reference) > cut.rhs);
    assert!(cut.is_removable);

    // 5x + 5y - 25 underestimates xy at the corners of the box
    for corner in [[0.0, 0.0], [0.0, 5.0], [5.0, 0.0], [5.0, 5.0]] {
        let point = Solution::from_values(corner);
        let underestimator = cut.activity(&point) - (cut.rhs - 10.0);
        assert!(underestimator <= corner[0] * corner[1]);
    }
}

#[test]
fn cuts_do_not_cut_off_feasible_points() {
    let mut rng = SmallRng::seed_from_u64(42);
    let mut num_cuts = 0;

    for _ in 0..300 {
        let (mut domains, variables) = set_up_domains(&[(-3.0, 3.0), (-2.0, 4.0), (-1.0, 1.0)]);
        let constraint = random_constraint(&mut rng, &variables, 0.3);
        let feasible = feasible_points(&mut rng, &domains, &constraint, 100);
        let mut engine = QuadraticEngine::default();
        let _ = engine.add_constraint(constraint.clone(), &domains);
        let reference = random_point(&mut rng, &domains);

        for (_, cut) in engine.separate(&mut domains, &reference) {
            num_cuts += 1;
            let tolerance = 1e-6 * cut.lhs.abs().max(cut.rhs.abs()).max(1.0);
            assert!(cut.activity(&reference) > cut.rhs || cut.activity(&reference) < cut.lhs);
            for point in &feasible {
                let activity = cut.activity(point);
                assert!(
                    cut.lhs - tolerance <= activity && activity <= cut.rhs + tolerance,
                    "{cut} from {constraint} cuts off {point:?}"
                );
            }
        }
    }

    assert!(num_cuts > 0);
}
