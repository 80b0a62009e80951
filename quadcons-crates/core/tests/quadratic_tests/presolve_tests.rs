#![cfg(test)]

use quadcons_core::constraints::quadratic::QuadraticConstraint;
use quadcons_core::containers::HashSet;
use quadcons_core::QuadraticEngine;
use quadcons_core::QuadraticOptions;
use quadcons_core::Solution;
use rand::rngs::SmallRng;
use rand::Rng;
use rand::SeedableRng;

use crate::quadratic_tests::random_constraint;
use crate::quadratic_tests::random_point;
use crate::quadratic_tests::set_up_domains;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

#[test]
fn merging_preserves_the_function_and_removes_duplicates() {
    let mut rng = SmallRng::seed_from_u64(42);

    for _ in 0..100 {
        let (domains, variables) = set_up_domains(&[(-3.0, 3.0); 4]);
        let mut constraint = QuadraticConstraint::new(f64::NEG_INFINITY, 1.0).unwrap();
        for _ in 0..rng.gen_range(1..12) {
            let x = variables[rng.gen_range(0..variables.len())];
            let y = variables[rng.gen_range(0..variables.len())];
            let coefficient = rng.gen_range(-2.0..2.0);
            match rng.gen_range(0..3) {
                0 => constraint.add_linear(x, coefficient).unwrap(),
                1 => constraint.add_square(x, coefficient).unwrap(),
                _ => constraint.add_product(x, y, coefficient).unwrap(),
            }
        }
        let original = constraint.clone();

        constraint.merge_and_clean(&domains, 1e-12);

        for _ in 0..20 {
            let point = random_point(&mut rng, &domains);
            assert!(close(constraint.evaluate(&point), original.evaluate(&point)));
        }

        let linear = constraint
            .linear_terms()
            .iter()
            .map(|term| term.variable)
            .collect::<HashSet<_>>();
        let quadratic = constraint
            .quad_var_terms()
            .iter()
            .map(|term| term.variable)
            .collect::<HashSet<_>>();
        let pairs = constraint
            .bilinear_terms()
            .iter()
            .map(|term| (term.var1, term.var2))
            .collect::<HashSet<_>>();
        assert_eq!(linear.len(), constraint.linear_terms().len());
        assert_eq!(quadratic.len(), constraint.quad_var_terms().len());
        assert_eq!(pairs.len(), constraint.bilinear_terms().len());
        assert!(linear.is_disjoint(&quadratic));
        assert!(constraint
            .bilinear_terms()
            .iter()
            .all(|term| quadratic.contains(&term.var1) && quadratic.contains(&term.var2)));
    }
}

#[test]
fn disaggregation_is_equivalent_to_the_original() {
    let mut rng = SmallRng::seed_from_u64(3);
    let mut num_disaggregated = 0;

    for _ in 0..100 {
        let (mut domains, variables) = set_up_domains(&[(-3.0, 3.0); 4]);
        // x0 and x1 are only connected to each other, as are x2 and x3
        let mut constraint = random_constraint(&mut rng, &variables[..2], 0.0);
        let other = random_constraint(&mut rng, &variables[2..], 0.0);
        for term in other.quad_var_terms() {
            let _ = constraint
                .add_quad_var(term.variable, term.linear_coefficient, term.square_coefficient)
                .unwrap();
        }
        for term in other.linear_terms() {
            constraint.add_linear(term.variable, term.coefficient).unwrap();
        }
        for term in other.bilinear_terms() {
            constraint
                .add_product(term.var1, term.var2, term.coefficient)
                .unwrap();
        }
        constraint.merge_and_clean(&domains, 1e-12);
        let (_, num_components) = constraint.quadratic_components();

        let Some(disaggregation) = constraint.disaggregate(&mut domains).unwrap() else {
            assert!(num_components < 2);
            continue;
        };
        num_disaggregated += 1;
        assert_eq!(disaggregation.parts.len(), num_components);

        // The part `quad_k − s_k · z_k` evaluated with `z_k = 0` yields `quad_k`.
        let scales = disaggregation
            .parts
            .iter()
            .zip(&disaggregation.auxiliary_variables)
            .map(|(part, &auxiliary)| {
                -part
                    .linear_terms()
                    .iter()
                    .find(|term| term.variable == auxiliary)
                    .map(|term| term.coefficient)
                    .unwrap()
            })
            .collect::<Vec<_>>();

        for _ in 0..50 {
            let point = Solution::from_values(
                variables
                    .iter()
                    .map(|_| rng.gen_range(-3.0..=3.0))
                    .collect::<Vec<_>>(),
            );
            let part_values = disaggregation
                .parts
                .iter()
                .map(|part| part.evaluate(&point))
                .collect::<Vec<_>>();

            // With z_k = quad_k / s_k the master has the value of the original function.
            let mut extended = point.clone();
            for ((&auxiliary, &value), &scale) in disaggregation
                .auxiliary_variables
                .iter()
                .zip(&part_values)
                .zip(&scales)
            {
                extended.set_value(auxiliary, value / scale);
                assert!(domains
                    .bounds(auxiliary)
                    .widen(1e-9)
                    .contains(value / scale));
            }
            assert!(close(
                disaggregation.master.evaluate(&extended),
                constraint.evaluate(&point)
            ));
            assert!(disaggregation
                .parts
                .iter()
                .all(|part| part.violation(&extended) <= 1e-9));

            // Larger z_k still satisfy the parts; then the master implies the original.
            let mut relaxed = point.clone();
            for ((&auxiliary, &value), &scale) in disaggregation
                .auxiliary_variables
                .iter()
                .zip(&part_values)
                .zip(&scales)
            {
                relaxed.set_value(auxiliary, value / scale + rng.gen_range(0.0..1.0));
            }
            if disaggregation.master.violation(&relaxed) == 0.0 {
                assert!(constraint.violation(&point) <= 1e-9);
            }
        }
    }

    assert!(num_disaggregated > 0);
}

#[test]
fn disaggregation_with_an_unbounded_variable_stays_equivalent() {
    let mut rng = SmallRng::seed_from_u64(11);
    let (mut domains, variables) = set_up_domains(&[
        (f64::NEG_INFINITY, f64::INFINITY),
        (-1.0, 1.0),
        (-2.0, 2.0),
        (0.0, 3.0),
    ]);
    let (x, y, w, v) = (variables[0], variables[1], variables[2], variables[3]);
    // x² − 2xy + 3w² + v ≤ 5, where only the first part involves the free x
    let mut constraint = QuadraticConstraint::new(f64::NEG_INFINITY, 5.0).unwrap();
    constraint.add_square(x, 1.0).unwrap();
    constraint.add_product(x, y, -2.0).unwrap();
    constraint.add_square(w, 3.0).unwrap();
    constraint.add_linear(v, 1.0).unwrap();
    constraint.merge_and_clean(&domains, 1e-12);

    let disaggregation = constraint.disaggregate(&mut domains).unwrap().unwrap();

    let (z_xy, z_w) = (
        disaggregation.auxiliary_variables[0],
        disaggregation.auxiliary_variables[1],
    );
    assert_eq!(domains.upper_bound(z_xy), f64::INFINITY);
    assert!(domains.lower_bound(z_w) <= 0.0 && domains.upper_bound(z_w) >= 4.0);

    for _ in 0..200 {
        let magnitude = if rng.gen_bool(0.3) { 1e6 } else { 10.0 };
        let point = Solution::from_values([
            rng.gen_range(-magnitude..=magnitude),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-2.0..=2.0),
            rng.gen_range(0.0..=3.0),
        ]);

        let mut extended = point.clone();
        for (part, &auxiliary) in disaggregation
            .parts
            .iter()
            .zip(&disaggregation.auxiliary_variables)
        {
            let scale = -part
                .linear_terms()
                .iter()
                .find(|term| term.variable == auxiliary)
                .map(|term| term.coefficient)
                .unwrap();
            let value = part.evaluate(&point) / scale;
            assert!(
                domains.bounds(auxiliary).widen(1e-9).contains(value),
                "{value} is outside of the bounds {} of {auxiliary}",
                domains.bounds(auxiliary)
            );
            extended.set_value(auxiliary, value);
        }

        assert!(close(
            disaggregation.master.evaluate(&extended),
            constraint.evaluate(&point)
        ));
        let tolerance = 1e-9 * point.value(x).abs().max(1.0).powi(2);
        assert!(disaggregation
            .parts
            .iter()
            .all(|part| part.violation(&extended) <= tolerance));
        assert_eq!(
            disaggregation.master.violation(&extended) <= tolerance,
            constraint.violation(&point) <= tolerance
        );
    }
}

#[test]
fn presolve_hands_linear_constraints_to_the_host() {
    let (mut domains, variables) = set_up_domains(&[(-3.0, 3.0); 3]);
    let (x, y, z) = (variables[0], variables[1], variables[2]);
    // x·y + z² + 2z ≤ 4 with y fixed to 0 and z fixed to 1
    let mut constraint = QuadraticConstraint::new(f64::NEG_INFINITY, 4.0).unwrap();
    constraint.add_product(x, y, 1.0).unwrap();
    let _ = constraint.add_quad_var(z, 2.0, 1.0).unwrap();
    let mut engine = QuadraticEngine::new(QuadraticOptions::default());
    let id = engine.add_constraint(constraint, &domains);
    domains.fix(y, 0.0).unwrap();
    domains.fix(z, 1.0).unwrap();

    let outcome = engine.presolve(&mut domains).unwrap();

    assert_eq!(outcome.removed, vec![id]);
    assert_eq!(outcome.linear_constraints.len(), 1);
    let linear = &outcome.linear_constraints[0];
    assert!(linear.terms.is_empty());
    assert_eq!(linear.rhs, 1.0);
    assert_eq!(engine.num_constraints(), 0);
}
