#![cfg(test)]

use quadcons_core::constraints::quadratic::QuadraticConstraint;
use quadcons_core::engine::Domains;
use quadcons_core::QuadraticEngine;
use quadcons_core::Solution;
use rand::rngs::SmallRng;
use rand::Rng;
use rand::SeedableRng;

use crate::quadratic_tests::boundary_points;
use crate::quadratic_tests::feasible_points;
use crate::quadratic_tests::random_constraint;
use crate::quadratic_tests::set_up_domains;

/// Boxes which straddle zero, touch it from either side, or lie on one side of it.
const BOUND_FAMILIES: [(f64, f64); 6] = [
    (-3.0, 3.0),
    (0.0, 3.0),
    (-3.0, 0.0),
    (0.0, 1.5),
    (-2.0, 0.0),
    (0.5, 2.5),
];

fn random_box(rng: &mut SmallRng, num_variables: usize) -> Vec<(f64, f64)> {
    (0..num_variables)
        .map(|_| BOUND_FAMILIES[rng.gen_range(0..BOUND_FAMILIES.len())])
        .collect()
}

/// Feasible points of `constraint` drawn from the interior and from the boundary of the box.
fn feasible_samples(
    rng: &mut SmallRng,
    domains: &Domains,
    constraint: &QuadraticConstraint,
) -> Vec<Solution> {
    let mut feasible = feasible_points(rng, domains, constraint, 100);
    feasible.extend(
        boundary_points(rng, domains, 100)
            .into_iter()
            .filter(|point| constraint.violation(point) == 0.0),
    );
    feasible
}

fn assert_points_survive(
    domains: &Domains,
    constraint: &QuadraticConstraint,
    feasible: &[Solution],
) {
    for point in feasible {
        for variable in domains.variables() {
            assert!(
                domains
                    .bounds(variable)
                    .widen(1e-9)
                    .contains(point.value(variable)),
                "{constraint} cut off {point:?} at {variable}, which is now in {}",
                domains.bounds(variable)
            );
        }
    }
}

#[test]
fn circle_with_fixed_coordinate() {
    let (mut domains, variables) = set_up_domains(&[(-3.0, 3.0), (-3.0, 3.0)]);
    let (x, y) = (variables[0], variables[1]);
    domains.fix(y, 0.0).unwrap();
    let mut constraint = QuadraticConstraint::new(f64::NEG_INFINITY, 4.0).unwrap();
    constraint.add_square(x, 1.0).unwrap();
    constraint.add_square(y, 1.0).unwrap();
    let mut engine = QuadraticEngine::default();
    let _ = engine.add_constraint(constraint, &domains);

    let _ = engine.propagate(&mut domains).unwrap();

    let bounds = domains.bounds(x);
    assert!(bounds.lower() <= -2.0 && bounds.lower() > -2.0 - 1e-9);
    assert!(bounds.upper() >= 2.0 && bounds.upper() < 2.0 + 1e-9);
}

#[test]
fn propagation_to_a_fixpoint_is_idempotent() {
    let (mut domains, variables) = set_up_domains(&[(-3.0, 3.0), (-3.0, 3.0)]);
    let mut constraint = QuadraticConstraint::new(f64::NEG_INFINITY, 4.0).unwrap();
    constraint.add_square(variables[0], 1.0).unwrap();
    constraint.add_square(variables[1], 1.0).unwrap();
    let mut engine = QuadraticEngine::default();
    let _ = engine.add_constraint(constraint, &domains);

    let first = engine.propagate(&mut domains).unwrap();
    let bounds = variables
        .iter()
        .map(|&variable| domains.bounds(variable))
        .collect::<Vec<_>>();
    let second = engine.propagate(&mut domains).unwrap();

    // both bounds of both variables
    assert_eq!(first.num_tightenings, 4);
    assert_eq!(second.num_tightenings, 0);
    assert_eq!(
        variables
            .iter()
            .map(|&variable| domains.bounds(variable))
            .collect::<Vec<_>>(),
        bounds
    );
}

#[test]
fn product_with_factor_touching_zero_keeps_both_signs() {
    // 0 ≤ x·y holds for every x once y = 0
    let (mut domains, variables) = set_up_domains(&[(-10.0, 10.0), (0.0, 2.0)]);
    let (x, y) = (variables[0], variables[1]);
    let mut constraint = QuadraticConstraint::new(0.0, f64::INFINITY).unwrap();
    constraint.add_product(x, y, 1.0).unwrap();
    let mut engine = QuadraticEngine::default();
    let _ = engine.add_constraint(constraint, &domains);

    let _ = engine.propagate(&mut domains).unwrap();

    assert_eq!(domains.lower_bound(x), -10.0);
    assert_eq!(domains.upper_bound(x), 10.0);
    assert_eq!(domains.lower_bound(y), 0.0);
}

#[test]
fn product_with_factor_touching_zero_from_below() {
    // x·y ≤ 0 with y ∈ [-2, 0] only needs x ≥ 0 when y < 0
    let (mut domains, variables) = set_up_domains(&[(-10.0, 10.0), (-2.0, 0.0)]);
    let x = variables[0];
    let mut constraint = QuadraticConstraint::new(f64::NEG_INFINITY, 0.0).unwrap();
    constraint.add_product(x, variables[1], 1.0).unwrap();
    let mut engine = QuadraticEngine::default();
    let _ = engine.add_constraint(constraint, &domains);

    let _ = engine.propagate(&mut domains).unwrap();

    assert!(domains.bounds(x).contains(-5.0));
    assert!(domains.bounds(x).contains(5.0));
}

#[test]
fn sampled_feasible_points_survive_propagation() {
    let mut rng = SmallRng::seed_from_u64(42);

    for _ in 0..300 {
        let bounds = random_box(&mut rng, 3);
        let (mut domains, variables) = set_up_domains(&bounds);
        let constraint = random_constraint(&mut rng, &variables, 0.3);
        let feasible = feasible_samples(&mut rng, &domains, &constraint);
        let mut engine = QuadraticEngine::default();
        let _ = engine.add_constraint(constraint.clone(), &domains);

        match engine.propagate(&mut domains) {
            Ok(_) => assert_points_survive(&domains, &constraint, &feasible),
            Err(infeasible) => assert!(
                feasible.is_empty(),
                "{constraint} is feasible but propagation reported {infeasible:?}"
            ),
        }
    }
}

#[test]
fn propagation_after_backtracking_is_sound() {
    let mut rng = SmallRng::seed_from_u64(7);

    for _ in 0..80 {
        let bounds = random_box(&mut rng, 3);
        let (mut domains, variables) = set_up_domains(&bounds);
        let constraint = random_constraint(&mut rng, &variables, 0.0);
        let feasible = feasible_samples(&mut rng, &domains, &constraint);
        let mut engine = QuadraticEngine::default();
        let _ = engine.add_constraint(constraint.clone(), &domains);
        if engine.propagate(&mut domains).is_err() {
            assert!(feasible.is_empty());
            continue;
        }

        domains.new_checkpoint();
        let _ = domains.fix(variables[0], domains.lower_bound(variables[0]));
        let _ = engine.propagate(&mut domains);
        domains.synchronise(0);

        let result = engine.propagate(&mut domains);
        if feasible.is_empty() {
            continue;
        }
        let _ = result.unwrap();
        assert_points_survive(&domains, &constraint, &feasible);
    }
}
