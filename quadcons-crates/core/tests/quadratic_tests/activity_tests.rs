#![cfg(test)]

use quadcons_core::math::Interval;
use quadcons_core::QuadraticEngine;
use quadcons_core::QuadraticOptions;
use rand::rngs::SmallRng;
use rand::Rng;
use rand::SeedableRng;

use crate::quadratic_tests::random_constraint;
use crate::quadratic_tests::set_up_domains;

fn assert_close(incremental: Interval, recomputed: Interval) {
    let close = |a: f64, b: f64| a == b || (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0);
    assert!(
        close(incremental.lower(), recomputed.lower())
            && close(incremental.upper(), recomputed.upper()),
        "incremental {incremental} differs from recomputed {recomputed}"
    );
}

#[test]
fn incremental_activity_agrees_with_recomputation() {
    let mut rng = SmallRng::seed_from_u64(42);

    for _ in 0..20 {
        let (mut domains, variables) = set_up_domains(&[(-5.0, 5.0); 4]);
        let mut constraint = random_constraint(&mut rng, &variables, 0.5);
        for &variable in &variables {
            constraint
                .add_linear(variable, rng.gen_range(-3.0..3.0))
                .unwrap();
        }
        constraint.merge_and_clean(&domains, QuadraticOptions::default().epsilon);
        let mut engine = QuadraticEngine::default();
        let id = engine.add_constraint(constraint.clone(), &domains);

        for _ in 0..200 {
            match rng.gen_range(0..4) {
                0 if domains.get_checkpoint() > 0 => {
                    let checkpoint = rng.gen_range(0..domains.get_checkpoint());
                    domains.synchronise(checkpoint);
                }
                1 => domains.new_checkpoint(),
                _ => {
                    let variable = variables[rng.gen_range(0..variables.len())];
                    let bounds = domains.bounds(variable);
                    let value = rng.gen_range(bounds.lower()..=bounds.upper());
                    let _ = if rng.gen_bool(0.5) {
                        domains.tighten_lower_bound(variable, value)
                    } else {
                        domains.tighten_upper_bound(variable, value)
                    };
                }
            }

            let incremental = engine.activity(id, &mut domains).unwrap();
            let recomputed = constraint.clone().activity(&domains);
            assert_close(incremental, recomputed);
        }
    }
}

#[test]
fn unbounded_variables_make_the_activity_unbounded() {
    let (mut domains, variables) = set_up_domains(&[(0.0, f64::INFINITY), (-1.0, 1.0)]);
    let mut constraint =
        quadcons_core::QuadraticConstraint::new(f64::NEG_INFINITY, 1.0).unwrap();
    constraint.add_linear(variables[0], 2.0).unwrap();
    constraint.add_square(variables[1], 1.0).unwrap();
    let mut engine = QuadraticEngine::default();
    let id = engine.add_constraint(constraint, &domains);

    assert_eq!(
        engine.activity(id, &mut domains),
        Some(Interval::new(0.0, f64::INFINITY))
    );

    domains.new_checkpoint();
    let _ = domains.tighten_upper_bound(variables[0], 3.0).unwrap();
    assert_eq!(
        engine.activity(id, &mut domains),
        Some(Interval::new(0.0, 7.0))
    );

    domains.synchronise(0);
    assert_eq!(
        engine.activity(id, &mut domains),
        Some(Interval::new(0.0, f64::INFINITY))
    );
}
