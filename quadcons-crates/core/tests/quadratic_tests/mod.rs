use quadcons_core::constraints::quadratic::QuadraticConstraint;
use quadcons_core::engine::variables::VariableId;
use quadcons_core::engine::variables::VariableType;
use quadcons_core::engine::Domains;
use quadcons_core::Solution;
use rand::rngs::SmallRng;
use rand::Rng;

mod activity_tests;
mod curvature_tests;
mod presolve_tests;
mod propagation_tests;
mod separation_tests;

pub(crate) fn set_up_domains(bounds: &[(f64, f64)]) -> (Domains, Vec<VariableId>) {
    let mut domains = Domains::default();
    let variables = bounds
        .iter()
        .map(|&(lower_bound, upper_bound)| {
            domains.new_variable(lower_bound, upper_bound, VariableType::Continuous)
        })
        .collect();
    (domains, variables)
}

/// Creates a constraint with random squares, products and linear terms over `variables` and a
/// finite right-hand side; the left-hand side is finite with probability `lhs_probability`.
pub(crate) fn random_constraint(
    rng: &mut SmallRng,
    variables: &[VariableId],
    lhs_probability: f64,
) -> QuadraticConstraint {
    let rhs = rng.gen_range(-2.0..6.0);
    let lhs = if rng.gen_bool(lhs_probability) {
        rhs - rng.gen_range(1.0..8.0)
    } else {
        f64::NEG_INFINITY
    };
    let mut constraint = QuadraticConstraint::new(lhs, rhs).unwrap();

    for (index, &variable) in variables.iter().enumerate() {
        if index == 0 || rng.gen_bool(0.6) {
            constraint
                .add_square(variable, rng.gen_range(-2.0..2.0))
                .unwrap();
        }
        if rng.gen_bool(0.5) {
            constraint
                .add_linear(variable, rng.gen_range(-2.0..2.0))
                .unwrap();
        }
        for &other in &variables[index + 1..] {
            if rng.gen_bool(0.4) {
                constraint
                    .add_product(variable, other, rng.gen_range(-2.0..2.0))
                    .unwrap();
            }
        }
    }
    constraint
}

/// Draws a point uniformly from the bounds in `domains`, which have to be finite.
pub(crate) fn random_point(rng: &mut SmallRng, domains: &Domains) -> Solution {
    Solution::from_values(domains.variables().map(|variable| {
        let bounds = domains.bounds(variable);
        if bounds.lower() == bounds.upper() {
            bounds.lower()
        } else {
            rng.gen_range(bounds.lower()..=bounds.upper())
        }
    }))
}

/// Returns the corners of the box in `domains` and `count` random points of which one coordinate
/// lies on a bound; the bounds have to be finite.
pub(crate) fn boundary_points(
    rng: &mut SmallRng,
    domains: &Domains,
    count: usize,
) -> Vec<Solution> {
    let variables = domains.variables().collect::<Vec<_>>();
    let mut points = (0..1_usize << variables.len())
        .map(|corner| {
            Solution::from_values(variables.iter().enumerate().map(|(index, &variable)| {
                if (corner >> index) & 1 == 1 {
                    domains.upper_bound(variable)
                } else {
                    domains.lower_bound(variable)
                }
            }))
        })
        .collect::<Vec<_>>();

    for _ in 0..count {
        let mut point = random_point(rng, domains);
        let variable = variables[rng.gen_range(0..variables.len())];
        let value = if rng.gen_bool(0.5) {
            domains.lower_bound(variable)
        } else {
            domains.upper_bound(variable)
        };
        point.set_value(variable, value);
        points.push(point);
    }
    points
}

/// Draws points until `count` of them satisfy `constraint` or the attempts run out.
pub(crate) fn feasible_points(
    rng: &mut SmallRng,
    domains: &Domains,
    constraint: &QuadraticConstraint,
    count: usize,
) -> Vec<Solution> {
    (0..20 * count)
        .map(|_| random_point(rng, domains))
        .filter(|point| constraint.violation(point) == 0.0)
        .take(count)
        .collect()
}
