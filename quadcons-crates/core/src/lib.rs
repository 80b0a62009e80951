//! # Quadcons
//! Reasoning on quadratic constraints
//!
//! ```text
//! lhs ≤ Σ bᵢ·xᵢ + Σ (aⱼ·yⱼ + qⱼ·yⱼ²) + Σ cₖ·yₖ₁·yₖ₂ ≤ rhs
//! ```
//!
//! for a branch-and-bound solver. The host owns the search; this crate provides
//! - interval-based bound propagation ([`QuadraticEngine::propagate`]),
//! - linear outer approximations of violated constraints ([`QuadraticEngine::separate`]),
//! - presolve simplifications and upgrades to more specialised constraints
//!   ([`QuadraticEngine::presolve`]).
//!
//! The variables live in [`Domains`], which record every bound change so that the engine can
//! keep the activity bounds of its constraints up to date incrementally.
//!
//! # Example
//! ```rust
//! # use quadcons_core::constraints::quadratic::QuadraticConstraint;
//! # use quadcons_core::engine::variables::VariableType;
//! # use quadcons_core::engine::Domains;
//! # use quadcons_core::engine::QuadraticEngine;
//! let mut domains = Domains::default();
//! let x = domains.new_variable(-10.0, 10.0, VariableType::Continuous);
//! let y = domains.new_variable(-10.0, 10.0, VariableType::Continuous);
//!
//! // x² + y² ≤ 4
//! let mut constraint = QuadraticConstraint::new(f64::NEG_INFINITY, 4.0).unwrap();
//! constraint.add_square(x, 1.0).unwrap();
//! constraint.add_square(y, 1.0).unwrap();
//!
//! let mut engine = QuadraticEngine::default();
//! let _ = engine.add_constraint(constraint, &domains);
//! let _ = engine.propagate(&mut domains).expect("the constraint is feasible");
//!
//! // Bounds are rounded outward, so they may exceed ±2 by a few units in the last place.
//! assert!((domains.upper_bound(x) - 2.0).abs() < 1e-9);
//! assert!((domains.lower_bound(y) + 2.0).abs() < 1e-9);
//! ```
pub mod basic_types;
pub mod constraints;
pub mod containers;
pub mod engine;
pub mod math;
#[doc(hidden)]
pub mod quadcons_asserts;
pub mod statistics;

pub use crate::basic_types::ConstraintOperationError;
pub use crate::basic_types::Infeasible;
pub use crate::basic_types::PropagationStatus;
pub use crate::basic_types::Solution;
pub use crate::constraints::quadratic::QuadraticConstraint;
pub use crate::engine::Domains;
pub use crate::engine::QuadraticEngine;
pub use crate::engine::QuadraticOptions;
