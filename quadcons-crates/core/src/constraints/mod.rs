//! The constraints handled by the engine.
pub mod quadratic;
