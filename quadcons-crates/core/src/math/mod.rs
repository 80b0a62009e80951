//! Interval arithmetic with outward rounding, used by every bound computation of the engine.
mod interval;
pub mod rounding;

pub use interval::Interval;
