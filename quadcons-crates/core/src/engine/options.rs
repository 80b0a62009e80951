use crate::engine::domains::DEFAULT_INFINITY;

/// Options which determine the numerical tolerances and the behaviour of the
/// [`QuadraticEngine`](crate::engine::QuadraticEngine).
#[derive(Debug, Copy, Clone)]
pub struct QuadraticOptions {
    /// Values with at least this magnitude are considered infinite.
    pub infinity: f64,
    /// Coefficients with at most this magnitude are considered zero.
    pub epsilon: f64,
    /// The absolute violation up to which a constraint is considered satisfied.
    pub feasibility_tolerance: f64,
    /// Eigenvalues with at most this magnitude are considered zero when classifying curvature.
    pub curvature_tolerance: f64,
    /// Determines how much effort is spent on classifying the curvature of constraints.
    pub curvature_check: CurvatureCheck,
    /// The maximum number of rounds over all constraints in a single call to propagate.
    pub max_propagation_rounds: usize,
    /// A tightened bound is only applied if it improves the old bound by at least this fraction
    /// of the domain width (or of the bound magnitude for half-unbounded domains).
    pub min_bound_improvement: f64,
    /// Cuts whose ratio between the largest and smallest absolute coefficient exceeds this value
    /// are discarded as numerically unstable.
    pub cut_max_range: f64,
    /// Cuts whose efficacy, the violation divided by the norm, is below this value are discarded.
    pub min_cut_efficacy: f64,
    /// The bound imposed on unbounded variables in nonconvex quadratic terms when solving starts.
    pub default_bound: f64,
    /// Whether constraints consisting of independent quadratic parts are split during presolve.
    pub disaggregate: bool,
}

impl Default for QuadraticOptions {
    fn default() -> Self {
        Self {
            infinity: DEFAULT_INFINITY,
            epsilon: 1e-9,
            feasibility_tolerance: 1e-6,
            curvature_tolerance: 1e-6,
            curvature_check: CurvatureCheck::default(),
            max_propagation_rounds: 10,
            min_bound_improvement: 0.05,
            cut_max_range: 1e7,
            min_cut_efficacy: 1e-4,
            default_bound: 1e15,
            disaggregate: false,
        }
    }
}

/// The methods which may be used to decide whether a constraint is convex or concave.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum CurvatureCheck {
    /// Use the structural tests and fall back on the eigenvalue oracle.
    #[default]
    Full,
    /// Only use the structural tests; forms which would need the eigenvalue oracle are
    /// classified as indefinite.
    Cheap,
    /// Classify every constraint with a quadratic part as indefinite.
    AssumeIndefinite,
}
