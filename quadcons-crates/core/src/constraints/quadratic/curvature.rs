use std::fmt::Debug;
use std::fmt::Display;

use log::debug;
use log::warn;

use super::constraint::QuadraticConstraint;
use super::constraint::Side;
use crate::containers::HashMap;
use crate::engine::CurvatureCheck;
use crate::engine::variables::VariableId;
use crate::engine::QuadraticOptions;

/// The curvature of the function of a quadratic constraint.
///
/// A function which is neither convex nor concave is indefinite; a function with an empty
/// quadratic part is both.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Curvature {
    pub convex: bool,
    pub concave: bool,
}

impl Curvature {
    pub const LINEAR: Curvature = Curvature {
        convex: true,
        concave: true,
    };
    pub const INDEFINITE: Curvature = Curvature {
        convex: false,
        concave: false,
    };

    pub fn is_indefinite(&self) -> bool {
        !self.convex && !self.concave
    }

    /// Whether `side` describes a convex set, i.e. the rhs of a convex or the lhs of a concave
    /// function.
    pub fn is_convex_side(&self, side: Side) -> bool {
        match side {
            Side::Rhs => self.convex,
            Side::Lhs => self.concave,
        }
    }
}

impl Display for Curvature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.convex, self.concave) {
            (true, true) => write!(f, "linear"),
            (true, false) => write!(f, "convex"),
            (false, true) => write!(f, "concave"),
            (false, false) => write!(f, "indefinite"),
        }
    }
}

/// Computes the extreme eigenvalues of a symmetric matrix.
pub trait EigenvalueOracle: Debug {
    /// Returns the smallest and the largest eigenvalue of the `dimension × dimension` symmetric
    /// matrix stored row-major in `matrix`, or `None` if they cannot be computed.
    fn extreme_eigenvalues(&self, matrix: &[f64], dimension: usize) -> Option<(f64, f64)>;
}

/// An oracle which never computes eigenvalues; every form which needs them is indefinite.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoEigenvalueOracle;

impl EigenvalueOracle for NoEigenvalueOracle {
    fn extreme_eigenvalues(&self, _matrix: &[f64], _dimension: usize) -> Option<(f64, f64)> {
        None
    }
}

/// Computes eigenvalues with the symmetric eigendecomposition of nalgebra.
#[cfg(feature = "eigen")]
#[derive(Clone, Copy, Debug)]
pub struct NalgebraEigenvalueOracle {
    pub epsilon: f64,
    pub max_iterations: usize,
}

#[cfg(feature = "eigen")]
impl Default for NalgebraEigenvalueOracle {
    fn default() -> Self {
        NalgebraEigenvalueOracle {
            epsilon: f64::EPSILON,
            max_iterations: 1000,
        }
    }
}

#[cfg(feature = "eigen")]
impl EigenvalueOracle for NalgebraEigenvalueOracle {
    fn extreme_eigenvalues(&self, matrix: &[f64], dimension: usize) -> Option<(f64, f64)> {
        use nalgebra::linalg::SymmetricEigen;
        use nalgebra::DMatrix;

        if matrix.len() != dimension * dimension || matrix.iter().any(|value| !value.is_finite())
        {
            return None;
        }

        let matrix = DMatrix::from_row_slice(dimension, dimension, matrix);
        let eigen = SymmetricEigen::try_new(matrix, self.epsilon, self.max_iterations)?;

        let min = eigen
            .eigenvalues
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min);
        let max = eigen
            .eigenvalues
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        (min.is_finite() && max.is_finite()).then_some((min, max))
    }
}

impl QuadraticConstraint {
    /// Classifies the curvature of the constraint function; the result is memoised until the
    /// next structural edit.
    pub fn check_curvature(
        &mut self,
        oracle: &dyn EigenvalueOracle,
        options: &QuadraticOptions,
    ) -> Curvature {
        if let Some(curvature) = self.curvature {
            return curvature;
        }

        let curvature = self.analyse_curvature(oracle, options);
        debug!("Classified {self} as {curvature}");
        self.curvature = Some(curvature);
        curvature
    }

    fn analyse_curvature(
        &mut self,
        oracle: &dyn EigenvalueOracle,
        options: &QuadraticOptions,
    ) -> Curvature {
        // Duplicate quadratic variable terms are summed, the form is the same.
        let mut index_of: HashMap<VariableId, usize> = HashMap::default();
        let mut diagonal = Vec::new();
        for term in &self.quad_var_terms {
            let index = *index_of.entry(term.variable).or_insert_with(|| {
                diagonal.push(0.0);
                diagonal.len() - 1
            });
            diagonal[index] += term.square_coefficient;
        }

        let has_bilinear = self
            .bilinear_terms
            .iter()
            .any(|bilinear| bilinear.coefficient != 0.0);

        if diagonal.iter().all(|&a| a == 0.0) && !has_bilinear {
            return Curvature::LINEAR;
        }
        if options.curvature_check == CurvatureCheck::AssumeIndefinite {
            return Curvature::INDEFINITE;
        }
        if !has_bilinear {
            return Curvature {
                convex: diagonal.iter().all(|&a| a >= 0.0),
                concave: diagonal.iter().all(|&a| a <= 0.0),
            };
        }

        // A negative diagonal entry excludes convexity, a positive one concavity.
        let may_be_convex = diagonal.iter().all(|&a| a >= 0.0);
        let may_be_concave = diagonal.iter().all(|&a| a <= 0.0);
        if !may_be_convex && !may_be_concave {
            return Curvature::INDEFINITE;
        }

        // A zero diagonal entry in a row with a nonzero off-diagonal entry makes the form
        // indefinite.
        let zero_diagonal_with_neighbour = self.bilinear_terms.iter().any(|bilinear| {
            bilinear.coefficient != 0.0
                && [bilinear.var1, bilinear.var2]
                    .iter()
                    .any(|variable| index_of.get(variable).map(|&i| diagonal[i]) == Some(0.0))
        });
        if zero_diagonal_with_neighbour {
            return Curvature::INDEFINITE;
        }

        if diagonal.len() == 2 && self.bilinear_terms.len() == 1 {
            // [[a, c/2], [c/2, b]] is semidefinite iff 4ab ≥ c²
            let c = self.bilinear_terms[0].coefficient;
            let is_semidefinite = 4.0 * diagonal[0] * diagonal[1] >= c * c;
            return Curvature {
                convex: may_be_convex && is_semidefinite,
                concave: may_be_concave && is_semidefinite,
            };
        }

        if options.curvature_check == CurvatureCheck::Cheap {
            return Curvature::INDEFINITE;
        }

        let dimension = diagonal.len();
        let mut matrix = vec![0.0; dimension * dimension];
        for (index, &a) in diagonal.iter().enumerate() {
            matrix[index * dimension + index] = a;
        }
        for bilinear in &self.bilinear_terms {
            let (Some(&i), Some(&j)) = (index_of.get(&bilinear.var1), index_of.get(&bilinear.var2))
            else {
                continue;
            };
            matrix[i * dimension + j] += bilinear.coefficient / 2.0;
            matrix[j * dimension + i] += bilinear.coefficient / 2.0;
        }

        self.statistics.oracle_calls += 1;
        match oracle.extreme_eigenvalues(&matrix, dimension) {
            Some((min, max)) => Curvature {
                convex: may_be_convex && min >= -options.curvature_tolerance,
                concave: may_be_concave && max <= options.curvature_tolerance,
            },
            None => {
                warn!("No eigenvalues available for a {dimension}x{dimension} form, assuming it is indefinite");
                Curvature::INDEFINITE
            }
        }
    }
}
