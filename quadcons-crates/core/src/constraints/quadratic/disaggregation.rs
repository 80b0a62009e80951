use log::debug;

use super::activity::term_contribution;
use super::activity::ActivityBounds;
use super::constraint::QuadraticConstraint;
use crate::basic_types::ConstraintOperationError;
use crate::engine::variables::VariableId;
use crate::engine::variables::VariableType;
use crate::engine::Domains;
use crate::math::Interval;

/// The result of splitting a constraint into the independent parts of its quadratic function.
#[derive(Clone, Debug)]
pub struct Disaggregation {
    /// The linear terms of the original constraint plus `s_k · z_k` for every part `k`, with the
    /// original sides.
    pub master: QuadraticConstraint,
    /// For every part `k` the constraint `quad_k(x) − s_k · z_k` compared against zero.
    pub parts: Vec<QuadraticConstraint>,
    /// The auxiliary variables `z_k`.
    pub auxiliary_variables: Vec<VariableId>,
}

impl QuadraticConstraint {
    /// Labels every quadratic variable term with the connected component of the graph whose
    /// edges are the bilinear terms; returns the labels and the number of components.
    pub fn quadratic_components(&self) -> (Vec<usize>, usize) {
        let mut labels = vec![usize::MAX; self.quad_var_terms.len()];
        let mut num_components = 0;
        for position in 0..self.quad_var_terms.len() {
            if labels[position] == usize::MAX {
                self.mark_component(position, num_components, &mut labels);
                num_components += 1;
            }
        }
        (labels, num_components)
    }

    fn mark_component(&self, position: usize, component: usize, labels: &mut [usize]) {
        labels[position] = component;
        let variable = self.quad_var_terms[position].variable;
        for &bilinear_position in &self.quad_var_terms[position].adjacent_bilinear {
            let other = self.bilinear_terms[bilinear_position].other(variable);
            let Some(other_position) = self.quad_var_position(other) else {
                continue;
            };
            if labels[other_position] == usize::MAX {
                self.mark_component(other_position, component, labels);
            }
        }
    }

    /// Splits a canonical constraint whose quadratic function consists of at least two
    /// independent parts.
    ///
    /// Every part `k` is moved into its own constraint with a new continuous variable `z_k`
    /// standing in for it in the master constraint. Returns `None` if there is at most one part
    /// or both sides are infinite.
    pub fn disaggregate(
        &self,
        domains: &mut Domains,
    ) -> Result<Option<Disaggregation>, ConstraintOperationError> {
        if !self.lhs.is_finite() && !self.rhs.is_finite() {
            return Ok(None);
        }
        let (labels, num_components) = self.quadratic_components();
        if num_components < 2 {
            return Ok(None);
        }

        // quad_k ≤ s_k · z_k suffices for a right-hand side, and ≥ for a left-hand side
        let part_lhs = if self.lhs.is_finite() {
            0.0
        } else {
            f64::NEG_INFINITY
        };
        let part_rhs = if self.rhs.is_finite() {
            0.0
        } else {
            f64::INFINITY
        };

        let mut master = QuadraticConstraint::new(self.lhs, self.rhs)?;
        for term in &self.linear_terms {
            master.add_linear(term.variable, term.coefficient)?;
        }

        let mut parts = Vec::with_capacity(num_components);
        let mut auxiliary_variables = Vec::with_capacity(num_components);
        for component in 0..num_components {
            let mut part = QuadraticConstraint::new(part_lhs, part_rhs)?;
            let mut new_positions = vec![usize::MAX; self.quad_var_terms.len()];
            let mut scale = 0.0_f64;
            let mut activity = ActivityBounds::default();

            for (position, term) in self.quad_var_terms.iter().enumerate() {
                if labels[position] != component {
                    continue;
                }
                new_positions[position] = part.add_quad_var(
                    term.variable,
                    term.linear_coefficient,
                    term.square_coefficient,
                )?;
                scale = scale
                    .max(term.linear_coefficient.abs())
                    .max(term.square_coefficient.abs());
                activity.add(term_contribution(
                    term,
                    &self.bilinear_terms,
                    domains,
                    None,
                ));
            }
            for bilinear in &self.bilinear_terms {
                let (Some(position1), Some(position2)) = (
                    self.quad_var_position(bilinear.var1),
                    self.quad_var_position(bilinear.var2),
                ) else {
                    continue;
                };
                if labels[position1] != component {
                    continue;
                }
                let _ = part.add_bilinear(
                    new_positions[position1],
                    new_positions[position2],
                    bilinear.coefficient,
                )?;
                scale = scale.max(bilinear.coefficient.abs());
            }

            if scale == 0.0 {
                scale = 1.0;
            }
            let bounds = activity.interval().div(Interval::point(scale));
            let auxiliary = domains.new_variable(
                bounds.lower(),
                bounds.upper(),
                VariableType::Continuous,
            );

            part.add_linear(auxiliary, -scale)?;
            master.add_linear(auxiliary, scale)?;
            parts.push(part);
            auxiliary_variables.push(auxiliary);
        }

        debug!("Disaggregated {self} into {num_components} parts");
        Ok(Some(Disaggregation {
            master,
            parts,
            auxiliary_variables,
        }))
    }
}
