use itertools::Itertools;
use log::trace;

use super::constraint::QuadraticConstraint;
use super::terms::BilinearTerm;
use super::terms::LinearTerm;
use super::terms::QuadVarTerm;
use crate::basic_types::ConstraintOperationError;
use crate::containers::HashMap;
use crate::containers::HashSet;
use crate::engine::Domains;
use crate::quadcons_assert_moderate;

impl QuadraticConstraint {
    /// Brings the terms into canonical form.
    ///
    /// Terms of every kind are sorted by variable and duplicates are summed; coefficients with
    /// magnitude at most `epsilon` are dropped. For binary variables `x² = x`, so their square
    /// coefficient is moved into the linear coefficient. Quadratic variable terms which are left
    /// without square coefficient and bilinear terms become linear terms.
    pub fn merge_and_clean(&mut self, domains: &Domains, epsilon: f64) {
        let is_tiny = |coefficient: f64| coefficient.abs() <= epsilon;

        // variable -> (linear coefficient, square coefficient)
        let mut quadratic: HashMap<_, (f64, f64)> = HashMap::default();
        for term in &self.quad_var_terms {
            let entry = quadratic.entry(term.variable).or_default();
            entry.0 += term.linear_coefficient;
            entry.1 += term.square_coefficient;
        }

        let bilinear_terms = self
            .bilinear_terms
            .iter()
            .map(|term| BilinearTerm::new(term.var1, term.var2, term.coefficient))
            .sorted_by_key(|term| (term.var1, term.var2))
            .coalesce(|a, b| {
                if (a.var1, a.var2) == (b.var1, b.var2) {
                    Ok(BilinearTerm {
                        coefficient: a.coefficient + b.coefficient,
                        ..a
                    })
                } else {
                    Err((a, b))
                }
            })
            .filter(|term| !is_tiny(term.coefficient))
            .collect::<Vec<_>>();

        let mut linear: HashMap<_, f64> = HashMap::default();
        for term in &self.linear_terms {
            *linear.entry(term.variable).or_default() += term.coefficient;
        }

        for (variable, (linear_coefficient, square_coefficient)) in quadratic.iter_mut() {
            if domains.is_binary(*variable) && *square_coefficient != 0.0 {
                trace!("Folding the square of binary {variable} into its linear term");
                *linear_coefficient += *square_coefficient;
                *square_coefficient = 0.0;
            }
            if is_tiny(*square_coefficient) {
                *square_coefficient = 0.0;
            }
            // A linear term of a quadratic variable belongs to its quadratic variable term.
            if let Some(coefficient) = linear.remove(variable) {
                *linear_coefficient += coefficient;
            }
        }
        for term in &bilinear_terms {
            for variable in [term.var1, term.var2] {
                if let Some(coefficient) = linear.remove(&variable) {
                    quadratic.entry(variable).or_default().0 += coefficient;
                } else {
                    let _ = quadratic.entry(variable).or_default();
                }
            }
        }

        let bilinear_variables = bilinear_terms
            .iter()
            .flat_map(|term| [term.var1, term.var2])
            .collect::<HashSet<_>>();
        let mut quad_var_terms = Vec::new();
        for (variable, (linear_coefficient, square_coefficient)) in quadratic {
            let linear_coefficient = if is_tiny(linear_coefficient) {
                0.0
            } else {
                linear_coefficient
            };
            if square_coefficient == 0.0 && !bilinear_variables.contains(&variable) {
                if linear_coefficient != 0.0 {
                    let _ = linear.insert(variable, linear_coefficient);
                }
            } else {
                quad_var_terms.push(QuadVarTerm::new(
                    variable,
                    linear_coefficient,
                    square_coefficient,
                ));
            }
        }
        quad_var_terms.sort_by_key(|term| term.variable);

        let linear_terms = linear
            .into_iter()
            .filter(|(_, coefficient)| !is_tiny(*coefficient))
            .map(|(variable, coefficient)| LinearTerm {
                variable,
                coefficient,
            })
            .sorted_by_key(|term| term.variable)
            .collect::<Vec<_>>();

        for (position, term) in bilinear_terms.iter().enumerate() {
            for variable in [term.var1, term.var2] {
                if let Ok(index) =
                    quad_var_terms.binary_search_by_key(&variable, |term| term.variable)
                {
                    quad_var_terms[index].adjacent_bilinear.push(position);
                }
            }
        }

        self.linear_terms = linear_terms;
        self.quad_var_terms = quad_var_terms;
        self.bilinear_terms = bilinear_terms;
        self.rebuild_occurrences();
        self.linear_activity.invalidate();
        self.quadratic_activity.mark_stale();
        self.on_structural_edit();
        self.is_canonical = true;

        quadcons_assert_moderate!(self.adjacency_is_consistent());
    }

    /// Replaces every fixed variable by its value; returns the number of replaced terms.
    pub fn substitute_fixed_variables(
        &mut self,
        domains: &Domains,
    ) -> Result<usize, ConstraintOperationError> {
        let mut num_substituted = 0;

        while let Some(position) = self
            .quad_var_terms
            .iter()
            .position(|term| domains.is_fixed(term.variable))
        {
            let variable = self.quad_var_terms[position].variable;
            let value = domains.lower_bound(variable);
            self.replace_quad_var(position, None, 0.0, value)?;
            num_substituted += 1;
        }

        while let Some(position) = self
            .linear_terms
            .iter()
            .position(|term| domains.is_fixed(term.variable))
        {
            let value = domains.lower_bound(self.linear_terms[position].variable);
            self.replace_linear_var(position, None, 0.0, value)?;
            num_substituted += 1;
        }

        Ok(num_substituted)
    }
}
