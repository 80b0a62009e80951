use std::fmt::Debug;
use std::fmt::Display;

use itertools::Itertools;
use log::debug;

use super::constraint::QuadraticConstraint;
use super::terms::LinearTerm;
use crate::engine::Domains;
use crate::engine::QuadraticOptions;

/// A linear constraint `lhs ≤ Σ terms ≤ rhs`, handed to the host to be handled by its linear
/// constraint machinery.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearConstraint {
    pub terms: Vec<LinearTerm>,
    pub lhs: f64,
    pub rhs: f64,
}

impl Display for LinearConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.lhs.is_finite() {
            write!(f, "{} <= ", self.lhs)?;
        }
        if self.terms.is_empty() {
            write!(f, "0")?;
        } else {
            write!(f, "{}", self.terms.iter().join(" + "))?;
        }
        if self.rhs.is_finite() {
            write!(f, " <= {}", self.rhs)?;
        }
        Ok(())
    }
}

/// A constraint which takes the place of an upgraded quadratic constraint.
#[derive(Clone, Debug)]
pub enum Replacement {
    Linear(LinearConstraint),
    Quadratic(QuadraticConstraint),
}

/// A strategy which replaces a quadratic constraint by constraints which are handled better.
pub trait ConstraintUpgrade: Debug {
    fn name(&self) -> &str;

    /// Upgrades with a higher priority are tried first.
    fn priority(&self) -> i32;

    /// Returns the replacements of `constraint`, or `None` if the upgrade does not apply. New
    /// variables which the replacements need are created in `domains`.
    fn try_upgrade(
        &self,
        constraint: &QuadraticConstraint,
        domains: &mut Domains,
        options: &QuadraticOptions,
    ) -> Option<Vec<Replacement>>;
}

/// Replaces constraints without quadratic part by linear constraints.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinearUpgrade;

impl ConstraintUpgrade for LinearUpgrade {
    fn name(&self) -> &str {
        "linear"
    }

    fn priority(&self) -> i32 {
        100
    }

    fn try_upgrade(
        &self,
        constraint: &QuadraticConstraint,
        _domains: &mut Domains,
        _options: &QuadraticOptions,
    ) -> Option<Vec<Replacement>> {
        if constraint.has_quadratic_part() {
            return None;
        }

        let terms = constraint
            .linear_terms()
            .iter()
            .copied()
            .chain(constraint.quad_var_terms().iter().map(|term| LinearTerm {
                variable: term.variable,
                coefficient: term.linear_coefficient,
            }))
            .filter(|term| term.coefficient != 0.0)
            .collect();

        Some(vec![Replacement::Linear(LinearConstraint {
            terms,
            lhs: constraint.lhs(),
            rhs: constraint.rhs(),
        })])
    }
}

/// Splits constraints whose quadratic function consists of independent parts, if enabled by
/// [`QuadraticOptions::disaggregate`].
#[derive(Clone, Copy, Debug, Default)]
pub struct DisaggregationUpgrade;

impl ConstraintUpgrade for DisaggregationUpgrade {
    fn name(&self) -> &str {
        "disaggregation"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn try_upgrade(
        &self,
        constraint: &QuadraticConstraint,
        domains: &mut Domains,
        options: &QuadraticOptions,
    ) -> Option<Vec<Replacement>> {
        if !options.disaggregate {
            return None;
        }

        match constraint.disaggregate(domains) {
            Ok(disaggregation) => disaggregation.map(|disaggregation| {
                std::iter::once(disaggregation.master)
                    .chain(disaggregation.parts)
                    .map(Replacement::Quadratic)
                    .collect()
            }),
            Err(error) => {
                debug!("Could not disaggregate {constraint}: {error}");
                None
            }
        }
    }
}

/// The upgrades which are tried on every constraint during presolve, in order of descending
/// priority.
#[derive(Debug)]
pub struct UpgradeRegistry {
    upgrades: Vec<Box<dyn ConstraintUpgrade>>,
}

impl Default for UpgradeRegistry {
    fn default() -> Self {
        UpgradeRegistry::new(vec![
            Box::new(LinearUpgrade),
            Box::new(DisaggregationUpgrade),
        ])
    }
}

impl UpgradeRegistry {
    pub fn new(mut upgrades: Vec<Box<dyn ConstraintUpgrade>>) -> UpgradeRegistry {
        upgrades.sort_by_key(|upgrade| std::cmp::Reverse(upgrade.priority()));
        UpgradeRegistry { upgrades }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.upgrades.iter().map(|upgrade| upgrade.name())
    }

    /// Applies the first upgrade which accepts `constraint`; returns its name and the
    /// replacements.
    pub fn try_upgrade(
        &self,
        constraint: &QuadraticConstraint,
        domains: &mut Domains,
        options: &QuadraticOptions,
    ) -> Option<(&str, Vec<Replacement>)> {
        self.upgrades.iter().find_map(|upgrade| {
            upgrade
                .try_upgrade(constraint, domains, options)
                .map(|replacements| (upgrade.name(), replacements))
        })
    }
}
