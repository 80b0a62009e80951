use enumset::enum_set;
use enumset::EnumSet;
use log::debug;

use super::notifications::BoundEvent;
use super::notifications::WatchList;
use super::ConstraintId;
use super::Domains;
use super::QuadraticOptions;
use crate::basic_types::ConstraintOperationError;
use crate::basic_types::PropagationStatus;
use crate::basic_types::Solution;
use crate::constraints::quadratic::ConstraintStatistics;
use crate::constraints::quadratic::ConstraintUpgrade;
use crate::constraints::quadratic::DisaggregationUpgrade;
use crate::constraints::quadratic::EigenvalueOracle;
use crate::constraints::quadratic::LinearConstraint;
use crate::constraints::quadratic::LinearCut;
#[cfg(feature = "eigen")]
use crate::constraints::quadratic::NalgebraEigenvalueOracle;
#[cfg(not(feature = "eigen"))]
use crate::constraints::quadratic::NoEigenvalueOracle;
use crate::constraints::quadratic::QuadraticConstraint;
use crate::constraints::quadratic::Replacement;
use crate::constraints::quadratic::TermPosition;
use crate::constraints::quadratic::UpgradeRegistry;
use crate::containers::KeyedVec;
use crate::create_statistics_struct;
use crate::engine::variables::VariableId;
use crate::math::Interval;
use crate::print_quadcons_assert_warning_message;
use crate::quadcons_assert_simple;
use crate::statistics::log_statistic_postfix;
use crate::statistics::should_log_statistics;
use crate::statistics::Statistic;
use crate::statistics::StatisticLogger;

/// The bound events on which a constraint is notified.
const WATCHED_EVENTS: EnumSet<BoundEvent> = enum_set!(BoundEvent::LowerBound | BoundEvent::UpperBound);

create_statistics_struct!(
    /// Counters of the work done by the [`QuadraticEngine`].
    EngineStatistics {
        propagation_rounds: usize,
        bound_tightenings: usize,
        cutoffs: usize,
        separation_rounds: usize,
        substitutions: usize,
        upgrades: usize,
        disaggregations: usize,
        default_bounds: usize,
});

/// What a call to [`QuadraticEngine::propagate`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PropagationOutcome {
    pub num_rounds: usize,
    pub num_tightenings: usize,
}

/// What a call to [`QuadraticEngine::presolve`] did.
#[derive(Clone, Debug, Default)]
pub struct PresolveOutcome {
    /// Linear constraints which replace upgraded quadratic constraints; the host has to add them.
    pub linear_constraints: Vec<LinearConstraint>,
    /// Constraints which were removed by an upgrade.
    pub removed: Vec<ConstraintId>,
    /// Constraints which were created by an upgrade.
    pub added: Vec<ConstraintId>,
    /// The number of terms in which a fixed variable was replaced by its value.
    pub num_substitutions: usize,
}

/// Owns the quadratic constraints of a problem and drives the reasoning on them.
///
/// The variables live in the [`Domains`] of the host, which is passed into every operation. Bound
/// changes made by the host are picked up from the event stream of the [`Domains`], and the
/// constraints watching the changed variables are brought up to date before they are used.
#[derive(Debug)]
pub struct QuadraticEngine {
    constraints: KeyedVec<ConstraintId, Option<QuadraticConstraint>>,
    watch_list: WatchList,
    options: QuadraticOptions,
    upgrades: UpgradeRegistry,
    oracle: Box<dyn EigenvalueOracle>,
    statistics: EngineStatistics,
}

impl Default for QuadraticEngine {
    fn default() -> Self {
        QuadraticEngine::new(QuadraticOptions::default())
    }
}

impl QuadraticEngine {
    pub fn new(options: QuadraticOptions) -> QuadraticEngine {
        QuadraticEngine::with_upgrades(options, UpgradeRegistry::default())
    }

    pub fn with_upgrades(options: QuadraticOptions, upgrades: UpgradeRegistry) -> QuadraticEngine {
        print_quadcons_assert_warning_message!();

        QuadraticEngine {
            constraints: KeyedVec::default(),
            watch_list: WatchList::default(),
            options,
            upgrades,
            oracle: default_oracle(),
            statistics: EngineStatistics::default(),
        }
    }

    /// Replaces the oracle which is used to classify the curvature of constraints.
    pub fn with_oracle(mut self, oracle: Box<dyn EigenvalueOracle>) -> QuadraticEngine {
        self.oracle = oracle;
        self
    }

    pub fn options(&self) -> &QuadraticOptions {
        &self.options
    }

    pub fn statistics(&self) -> &EngineStatistics {
        &self.statistics
    }

    /// Adds `constraint` to the engine; its sides are normalised against the infinity threshold
    /// and its terms are brought into canonical form.
    pub fn add_constraint(
        &mut self,
        mut constraint: QuadraticConstraint,
        domains: &Domains,
    ) -> ConstraintId {
        constraint.normalise_sides(self.options.infinity);
        constraint.merge_and_clean(domains, self.options.epsilon);

        let id = self.constraints.push(None);
        for variable in constraint.variables() {
            self.watch_list.watch(variable, WATCHED_EVENTS, id);
        }
        debug!("Added {id}: {constraint}");
        self.constraints[id] = Some(constraint);
        id
    }

    /// Removes the constraint `id` and all of its watches; returns the constraint if it existed.
    pub fn delete_constraint(&mut self, id: ConstraintId) -> Option<QuadraticConstraint> {
        let constraint = self.constraints.get_mut(id)?.take()?;
        for variable in constraint.variables() {
            self.watch_list.unwatch(variable, id);
        }
        Some(constraint)
    }

    pub fn constraint(&self, id: ConstraintId) -> Option<&QuadraticConstraint> {
        self.constraints.get(id).and_then(Option::as_ref)
    }

    /// Returns the constraints which have not been deleted.
    pub fn constraints(&self) -> impl Iterator<Item = (ConstraintId, &QuadraticConstraint)> + '_ {
        self.constraints
            .keys()
            .zip(self.constraints.iter())
            .filter_map(|(id, constraint)| constraint.as_ref().map(|constraint| (id, constraint)))
    }

    /// Returns an enclosure of the values of the function of constraint `id` under the current
    /// bounds.
    pub fn activity(&mut self, id: ConstraintId, domains: &mut Domains) -> Option<Interval> {
        self.notify_bound_changes(domains);
        self.constraints
            .get_mut(id)?
            .as_mut()
            .map(|constraint| constraint.activity(domains))
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints().count()
    }

    fn live_ids(&self) -> Vec<ConstraintId> {
        self.constraints().map(|(id, _)| id).collect()
    }
}

// propagation
impl QuadraticEngine {
    /// Forwards the bound changes recorded in `domains` since the last call to the constraints
    /// watching the changed variables.
    pub fn notify_bound_changes(&mut self, domains: &mut Domains) {
        let events = domains.drain_events().collect::<Vec<_>>();
        for (event, variable) in events {
            for &id in self.watch_list.get_affected_constraints(event, variable) {
                if let Some(constraint) = self.constraints[id].as_mut() {
                    constraint.notify_bound_change(variable, domains);
                }
            }
        }
    }

    /// Propagates the constraints which changed since they were last propagated, until no bound
    /// changes anymore or [`QuadraticOptions::max_propagation_rounds`] is reached.
    pub fn propagate(&mut self, domains: &mut Domains) -> PropagationStatus<PropagationOutcome> {
        self.notify_bound_changes(domains);

        let mut outcome = PropagationOutcome::default();
        while outcome.num_rounds < self.options.max_propagation_rounds {
            outcome.num_rounds += 1;
            self.statistics.propagation_rounds += 1;

            let mut num_tightenings = 0;
            for id in self.live_ids() {
                if self.constraints[id]
                    .as_ref()
                    .is_some_and(QuadraticConstraint::is_propagated)
                {
                    continue;
                }
                num_tightenings += self.propagate_constraint(id, domains)?;
            }

            outcome.num_tightenings += num_tightenings;
            if num_tightenings == 0 {
                break;
            }
        }

        Ok(outcome)
    }

    /// Propagates the single constraint `id`.
    pub fn propagate_constraint(
        &mut self,
        id: ConstraintId,
        domains: &mut Domains,
    ) -> PropagationStatus<usize> {
        self.notify_bound_changes(domains);

        let Some(constraint) = self.constraints.get_mut(id).and_then(Option::as_mut) else {
            return Ok(0);
        };
        match constraint.propagate(domains, &self.options) {
            Ok(num_tightenings) => {
                self.statistics.bound_tightenings += num_tightenings;
                self.notify_bound_changes(domains);
                Ok(num_tightenings)
            }
            Err(infeasible) => {
                debug!("{id} is infeasible: {infeasible:?}");
                self.statistics.cutoffs += 1;
                Err(infeasible)
            }
        }
    }
}

// separation, presolve and solving
impl QuadraticEngine {
    /// Generates a cut for every constraint which `solution` violates beyond the feasibility
    /// tolerance, where possible.
    pub fn separate(
        &mut self,
        domains: &mut Domains,
        solution: &Solution,
    ) -> Vec<(ConstraintId, LinearCut)> {
        self.notify_bound_changes(domains);
        self.statistics.separation_rounds += 1;

        let mut cuts = Vec::new();
        for id in self.live_ids() {
            let Some(constraint) = self.constraints[id].as_mut() else {
                continue;
            };
            let Some(side) =
                constraint.violated_side(solution, self.options.feasibility_tolerance)
            else {
                continue;
            };

            let curvature = constraint.check_curvature(self.oracle.as_ref(), &self.options);
            if let Some(cut) =
                constraint.generate_cut(domains, solution, side, curvature, &self.options)
            {
                cuts.push((id, cut));
            }
        }
        cuts
    }

    /// Simplifies the constraints: fixed variables are replaced by their values, the terms are
    /// brought into canonical form and the registered upgrades are applied.
    ///
    /// If a fixed variable cannot be substituted, the constraint in which this happened is
    /// restored and the error is returned; constraints presolved before it keep their changes.
    pub fn presolve(
        &mut self,
        domains: &mut Domains,
    ) -> Result<PresolveOutcome, ConstraintOperationError> {
        self.notify_bound_changes(domains);

        let mut outcome = PresolveOutcome::default();
        let mut worklist = self.live_ids();
        while let Some(id) = worklist.pop() {
            let Some(mut constraint) = self.delete_constraint(id) else {
                continue;
            };

            let original = constraint.clone();
            match constraint.substitute_fixed_variables(domains) {
                Ok(num_substitutions) => outcome.num_substitutions += num_substitutions,
                Err(error) => {
                    debug!("Could not substitute fixed variables in {id}: {error}");
                    self.reinsert(id, original);
                    self.statistics.substitutions += outcome.num_substitutions;
                    return Err(error);
                }
            }
            constraint.merge_and_clean(domains, self.options.epsilon);

            let Some((name, replacements)) =
                self.upgrades
                    .try_upgrade(&constraint, domains, &self.options)
            else {
                self.reinsert(id, constraint);
                continue;
            };

            debug!("Upgraded {id} by {name} into {} constraints", replacements.len());
            self.statistics.upgrades += 1;
            if name == DisaggregationUpgrade.name() {
                self.statistics.disaggregations += 1;
            }
            outcome.removed.push(id);

            for replacement in replacements {
                match replacement {
                    Replacement::Linear(linear) => outcome.linear_constraints.push(linear),
                    Replacement::Quadratic(quadratic) => {
                        let new_id = self.add_constraint(quadratic, domains);
                        outcome.added.push(new_id);
                        worklist.push(new_id);
                    }
                }
            }
        }

        self.statistics.substitutions += outcome.num_substitutions;
        // Constraints which were added and upgraded again within this call are not reported.
        let transient = outcome
            .added
            .iter()
            .filter(|id| outcome.removed.contains(id))
            .copied()
            .collect::<Vec<_>>();
        outcome.added.retain(|id| !transient.contains(id));
        outcome.removed.retain(|id| !transient.contains(id));
        Ok(outcome)
    }

    /// Puts a constraint back under its previous identifier after it was edited.
    fn reinsert(&mut self, id: ConstraintId, constraint: QuadraticConstraint) {
        quadcons_assert_simple!(self.constraints[id].is_none());
        for variable in constraint.variables() {
            self.watch_list.watch(variable, WATCHED_EVENTS, id);
        }
        self.constraints[id] = Some(constraint);
    }

    /// Substitutes `variable ← coefficient · replacement + offset` in every constraint, or
    /// `variable ← offset` if `replacement` is `None`.
    ///
    /// The edited constraints are no longer canonical until the next [`QuadraticEngine::presolve`].
    pub fn substitute_variable(
        &mut self,
        variable: VariableId,
        replacement: Option<VariableId>,
        coefficient: f64,
        offset: f64,
    ) -> Result<(), ConstraintOperationError> {
        quadcons_assert_simple!(
            replacement != Some(variable),
            "A variable cannot be substituted by itself"
        );

        for id in self.live_ids() {
            let Some(constraint) = self.constraints[id].as_mut() else {
                continue;
            };
            if constraint.term_positions(variable).is_empty() {
                continue;
            }

            while let Some(&position) = constraint.term_positions(variable).first() {
                match position {
                    TermPosition::Linear(index) => {
                        constraint.replace_linear_var(index, replacement, coefficient, offset)?
                    }
                    TermPosition::Quadratic(index) => {
                        constraint.replace_quad_var(index, replacement, coefficient, offset)?
                    }
                }
                self.statistics.substitutions += 1;
            }

            self.watch_list.unwatch(variable, id);
            if let Some(replacement) = replacement.filter(|_| coefficient != 0.0) {
                self.watch_list.watch(replacement, WATCHED_EVENTS, id);
            }
        }
        Ok(())
    }

    /// Prepares the constraints for the search: classifies their curvature and bounds the
    /// variables of quadratic terms on nonconvex sides by
    /// [`QuadraticOptions::default_bound`].
    pub fn initialise_solve(&mut self, domains: &mut Domains) -> PropagationStatus {
        self.notify_bound_changes(domains);

        for id in self.live_ids() {
            let Some(constraint) = self.constraints[id].as_mut() else {
                continue;
            };
            let curvature = constraint.check_curvature(self.oracle.as_ref(), &self.options);
            self.statistics.default_bounds += constraint.impose_default_bounds(
                domains,
                curvature,
                self.options.default_bound,
            )?;
        }

        self.notify_bound_changes(domains);
        Ok(())
    }

    /// Returns the constraints which `solution` violates beyond the feasibility tolerance,
    /// together with their violation.
    pub fn check(&self, solution: &Solution) -> Vec<(ConstraintId, f64)> {
        self.constraints()
            .map(|(id, constraint)| (id, constraint.violation(solution)))
            .filter(|(_, violation)| *violation > self.options.feasibility_tolerance)
            .collect()
    }

    /// Logs the statistics of the engine and the summed statistics of its constraints.
    pub fn log_statistics(&self) {
        if !should_log_statistics() {
            return;
        }

        let logger = StatisticLogger::new("quadratic");
        self.statistics.log(logger.attach_to_prefix("engine"));

        let mut summed = ConstraintStatistics::default();
        for (_, constraint) in self.constraints() {
            let statistics = constraint.statistics();
            summed.activity_recomputations += statistics.activity_recomputations;
            summed.bound_tightenings += statistics.bound_tightenings;
            summed.propagation_calls += statistics.propagation_calls;
            summed.oracle_calls += statistics.oracle_calls;
            summed.cuts_generated += statistics.cuts_generated;
            summed.cuts_rejected += statistics.cuts_rejected;
        }
        summed.log(logger.attach_to_prefix("constraints"));
        log_statistic_postfix();
    }
}

fn default_oracle() -> Box<dyn EigenvalueOracle> {
    #[cfg(feature = "eigen")]
    {
        Box::new(NalgebraEigenvalueOracle::default())
    }
    #[cfg(not(feature = "eigen"))]
    {
        Box::new(NoEigenvalueOracle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic_types::Infeasible;
    use crate::constraints::quadratic::NoEigenvalueOracle;
    use crate::engine::variables::VariableType;

    fn continuous(domains: &mut Domains, lower_bound: f64, upper_bound: f64) -> VariableId {
        domains.new_variable(lower_bound, upper_bound, VariableType::Continuous)
    }

    fn engine() -> QuadraticEngine {
        QuadraticEngine::default().with_oracle(Box::new(NoEigenvalueOracle))
    }

    #[test]
    fn deleted_constraints_are_no_longer_watched() {
        let mut domains = Domains::default();
        let x = continuous(&mut domains, 0.0, 1.0);
        let y = continuous(&mut domains, 0.0, 1.0);
        let mut constraint = QuadraticConstraint::new(f64::NEG_INFINITY, 1.0).unwrap();
        constraint.add_product(x, y, 1.0).unwrap();
        let mut engine = engine();

        let id = engine.add_constraint(constraint, &domains);
        assert!(engine.watch_list.is_watched(x));
        assert_eq!(engine.num_constraints(), 1);

        assert!(engine.delete_constraint(id).is_some());
        assert!(!engine.watch_list.is_watched(x));
        assert!(!engine.watch_list.is_watched(y));
        assert!(engine.constraint(id).is_none());
        assert!(engine.delete_constraint(id).is_none());
    }

    #[test]
    fn products_are_propagated_to_a_fixpoint() {
        let mut domains = Domains::default();
        let x = continuous(&mut domains, 2.0, 10.0);
        let y = continuous(&mut domains, 1.0, 10.0);
        let mut constraint = QuadraticConstraint::new(f64::NEG_INFINITY, 8.0).unwrap();
        constraint.add_product(x, y, 1.0).unwrap();
        let mut engine = engine();
        let _ = engine.add_constraint(constraint, &domains);

        let outcome = engine.propagate(&mut domains).unwrap();

        assert!(outcome.num_tightenings >= 2);
        assert!((domains.upper_bound(x) - 8.0).abs() < 1e-9);
        assert!((domains.upper_bound(y) - 4.0).abs() < 1e-9);

        let again = engine.propagate(&mut domains).unwrap();
        assert_eq!(again.num_tightenings, 0);
    }

    #[test]
    fn infeasible_constraints_cut_off_the_node() {
        let mut domains = Domains::default();
        let x = continuous(&mut domains, -1.0, 1.0);
        let mut constraint = QuadraticConstraint::new(f64::NEG_INFINITY, -1.0).unwrap();
        constraint.add_square(x, 1.0).unwrap();
        let mut engine = engine();
        let _ = engine.add_constraint(constraint, &domains);

        assert_eq!(
            engine.propagate(&mut domains),
            Err(Infeasible::ActivityOutOfRange)
        );
        assert_eq!(engine.statistics().cutoffs, 1);
    }

    #[test]
    fn restored_bounds_reach_the_constraints() {
        let mut domains = Domains::default();
        let x = continuous(&mut domains, 0.0, 8.0);
        let y = continuous(&mut domains, 0.0, 8.0);
        let mut constraint = QuadraticConstraint::new(f64::NEG_INFINITY, 10.0).unwrap();
        constraint.add_linear(x, 1.0).unwrap();
        constraint.add_linear(y, 1.0).unwrap();
        let mut engine = engine();
        let _ = engine.add_constraint(constraint, &domains);
        assert_eq!(engine.propagate(&mut domains).unwrap().num_tightenings, 0);

        domains.new_checkpoint();
        domains.fix(x, 5.0).unwrap();
        let _ = engine.propagate(&mut domains).unwrap();
        assert_eq!(domains.upper_bound(y), 5.0);

        domains.synchronise(0);
        let outcome = engine.propagate(&mut domains).unwrap();

        assert_eq!(outcome.num_tightenings, 0);
        assert_eq!(domains.bounds(y), Interval::new(0.0, 8.0));
    }

    #[test]
    fn violated_convex_constraints_are_separated_by_tangents() {
        let mut domains = Domains::default();
        let x = continuous(&mut domains, -2.0, 2.0);
        let y = continuous(&mut domains, -2.0, 2.0);
        let mut constraint = QuadraticConstraint::new(f64::NEG_INFINITY, 1.0).unwrap();
        constraint.add_square(x, 1.0).unwrap();
        constraint.add_square(y, 1.0).unwrap();
        let mut engine = engine();
        let id = engine.add_constraint(constraint, &domains);
        let solution = Solution::from_values([1.0, 1.0]);

        let cuts = engine.separate(&mut domains, &solution);

        assert_eq!(cuts.len(), 1);
        let (cut_id, cut) = &cuts[0];
        assert_eq!(*cut_id, id);
        // 2x + 2y - 2 ≤ 1
        assert_eq!(cut.rhs, 3.0);
        assert!(cut.terms.iter().all(|term| term.coefficient == 2.0));
        assert!(cut.activity(&solution) > cut.rhs);
        assert!(!cut.is_removable);

        let feasible = Solution::from_values([0.5, 0.5]);
        assert!(engine.separate(&mut domains, &feasible).is_empty());
    }

    #[test]
    fn fixed_variables_are_substituted_and_linear_constraints_upgraded() {
        let mut domains = Domains::default();
        let x = continuous(&mut domains, -5.0, 5.0);
        let y = continuous(&mut domains, -5.0, 5.0);
        let mut constraint = QuadraticConstraint::new(f64::NEG_INFINITY, 5.0).unwrap();
        constraint.add_square(x, 1.0).unwrap();
        constraint.add_linear(y, 1.0).unwrap();
        let mut engine = engine();
        let id = engine.add_constraint(constraint, &domains);
        domains.fix(x, 2.0).unwrap();

        let outcome = engine.presolve(&mut domains).unwrap();

        assert_eq!(outcome.num_substitutions, 1);
        assert_eq!(outcome.removed, vec![id]);
        assert!(outcome.added.is_empty());
        assert_eq!(outcome.linear_constraints.len(), 1);
        assert_eq!(outcome.linear_constraints[0].rhs, 1.0);
        assert_eq!(engine.num_constraints(), 0);
        assert_eq!(engine.statistics().upgrades, 1);
    }

    #[test]
    fn failed_substitution_restores_the_constraint() {
        let mut domains = Domains::default();
        let w = continuous(&mut domains, -5.0, 5.0);
        let x = continuous(&mut domains, -1e16, 1e16);
        let y = continuous(&mut domains, -5.0, 5.0);
        let mut constraint = QuadraticConstraint::new(f64::NEG_INFINITY, 1.0).unwrap();
        constraint.add_square(w, 1.0).unwrap();
        constraint.add_square(x, 1e300).unwrap();
        constraint.add_linear(y, 1.0).unwrap();
        let mut engine = engine();
        let id = engine.add_constraint(constraint, &domains);
        domains.fix(w, 2.0).unwrap();
        domains.fix(x, 1e15).unwrap();

        let result = engine.presolve(&mut domains);

        assert_eq!(
            result.err(),
            Some(ConstraintOperationError::NonFiniteCoefficient(f64::INFINITY))
        );
        let constraint = engine.constraint(id).unwrap();
        assert_eq!(constraint.rhs(), 1.0);
        assert_eq!(constraint.quad_var_terms().len(), 2);
        assert_eq!(constraint.linear_terms().len(), 1);
        assert!(engine.watch_list.is_watched(w));
        assert!(engine.watch_list.is_watched(x));
        assert_eq!(engine.statistics().upgrades, 0);
    }

    #[test]
    fn independent_parts_are_disaggregated_in_presolve() {
        let mut domains = Domains::default();
        let x = continuous(&mut domains, -2.0, 2.0);
        let y = continuous(&mut domains, -2.0, 2.0);
        let mut constraint = QuadraticConstraint::new(f64::NEG_INFINITY, 4.0).unwrap();
        constraint.add_square(x, 1.0).unwrap();
        constraint.add_square(y, 1.0).unwrap();
        let options = QuadraticOptions {
            disaggregate: true,
            ..Default::default()
        };
        let mut engine = QuadraticEngine::new(options).with_oracle(Box::new(NoEigenvalueOracle));
        let id = engine.add_constraint(constraint, &domains);

        let outcome = engine.presolve(&mut domains).unwrap();

        // The master constraint only has linear terms and is upgraded once more.
        assert_eq!(outcome.removed, vec![id]);
        assert_eq!(outcome.added.len(), 2);
        assert_eq!(outcome.linear_constraints.len(), 1);
        assert_eq!(engine.num_constraints(), 2);
        assert_eq!(engine.statistics().disaggregations, 1);
        assert_eq!(engine.statistics().upgrades, 2);
        assert_eq!(domains.num_variables(), 4);
    }

    #[test]
    fn substituted_variables_are_rewatched() {
        let mut domains = Domains::default();
        let x = continuous(&mut domains, -5.0, 5.0);
        let y = continuous(&mut domains, -5.0, 5.0);
        let w = continuous(&mut domains, -5.0, 5.0);
        let mut constraint = QuadraticConstraint::new(f64::NEG_INFINITY, 4.0).unwrap();
        constraint.add_square(x, 1.0).unwrap();
        constraint.add_linear(y, 1.0).unwrap();
        let mut engine = engine();
        let id = engine.add_constraint(constraint, &domains);

        engine.substitute_variable(x, Some(w), 2.0, 1.0).unwrap();

        let constraint = engine.constraint(id).unwrap();
        assert!(constraint.term_positions(x).is_empty());
        assert!(!constraint.term_positions(w).is_empty());
        assert!(!engine.watch_list.is_watched(x));
        assert!(engine.watch_list.is_watched(w));

        // 4w² + 4w + y ≤ 3
        assert_eq!(constraint.rhs(), 3.0);
        let solution = Solution::from_values([0.0, 2.0, 0.5]);
        assert_eq!(constraint.evaluate(&solution), 5.0);
    }

    #[test]
    fn nonconvex_constraints_receive_default_bounds() {
        let mut domains = Domains::default();
        let x = continuous(&mut domains, f64::NEG_INFINITY, f64::INFINITY);
        let y = continuous(&mut domains, 0.0, 1.0);
        let mut constraint = QuadraticConstraint::new(f64::NEG_INFINITY, 1.0).unwrap();
        constraint.add_product(x, y, 1.0).unwrap();
        let mut engine = engine();
        let _ = engine.add_constraint(constraint, &domains);

        engine.initialise_solve(&mut domains).unwrap();

        let default_bound = engine.options().default_bound;
        assert_eq!(
            domains.bounds(x),
            Interval::new(-default_bound, default_bound)
        );
        assert_eq!(engine.statistics().default_bounds, 2);
    }

    #[test]
    fn violated_constraints_are_reported() {
        let mut domains = Domains::default();
        let x = continuous(&mut domains, -5.0, 5.0);
        let mut first = QuadraticConstraint::new(f64::NEG_INFINITY, 4.0).unwrap();
        first.add_square(x, 1.0).unwrap();
        let mut second = QuadraticConstraint::new(1.0, f64::INFINITY).unwrap();
        second.add_linear(x, 1.0).unwrap();
        let mut engine = engine();
        let first = engine.add_constraint(first, &domains);
        let _ = engine.add_constraint(second, &domains);

        let violated = engine.check(&Solution::from_values([3.0]));

        assert_eq!(violated, vec![(first, 5.0)]);
        assert!(engine.check(&Solution::from_values([1.5])).is_empty());
    }
}
