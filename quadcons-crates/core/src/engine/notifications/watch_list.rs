use enumset::EnumSet;

use super::BoundEvent;
use crate::containers::KeyedVec;
use crate::engine::variables::VariableId;
use crate::engine::ConstraintId;

/// For every variable, the constraints which are notified when its bounds change.
#[derive(Default, Debug, Clone)]
pub(crate) struct WatchList {
    watchers: KeyedVec<VariableId, Watchers>,
}

#[derive(Debug, Default, Clone)]
struct Watchers {
    lower_bound_watchers: Vec<ConstraintId>,
    upper_bound_watchers: Vec<ConstraintId>,
    fixed_watchers: Vec<ConstraintId>,
}

impl Watchers {
    fn for_event(&self, event: BoundEvent) -> &Vec<ConstraintId> {
        match event {
            BoundEvent::LowerBound => &self.lower_bound_watchers,
            BoundEvent::UpperBound => &self.upper_bound_watchers,
            BoundEvent::Fixed => &self.fixed_watchers,
        }
    }

    fn for_event_mut(&mut self, event: BoundEvent) -> &mut Vec<ConstraintId> {
        match event {
            BoundEvent::LowerBound => &mut self.lower_bound_watchers,
            BoundEvent::UpperBound => &mut self.upper_bound_watchers,
            BoundEvent::Fixed => &mut self.fixed_watchers,
        }
    }
}

impl WatchList {
    /// Registers `constraint` for the given events of `variable`; registering twice has no effect.
    pub(crate) fn watch(
        &mut self,
        variable: VariableId,
        events: EnumSet<BoundEvent>,
        constraint: ConstraintId,
    ) {
        self.watchers.accomodate(variable, Watchers::default());

        for event in events {
            let watchers = self.watchers[variable].for_event_mut(event);
            if !watchers.contains(&constraint) {
                watchers.push(constraint);
            }
        }
    }

    /// Removes every registration of `constraint` on `variable`.
    pub(crate) fn unwatch(&mut self, variable: VariableId, constraint: ConstraintId) {
        if let Some(watchers) = self.watchers.get_mut(variable) {
            for event in EnumSet::<BoundEvent>::all() {
                watchers.for_event_mut(event).retain(|&c| c != constraint);
            }
        }
    }

    pub(crate) fn get_affected_constraints(
        &self,
        event: BoundEvent,
        variable: VariableId,
    ) -> &[ConstraintId] {
        self.watchers
            .get(variable)
            .map(|watchers| watchers.for_event(event).as_slice())
            .unwrap_or(&[])
    }

    /// Returns true if any constraint watches `variable`.
    #[cfg(test)]
    pub(crate) fn is_watched(&self, variable: VariableId) -> bool {
        self.watchers.get(variable).is_some_and(|watchers| {
            EnumSet::<BoundEvent>::all()
                .iter()
                .any(|event| !watchers.for_event(event).is_empty())
        })
    }

    #[cfg(test)]
    pub(crate) fn num_variables(&self) -> usize {
        self.watchers.len()
    }
}
