use enumset::EnumSet;

use super::BoundEvent;
use crate::containers::KeyedVec;
use crate::engine::variables::VariableId;

/// Bound changes made to the [`Domains`](crate::engine::Domains) are captured as events in the
/// event sink. The engine drains the sink to notify the constraints that watch those variables.
///
/// The event sink ensures duplicate events are ignored until the sink is drained.
#[derive(Default, Clone, Debug)]
pub(crate) struct EventSink {
    present: KeyedVec<VariableId, EnumSet<BoundEvent>>,
    events: Vec<(BoundEvent, VariableId)>,
}

impl EventSink {
    pub(crate) fn grow(&mut self) {
        let _ = self.present.push(EnumSet::new());
    }

    pub(crate) fn event_occurred(&mut self, event: BoundEvent, variable: VariableId) {
        let elem = &mut self.present[variable];

        if elem.contains(event) {
            return;
        }

        let _ = elem.insert(event);
        self.events.push((event, variable));
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub(crate) fn drain(&mut self) -> impl Iterator<Item = (BoundEvent, VariableId)> + '_ {
        self.events.drain(..).inspect(|&(event, variable)| {
            let _ = self.present[variable].remove(event);
        })
    }
}
