use crate::basic_types::Trail;
use crate::containers::KeyedVec;
use crate::engine::notifications::BoundEvent;
use crate::engine::notifications::EventSink;
use crate::engine::variables::VariableId;
use crate::engine::variables::VariableType;
use crate::math::Interval;
use crate::quadcons_assert_moderate;
use crate::quadcons_assert_simple;

/// The default threshold from which values are considered infinite.
pub const DEFAULT_INFINITY: f64 = 1e20;

/// The bounds of all variables, owned by the host solver.
///
/// The quadratic engine reads bounds from the domains and writes tightenings into them. Every
/// change is recorded on a trail so the host can backtrack to a checkpoint, and as an event which
/// the [`QuadraticEngine`](crate::engine::QuadraticEngine) forwards to the watching constraints.
#[derive(Clone, Debug)]
pub struct Domains {
    domains: KeyedVec<VariableId, Domain>,
    trail: Trail<TrailEntry>,
    events: EventSink,
    infinity: f64,
}

/// Tightening a bound would leave the domain of `variable` without values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EmptyDomain {
    pub variable: VariableId,
}

#[derive(Clone, Copy, Debug)]
struct Domain {
    lower_bound: f64,
    upper_bound: f64,
    root_lower_bound: f64,
    root_upper_bound: f64,
    variable_type: VariableType,
}

#[derive(Clone, Copy, Debug)]
struct TrailEntry {
    variable: VariableId,
    old_lower_bound: f64,
    old_upper_bound: f64,
}

impl Default for Domains {
    fn default() -> Self {
        Domains::new(DEFAULT_INFINITY)
    }
}

impl Domains {
    /// Creates an empty store in which values with magnitude at least `infinity` are infinite.
    pub fn new(infinity: f64) -> Domains {
        quadcons_assert_simple!(infinity > 0.0);
        Domains {
            domains: KeyedVec::default(),
            trail: Trail::default(),
            events: EventSink::default(),
            infinity,
        }
    }

    pub fn infinity(&self) -> f64 {
        self.infinity
    }

    /// Maps values beyond the infinity threshold to `±∞`.
    pub fn normalise(&self, value: f64) -> f64 {
        if value >= self.infinity {
            f64::INFINITY
        } else if value <= -self.infinity {
            f64::NEG_INFINITY
        } else {
            value
        }
    }

    /// Registers a new variable with the given bounds; integer bounds are rounded inward.
    pub fn new_variable(
        &mut self,
        lower_bound: f64,
        upper_bound: f64,
        variable_type: VariableType,
    ) -> VariableId {
        let (mut lower_bound, mut upper_bound) =
            (self.normalise(lower_bound), self.normalise(upper_bound));
        if variable_type == VariableType::Integer {
            lower_bound = lower_bound.ceil();
            upper_bound = upper_bound.floor();
        }
        quadcons_assert_simple!(
            lower_bound <= upper_bound,
            "A variable needs a non-empty domain, got [{lower_bound}, {upper_bound}]"
        );

        self.events.grow();
        self.domains.push(Domain {
            lower_bound,
            upper_bound,
            root_lower_bound: lower_bound,
            root_upper_bound: upper_bound,
            variable_type,
        })
    }

    pub fn num_variables(&self) -> usize {
        self.domains.len()
    }

    pub fn variables(&self) -> impl Iterator<Item = VariableId> {
        self.domains.keys()
    }

    pub fn lower_bound(&self, variable: VariableId) -> f64 {
        self.domains[variable].lower_bound
    }

    pub fn upper_bound(&self, variable: VariableId) -> f64 {
        self.domains[variable].upper_bound
    }

    pub fn bounds(&self, variable: VariableId) -> Interval {
        let domain = &self.domains[variable];
        Interval::new(domain.lower_bound, domain.upper_bound)
    }

    /// The bounds of `variable` at the root, i.e. before any checkpoint was created.
    pub fn root_bounds(&self, variable: VariableId) -> Interval {
        let domain = &self.domains[variable];
        Interval::new(domain.root_lower_bound, domain.root_upper_bound)
    }

    pub fn variable_type(&self, variable: VariableId) -> VariableType {
        self.domains[variable].variable_type
    }

    pub fn is_integer(&self, variable: VariableId) -> bool {
        self.domains[variable].variable_type == VariableType::Integer
    }

    /// Returns true for integer variables whose domain is contained in `{0, 1}`.
    pub fn is_binary(&self, variable: VariableId) -> bool {
        let domain = &self.domains[variable];
        domain.variable_type == VariableType::Integer
            && domain.lower_bound >= 0.0
            && domain.upper_bound <= 1.0
    }

    pub fn is_fixed(&self, variable: VariableId) -> bool {
        let domain = &self.domains[variable];
        domain.lower_bound == domain.upper_bound
    }

    /// Returns the value of a fixed variable.
    pub fn fixed_value(&self, variable: VariableId) -> Option<f64> {
        self.is_fixed(variable)
            .then(|| self.domains[variable].lower_bound)
    }
}

// methods to change the domains
impl Domains {
    /// Raises the lower bound of `variable` to `new_lower_bound`.
    ///
    /// Returns `Ok(true)` if the bound changed, `Ok(false)` if the bound was already at least as
    /// tight, and [`EmptyDomain`] if the new bound exceeds the upper bound. In the latter case the
    /// domain is left unchanged.
    pub fn tighten_lower_bound(
        &mut self,
        variable: VariableId,
        new_lower_bound: f64,
    ) -> Result<bool, EmptyDomain> {
        let new_lower_bound = self.normalise(new_lower_bound);
        let domain = self.domains[variable];
        if new_lower_bound <= domain.lower_bound {
            return Ok(false);
        }
        if new_lower_bound > domain.upper_bound {
            return Err(EmptyDomain { variable });
        }

        self.record(variable);

        let is_root = self.trail.get_checkpoint() == 0;
        let domain = &mut self.domains[variable];
        domain.lower_bound = new_lower_bound;
        if is_root {
            domain.root_lower_bound = new_lower_bound;
        }

        self.events.event_occurred(BoundEvent::LowerBound, variable);
        if self.is_fixed(variable) {
            self.events.event_occurred(BoundEvent::Fixed, variable);
        }

        Ok(true)
    }

    /// Lowers the upper bound of `variable` to `new_upper_bound`; see
    /// [`Domains::tighten_lower_bound`].
    pub fn tighten_upper_bound(
        &mut self,
        variable: VariableId,
        new_upper_bound: f64,
    ) -> Result<bool, EmptyDomain> {
        let new_upper_bound = self.normalise(new_upper_bound);
        let domain = self.domains[variable];
        if new_upper_bound >= domain.upper_bound {
            return Ok(false);
        }
        if new_upper_bound < domain.lower_bound {
            return Err(EmptyDomain { variable });
        }

        self.record(variable);

        let is_root = self.trail.get_checkpoint() == 0;
        let domain = &mut self.domains[variable];
        domain.upper_bound = new_upper_bound;
        if is_root {
            domain.root_upper_bound = new_upper_bound;
        }

        self.events.event_occurred(BoundEvent::UpperBound, variable);
        if self.is_fixed(variable) {
            self.events.event_occurred(BoundEvent::Fixed, variable);
        }

        Ok(true)
    }

    /// Fixes `variable` to `value`.
    pub fn fix(&mut self, variable: VariableId, value: f64) -> Result<(), EmptyDomain> {
        let _ = self.tighten_lower_bound(variable, value)?;
        let _ = self.tighten_upper_bound(variable, value)?;
        Ok(())
    }

    fn record(&mut self, variable: VariableId) {
        let domain = &self.domains[variable];
        self.trail.push(TrailEntry {
            variable,
            old_lower_bound: domain.lower_bound,
            old_upper_bound: domain.upper_bound,
        });
    }
}

// checkpoints and events
impl Domains {
    pub fn new_checkpoint(&mut self) {
        self.trail.new_checkpoint()
    }

    pub fn get_checkpoint(&self) -> usize {
        self.trail.get_checkpoint()
    }

    /// Restores the bounds to the state at `checkpoint`.
    ///
    /// The restored bounds are reported as events, so that constraints caching bound information
    /// are brought up to date by the next notification round.
    pub fn synchronise(&mut self, checkpoint: usize) {
        quadcons_assert_simple!(checkpoint < self.trail.get_checkpoint());

        let mut restored = Vec::new();
        for entry in self.trail.synchronise(checkpoint) {
            let domain = &mut self.domains[entry.variable];
            domain.lower_bound = entry.old_lower_bound;
            domain.upper_bound = entry.old_upper_bound;
            restored.push(entry.variable);
        }

        for variable in restored {
            self.events.event_occurred(BoundEvent::LowerBound, variable);
            self.events.event_occurred(BoundEvent::UpperBound, variable);
        }
        quadcons_assert_moderate!(self
            .domains
            .iter()
            .all(|domain| domain.lower_bound <= domain.upper_bound));
    }

    /// Returns the events since the last drain.
    pub fn drain_events(&mut self) -> impl Iterator<Item = (BoundEvent, VariableId)> + '_ {
        self.events.drain()
    }

    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// The number of bound changes recorded since the root.
    pub fn num_trail_entries(&self) -> usize {
        self.trail.len()
    }
}
