//! Observer plumbing between the [`Domains`](crate::engine::Domains) and the constraints: bound
//! changes are recorded in an [`EventSink`] and forwarded through a [`WatchList`].
mod bound_event;
mod event_sink;
mod watch_list;

pub use bound_event::BoundEvent;
pub(crate) use event_sink::EventSink;
pub(crate) use watch_list::WatchList;
