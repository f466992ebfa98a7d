use chrono::{DateTime, Utc};

/// A fact emitted by an aggregate. Applied in order, never edited.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable dotted name used in logs, e.g. `sales.order.placed`.
    fn event_type(&self) -> &'static str;

    fn occurred_at(&self) -> DateTime<Utc>;
}
