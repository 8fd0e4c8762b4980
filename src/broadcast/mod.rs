//! Live-update fan-out
//!
//! The [`BroadcastHub`] owns the registry of connected live clients and
//! re-emits every watcher signal to each of them. Delivery is best-effort
//! and at most once per signal per client; nothing is replayed.

mod hub;


pub use hub::{BroadcastHub, ClientId, ClientSubscription, FanOutReport};
