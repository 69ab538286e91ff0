//! Per-view document state: the engine view a plugin draws from, the document's size
//! and page layout, editing state reported by the engine, and the bus that routes
//! engine callbacks to subscribers.

mod client;
mod event_bus;
mod state;

pub use client::{DocumentClient, DocumentError, MountMode};
pub use event_bus::{EventBus, SubscriptionId};
pub use state::{StateChangeBuffer, UnoState};
