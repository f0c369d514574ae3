//! Lorebook change events.
//!
//! The lorebook emits one event per mutation on an in-process bus. The
//! runtime subscribes to keep scheduled jobs in step with the registry.

mod bus;
mod event;

pub use bus::{EventBus, EventSubscriber};
pub use event::{LorebookEvent, UpdateKind};
