//! Event subscriber trait.
//!
//! [`Subscribe`] is the extension point for plugging event handlers into the
//! runtime. Each subscriber gets a dedicated worker task and a bounded
//! per-subscriber queue; a slow subscriber only affects its own queue, and
//! panics are caught so one bad handler cannot take the runtime down.
//!
//! ## Rules
//! - Events are processed sequentially (FIFO) per subscriber.
//! - Queue overflow drops the event for this subscriber only.
//! - Subscribers never block publishers or each other.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use envnode::{Subscribe, Event, EventKind};
//!
//! struct AlarmCounter;
//!
//! #[async_trait]
//! impl Subscribe for AlarmCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::AlarmRaised) {
//!             // bump a counter, page someone, ...
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "alarm-counter" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber for runtime observability.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// Called from a dedicated worker task, not in the publisher context.
    async fn on_event(&self, event: &Event);

    /// Returns the subscriber name used in diagnostics.
    ///
    /// Prefer short, descriptive names. The default uses
    /// `type_name::<Self>()`, which can be verbose.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the preferred queue capacity for this subscriber.
    ///
    /// On overflow the new event is dropped for this subscriber only and a
    /// warning is logged. The runtime clamps capacity to a minimum of 1.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
