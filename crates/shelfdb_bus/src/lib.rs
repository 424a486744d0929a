//! # shelfdb Bus
//!
//! Typed asynchronous event dispatcher for shelfdb.
//!
//! Callers publish events; a fixed pool of worker tasks drains an
//! unbounded queue and invokes every handler registered for the event's
//! concrete type. Each publish returns a [`Receipt`] — a completion
//! signal resolved with the handler's reply or failure.
//!
//! Each receipt is backed by its own channel carried alongside the
//! queued event, so publish/resolution pairing is one-to-one by
//! construction. The monotonic [`Ticket`] exists for diagnostics only.
//!
//! ## Usage
//!
//! ```
//! use shelfdb_bus::{EventBus, EventHandler, HandlerFuture};
//! use std::sync::Arc;
//!
//! struct Greet(String);
//!
//! struct Greeter;
//!
//! impl EventHandler<Greet, String> for Greeter {
//!     fn handle(&self, event: Arc<Greet>) -> HandlerFuture<String> {
//!         Box::pin(async move { Ok(format!("hello, {}", event.0)) })
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let bus: EventBus<String> = EventBus::new(2);
//! bus.register::<Greet, _>(Greeter);
//!
//! let receipt = bus.publish(Greet("shelf".to_string()));
//! assert_eq!(receipt.wait().await.unwrap(), "hello, shelf");
//! bus.shutdown().await;
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bus;
mod error;
mod handler;
mod ticket;

pub use bus::{EventBus, Receipt};
pub use error::{BusError, BusResult};
pub use handler::{EventHandler, HandlerFuture};
pub use ticket::{Ticket, TicketSequence};
