//! # shelfdb Core
//!
//! Embedded persistence for a library-management application.
//!
//! This crate provides:
//! - [`HashStore`]: a hash-indexed, memory-mapped record store with
//!   linear probing, buffered writes, threshold flush, and
//!   rollback-on-failure
//! - [`MemoryStore`]: a concurrent ordered alternative with ceiling
//!   reads, neighborhood search, and bulk snapshots
//! - [`StoreRegistry`]: named stores behind one datum-level surface
//! - [`QueryHandler`]: a `shelfdb_bus` handler routing textual queries
//!   (`destination:action:key:payload`) to the right store
//!
//! ## Usage
//!
//! ```no_run
//! use shelfdb_bus::EventBus;
//! use shelfdb_codec::datum::ItemCodec;
//! use shelfdb_core::{
//!     HashStore, QueryEvent, QueryHandler, QueryOutcome, StoreConfig, StoreRegistry,
//! };
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(StoreRegistry::new());
//! let items = HashStore::open("items.db", StoreConfig::default(), ItemCodec)?;
//! registry.register_typed("items", items);
//!
//! let bus: EventBus<QueryOutcome> = EventBus::new(4);
//! bus.register::<QueryEvent, _>(QueryHandler::new(Arc::clone(&registry)));
//!
//! let receipt = bus.publish(QueryEvent::new(
//!     r#"items:add::{"kind":"item","id":41,"title":"Dune","enabled":true}"#,
//! ));
//! assert_eq!(receipt.wait().await?, QueryOutcome::Done(true));
//! bus.shutdown().await;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod database;
mod error;
pub mod external;
mod hash;
mod memory;
mod query;
mod registry;

pub use config::StoreConfig;
pub use database::Database;
pub use error::{CoreError, CoreResult};
pub use external::{ConvertError, ExternalPayload};
pub use hash::HashStore;
pub use memory::MemoryStore;
pub use query::{Action, ParsedQuery, QueryError, QueryEvent, QueryHandler, QueryOutcome};
pub use registry::{DatumStore, DatumVariant, StoreRegistry, VariantStore};

// The codec types appear throughout the public API.
pub use shelfdb_codec::{datum, Record, Timestamp};
