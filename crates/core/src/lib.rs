//! Fleetsnap core
//!
//! Data model and persistence for machine inventory records. One record is
//! kept per user; submitting a fresh snapshot for a user replaces the
//! previous one through a single atomic upsert.
//!
//! # Usage
//!
//! ```ignore
//! use fleetsnap_core::{InventoryStore, NewInventoryRecord};
//!
//! let store = InventoryStore::open("data/fleetsnap.db").await?;
//! let outcome = store.upsert(&record).await?;
//! if outcome.inserted {
//!     println!("first snapshot for {}", outcome.user_id);
//! }
//! ```

pub mod error;
pub mod model;
pub mod store;

pub use error::{Result, StoreError};
pub use model::{
    GpuAdapter, InventoryRecord, InventorySnapshot, MemoryType, NewInventoryRecord, StorageDevice,
};
pub use store::{InventoryStore, SchemaStatus, UpsertOutcome};
