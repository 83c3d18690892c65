//! Loomlance: contracts, invoices and clients for a single freelancer,
//! kept in local key-value storage.
//!
//! The [`Repository`] owns every collection, runs the load-time status
//! reclassification, applies user-triggered transitions (including the
//! final invoice generated when a contract completes) and writes each
//! mutation through a debounced [`Persistence`] adapter.

pub mod aggregate;
mod archive;
pub mod clock;
pub mod config;
pub mod error;
pub mod ids;
pub mod lifecycle;
pub mod model;
pub mod report;
pub mod repository;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use error::{ConfigError, StoreError};
pub use model::{
    Address, BilledDisplay, Client, Contract, ContractStatus, EntityId, Invoice, InvoiceKind,
    InvoiceStatus, LineItem, Profile, Theme,
};
pub use repository::{Completion, Entity, Repository, Snapshot};
pub use store::{FileStore, MemoryStore, Persistence, Store};
