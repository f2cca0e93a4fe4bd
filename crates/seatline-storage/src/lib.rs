// Storage layer for Seatline
//
// This crate provides the persistence seam for the ticketing core:
// - Database: Postgres repository with atomic conditional updates
// - InMemoryStore: lock-based store for dev mode and tests
// - StorageBackend: enum dispatch over the two

pub mod backend;
pub mod memory;
pub mod models;
pub mod repositories;

pub use backend::StorageBackend;
pub use memory::InMemoryStore;
pub use models::*;
pub use repositories::Database;
