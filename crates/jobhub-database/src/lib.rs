//! # jobhub-database
//!
//! The [`JobStore`] contract consumed by the dispatcher and the API, with a
//! PostgreSQL implementation ([`JobRepository`]) and an in-process one
//! ([`MemoryJobStore`]).

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::connect_pool;
pub use memory::MemoryJobStore;
pub use repositories::JobRepository;
pub use store::{JobStore, open_store};
