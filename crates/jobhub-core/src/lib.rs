//! # jobhub-core
//!
//! Core crate for JobHub. Contains the configuration schema, the unified
//! error system, and the pagination type shared by the store and the API.
//!
//! This crate has **no** internal dependencies on other JobHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
