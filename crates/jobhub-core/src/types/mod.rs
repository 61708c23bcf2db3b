//! Core type definitions used across the JobHub workspace.

pub mod pagination;

pub use pagination::PageRequest;
