//! # jobhub-entity
//!
//! Domain entity models for JobHub. The [`job::Job`] struct represents a
//! row of the `jobs` table and derives `sqlx::FromRow`; [`job::JobStatus`]
//! carries the lifecycle state machine.

pub mod job;
