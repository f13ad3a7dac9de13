//! Job-board service library connecting students and recruiters.
//!
//! The [`board`] module carries the domain: job postings, applications, the
//! lifecycle rules that govern status transitions, role-scoped query
//! filtering, and the per-identity notification fan-out. [`config`],
//! [`telemetry`], and [`error`] provide the runtime scaffolding shared with
//! the API service.

pub mod board;
pub mod config;
pub mod error;
pub mod telemetry;
