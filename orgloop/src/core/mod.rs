//! Deterministic, pure logic for the orchestration pipeline.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! strings and return deterministic outputs suitable for tests.

pub mod checklist;
pub mod error;
pub mod sanitize;
pub mod target;
pub mod types;
