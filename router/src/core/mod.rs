//! Deterministic, pure logic shared by the session router.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! tasks and ledger state and return deterministic outputs suitable for tests.

pub mod decompose;
pub mod ranking;
pub mod roles;
pub mod schedule;
