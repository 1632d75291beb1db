//! Daemon core: event coordination, zero direct I/O.
//!
//! The orchestrator, the command runner and the termination source live
//! here. All interaction with pins and processes happens through the
//! **port traits** defined in [`ports`], so the whole core runs against the
//! in-memory simulator in tests.

pub mod events;
pub mod ports;
pub mod runner;
pub mod service;
pub mod termination;
