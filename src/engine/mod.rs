//! Validation engine module.
//!
//! Provides result types, the session aggregate, validator orchestration,
//! progress streaming, domain events and session persistence.

pub mod events;
pub mod orchestrator;
pub mod repository;
pub mod result;
pub mod runner;
pub mod session;
