//! Entity placement layer for the trip booking service.
//!
//! Guarantees that at most one live Command Processor instance exists per
//! trip id, that all commands addressed to that id are handled by it
//! strictly sequentially, and that an instance is rebuilt from the event
//! log (with backoff on infrastructure failure) before it handles its
//! first command. Idle instances passivate and are re-activated on the
//! next command.

pub mod backoff;
pub mod config;
mod entity;
pub mod error;
pub mod registry;

pub use backoff::RetryPolicy;
pub use config::RuntimeConfig;
pub use error::AskError;
pub use registry::TripRegistry;
