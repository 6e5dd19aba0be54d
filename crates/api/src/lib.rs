//! # Arkive App
//!
//! Application layer - commands and main entry point.
//!
//! This crate contains:
//! - Commands consumed by the desktop front end
//! - Application context (dependency injection)
//! - Logging initialisation for the binary
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture

pub mod commands;
pub mod context;
pub mod utils;

// Re-export for convenience
pub use commands::*;
pub use context::*;
