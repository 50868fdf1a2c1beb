//! HTTP API module.
//!
//! This module provides the HTTP server and API types for the dietboard backend.

pub mod logs;
pub mod server;
pub mod types;

pub use logs::*;
pub use server::start_server;
pub use types::*;
