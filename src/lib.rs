// ABOUTME: Library root for fnpipe - exposes the orchestration modules for the binary and tests.
// ABOUTME: The main binary is in main.rs.

pub mod adapters;
pub mod config;
pub mod credentials;
pub mod diagnostics;
pub mod error;
pub mod exchange;
pub mod executor;
pub mod output;
pub mod plan;
pub mod resolve;
pub mod state;
pub mod types;
