//! Hybrid Race Coach Server Library
//!
//! Exposes server components for integration testing.

pub mod api;
pub mod arbitrator;
pub mod cold_path;
pub mod config;
pub mod event_log;
pub mod hot_path;
pub mod manager;
pub mod replay;
pub mod session;
pub mod state;
