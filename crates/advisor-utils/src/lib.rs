//! Shared utilities for stock-advisor
//!
//! This crate provides common functionality used across the stock-advisor
//! workspace: tracing setup and the application-level configuration the
//! binaries read at startup.

pub mod config;
pub mod logging;

pub use config::{Config, LogFormat};
pub use logging::{init_tracing, init_tracing_with};
