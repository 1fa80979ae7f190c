//! Shared utilities for stock-report
//!
//! This crate provides the ambient helpers used across the workspace:
//! tracing initialisation and typed environment-variable readers.

pub mod env;
pub mod logging;

pub use env::{EnvError, env_bool, env_parse, env_secs, env_string};
pub use logging::{LogFormat, init_tracing};
