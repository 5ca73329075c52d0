//! # Utility Modules
//!
//! This module contains utility functions and constants used throughout the
//! Pairline application.
//!
//! ## Available Utilities
//!
//! - **Constants** (`constant`) - Timeouts, paging limits and scoring weights
//! - **Static objects** (`static_object`) - Env-backed settings resolved on first use
//! - **Secrets** (`secret`) - Secret lookup from files or env variables
//! - **Logger** (`logger`) - Tracing subscriber setup

pub mod constant;
pub mod logger;
pub mod secret;
pub mod static_object;
