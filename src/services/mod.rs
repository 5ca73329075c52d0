//! # Business Logic Services
//!
//! This module contains the core business logic services for the Pairline application.
//! Services encapsulate domain-specific functionality and provide clean interfaces
//! for use by HTTP handlers and other application components.
//!
//! ## Available Services
//!
//! - **Chat** (`chat`) - Room and message persistence, and the message send path
//! - **JWT** (`jwt`) - Access token validation
//! - **Matching** (`matching`) - Compatibility scoring and recommendation ranking
//! - **Notification** (`notification`) - Best-effort push notification dispatch
//! - **Registry** (`registry`) - Live chat connections grouped by room

pub mod chat;
pub mod jwt;
pub mod matching;
pub mod notification;
pub mod registry;
