//! # HTTP Request Handlers
//!
//! This module contains all HTTP and WebSocket handlers for the Pairline application.
//! Each handler is responsible for processing specific requests and returning
//! appropriate responses.
//!
//! ## Available Handlers
//!
//! - **Admin** (`admin`) - Operator endpoints, served by a separate router
//! - **Chat** (`chat`) - Chat rooms and message history over REST
//! - **Health Check** (`health_check`) - Application health monitoring
//! - **Recommendation** (`recommendation`) - Ranked match candidates for the caller
//! - **WebSocket** (`websocket`) - Live chat socket per room

pub mod admin;
mod chat;
mod health_check;
mod recommendation;
mod websocket;

pub use chat::*;
pub use health_check::*;
pub use recommendation::*;
pub use websocket::*;
