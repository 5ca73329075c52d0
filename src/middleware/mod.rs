//! # Middleware Components
//!
//! Middleware functions that handle cross-cutting concerns such as
//! authentication of protected routes.

pub mod auth;

pub use auth::{AuthUser, auth_middleware};
