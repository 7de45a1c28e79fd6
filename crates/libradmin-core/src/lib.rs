//! Core library for libradmin.
//!
//! Session authorization and API access for the library administration
//! front end:
//!
//! - `auth`: credential decoding, the shared session context, and the
//!   navigation-time session guard
//! - `api`: the authenticated gateway to the remote library service
//! - `models`: request and response types exchanged with the service
//! - `config`: user configuration and directory locations

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::{GuardDecision, Route, SessionContext, SessionGuard};
pub use config::Config;
