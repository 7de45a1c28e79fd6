//! REST gateway to the library service.
//!
//! This module provides the `ApiClient` for the auth, book, user, loan and
//! report endpoints. The client reads the bearer credential from the shared
//! `SessionContext` on every request.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
