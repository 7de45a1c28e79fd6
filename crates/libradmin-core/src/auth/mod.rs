//! Authentication module for session state and route access.
//!
//! This module provides:
//! - `token`: decoding of bearer credentials and their embedded expiry
//! - `SessionContext`: the single credential slot shared by guard and gateway
//! - `SessionGuard`: per-navigation access decisions for protected routes
//! - `Route`: the navigable views and which of them are protected
//! - `CredentialStore`: OS keychain storage used by the keyring backend

pub mod credentials;
pub mod guard;
pub mod route;
pub mod session;
pub mod token;

pub use credentials::CredentialStore;
pub use guard::{DenyReason, GuardDecision, SessionGuard};
pub use route::Route;
pub use session::{SessionContext, StoredSession, TokenStorage};
pub use token::{TokenClaims, TokenError};
