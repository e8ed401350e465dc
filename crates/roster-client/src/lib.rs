//! HTTP client for the remote user-management API.
//!
//! [`ApiClient`] implements [`roster_core::service::UserApi`] and
//! [`roster_core::service::AuthApi`] over `reqwest`. Every call issues one
//! request; failures are classified into [`roster_core::Error`] by status
//! code. The session credential is a cookie kept in the client's own jar.

mod client;
mod error;

pub use client::{ACCESS_TOKEN_COOKIE, ApiClient, ApiConfig};
pub use error::Operation;
