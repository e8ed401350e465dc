//! Error types for `roster-core`.
//!
//! Every remote failure is classified into one of these variants by the
//! client layer. The enum is `Clone` so a single failed request can be handed
//! to every caller waiting on it.

use thiserror::Error;

use crate::validate::ValidationErrors;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  /// The server rejected the payload (HTTP 400).
  #[error("{0}")]
  ValidationFailed(String),

  /// The caller may not see this resource (HTTP 403).
  #[error("{0}")]
  AccessDenied(String),

  /// The e-mail address is already registered (HTTP 409).
  #[error("{0}")]
  DuplicateEmail(String),

  /// Any other non-success response, or an unreadable body.
  #[error("{message}")]
  RemoteOperationFailed {
    status:  Option<u16>,
    message: String,
  },

  /// The request never produced an HTTP response.
  #[error("network unavailable: {0}")]
  NetworkUnavailable(String),

  /// A form draft failed the client-side schema.
  #[error("invalid form: {0}")]
  InvalidForm(ValidationErrors),
}

impl Error {
  /// Build a [`Error::RemoteOperationFailed`].
  pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
    Self::RemoteOperationFailed {
      status,
      message: message.into(),
    }
  }

  /// The HTTP status this error stands for, when it has one.
  pub fn status(&self) -> Option<u16> {
    match self {
      Self::ValidationFailed(_) => Some(400),
      Self::AccessDenied(_) => Some(403),
      Self::DuplicateEmail(_) => Some(409),
      Self::RemoteOperationFailed { status, .. } => *status,
      Self::NetworkUnavailable(_) | Self::InvalidForm(_) => None,
    }
  }

  /// Whether retrying the same request may succeed.
  ///
  /// Transport failures and server-side (5xx or status-less) failures are
  /// transient; classified client errors are terminal.
  pub fn is_transient(&self) -> bool {
    match self {
      Self::NetworkUnavailable(_) => true,
      Self::RemoteOperationFailed { status, .. } => {
        status.is_none_or(|s| s >= 500)
      }
      _ => false,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
