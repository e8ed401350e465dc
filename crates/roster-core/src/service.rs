//! The remote-service traits.
//!
//! `roster-client` implements these over HTTP. The sync layer (cache, session
//! gate, form controllers) depends only on the traits, so tests can inject an
//! in-memory fake.

use std::future::Future;

use crate::{
  Result,
  user::{LoginResponse, NewUser, User, UserPage, UserPatch},
};

/// User-management operations. Each call issues exactly one request.
///
/// All methods return `Send` futures so callers can spawn them on a
/// multi-threaded runtime.
pub trait UserApi: Send + Sync {
  /// `GET /users?limit=&page=` (1-based page).
  fn list_users(
    &self,
    page: u32,
    limit: u32,
  ) -> impl Future<Output = Result<UserPage>> + Send + '_;

  /// `GET /users/:id`. Fails with [`crate::Error::AccessDenied`] on 403.
  fn get_user<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<User>> + Send + 'a;

  /// `POST /users`. Fails with [`crate::Error::ValidationFailed`] on 400 and
  /// [`crate::Error::DuplicateEmail`] on 409.
  fn create_user<'a>(
    &'a self,
    payload: &'a NewUser,
  ) -> impl Future<Output = Result<User>> + Send + 'a;

  /// `PUT /users/:id` with only the changed fields.
  fn update_user<'a>(
    &'a self,
    id: &'a str,
    patch: &'a UserPatch,
  ) -> impl Future<Output = Result<User>> + Send + 'a;
}

/// Session operations. The credential itself is an HTTP cookie managed by the
/// implementation.
pub trait AuthApi: Send + Sync {
  /// `POST /auth/login`.
  fn login<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<LoginResponse>> + Send + 'a;

  /// `POST /auth/logout`.
  fn logout(&self) -> impl Future<Output = Result<()>> + Send + '_;
}
