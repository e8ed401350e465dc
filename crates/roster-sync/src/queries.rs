//! The process-wide user store: cached list and detail queries plus the
//! mutations that keep them consistent.

use std::{sync::Arc, time::Duration};

use roster_core::{
  Result,
  service::UserApi,
  user::{NewUser, User, UserPage, UserPatch},
};
use tracing::info;

use crate::cache::{QueryCache, QueryPolicy, QuerySnapshot, Subscription};

/// Paginated list queries.
pub const LIST_POLICY: QueryPolicy = QueryPolicy {
  stale_time:       Duration::from_secs(5 * 60),
  gc_time:          Duration::from_secs(10 * 60),
  retry:            3,
  retry_delay:      Duration::from_secs(1),
  refetch_on_focus: true,
};

/// Single-user queries.
pub const DETAIL_POLICY: QueryPolicy = QueryPolicy {
  stale_time:       Duration::from_secs(5 * 60),
  gc_time:          Duration::from_secs(10 * 60),
  retry:            2,
  retry_delay:      Duration::from_secs(1),
  refetch_on_focus: true,
};

/// Key of one list page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UsersKey {
  pub page:  u32,
  pub limit: u32,
}

/// Key of one user record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserKey(pub String);

/// Cached access to the user service.
///
/// Mutations go straight to the service and then invalidate whatever they
/// may have made out of date.
pub struct UserQueries<S> {
  service:       Arc<S>,
  lists:         QueryCache<UsersKey, UserPage>,
  details:       QueryCache<UserKey, User>,
  list_policy:   QueryPolicy,
  detail_policy: QueryPolicy,
}

impl<S: UserApi + 'static> UserQueries<S> {
  pub fn new(service: Arc<S>) -> Self {
    Self::with_policies(service, LIST_POLICY, DETAIL_POLICY)
  }

  pub fn with_policies(
    service: Arc<S>,
    list_policy: QueryPolicy,
    detail_policy: QueryPolicy,
  ) -> Self {
    Self {
      service,
      lists: QueryCache::new(),
      details: QueryCache::new(),
      list_policy,
      detail_policy,
    }
  }

  pub fn service(&self) -> &Arc<S> { &self.service }

  // ── Queries ───────────────────────────────────────────────────────────────

  /// One page of users, `page` 1-based.
  pub async fn users(&self, page: u32, limit: u32) -> Result<Arc<UserPage>> {
    let service = Arc::clone(&self.service);
    let fetch = move || {
      let service = Arc::clone(&service);
      async move { service.list_users(page, limit).await }
    };
    self
      .lists
      .fetch(UsersKey { page, limit }, self.list_policy, fetch)
      .await
  }

  pub async fn user(&self, id: &str) -> Result<Arc<User>> {
    let service = Arc::clone(&self.service);
    let owned = id.to_string();
    let fetch = move || {
      let service = Arc::clone(&service);
      let id = owned.clone();
      async move { service.get_user(&id).await }
    };
    self
      .details
      .fetch(UserKey(id.to_string()), self.detail_policy, fetch)
      .await
  }

  pub fn watch_users(&self, page: u32, limit: u32) -> Subscription<UsersKey, UserPage> {
    self.lists.subscribe(UsersKey { page, limit }, self.list_policy)
  }

  pub fn watch_user(&self, id: &str) -> Subscription<UserKey, User> {
    self
      .details
      .subscribe(UserKey(id.to_string()), self.detail_policy)
  }

  pub fn users_snapshot(&self, page: u32, limit: u32) -> Option<QuerySnapshot<UserPage>> {
    self.lists.snapshot(&UsersKey { page, limit })
  }

  pub fn user_snapshot(&self, id: &str) -> Option<QuerySnapshot<User>> {
    self.details.snapshot(&UserKey(id.to_string()))
  }

  // ── Mutations ─────────────────────────────────────────────────────────────

  /// Create a user; every list page is invalidated on success.
  pub async fn create_user(&self, payload: &NewUser) -> Result<User> {
    let user = self.service.create_user(payload).await?;
    info!(id = %user.id, "user created");
    self.invalidate_users();
    Ok(user)
  }

  /// Apply `patch` to user `id`; that user and every list page are
  /// invalidated on success.
  pub async fn update_user(&self, id: &str, patch: &UserPatch) -> Result<User> {
    let user = self.service.update_user(id, patch).await?;
    info!(%id, fields = ?patch.field_names(), "user updated");
    self.invalidate_user(id);
    self.invalidate_users();
    Ok(user)
  }

  // ── Lifecycle ─────────────────────────────────────────────────────────────

  pub fn invalidate_users(&self) -> usize { self.lists.invalidate(|_| true) }

  pub fn invalidate_user(&self, id: &str) -> usize {
    self.details.invalidate(|key| key.0 == id)
  }

  /// The console regained focus.
  pub fn refocus(&self) -> usize { self.lists.refocus() + self.details.refocus() }

  pub fn collect_garbage(&self) -> usize {
    self.lists.collect_garbage() + self.details.collect_garbage()
  }

  /// Forget everything, e.g. after logout.
  pub fn reset(&self) {
    self.lists.clear();
    self.details.clear();
  }
}
