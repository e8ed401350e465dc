//! In-memory stand-ins for the remote service and the navigator.

use std::{
  collections::{HashSet, VecDeque},
  sync::atomic::{AtomicUsize, Ordering},
  time::Duration,
};

use parking_lot::Mutex;
use roster_core::{
  Error, Result,
  service::{AuthApi, UserApi},
  user::{LoginResponse, NewUser, PageMeta, Role, SessionIdentity, User, UserPage, UserPatch},
};
use tokio::time::{Instant, sleep};

use crate::session::{Navigator, Route};

pub const ADMIN_EMAIL: &str = "admin@sistema.com";
pub const ADMIN_PASSWORD: &str = "secret123";

#[derive(Default)]
pub struct Calls {
  pub list:   AtomicUsize,
  pub get:    AtomicUsize,
  pub create: AtomicUsize,
  pub update: AtomicUsize,
  pub login:  AtomicUsize,
  pub logout: AtomicUsize,
}

fn bump(counter: &AtomicUsize) { counter.fetch_add(1, Ordering::SeqCst); }

pub fn count(counter: &AtomicUsize) -> usize { counter.load(Ordering::SeqCst) }

#[derive(Default)]
pub struct FakeService {
  pub users:         Mutex<Vec<User>>,
  pub calls:         Calls,
  /// Latency of every call.
  pub delay:         Duration,
  /// Errors returned by the next list calls, front first.
  pub list_failures: Mutex<VecDeque<Error>>,
  pub get_failures:  Mutex<VecDeque<Error>>,
  /// Ids whose profile the caller may not see.
  pub forbidden:     Mutex<HashSet<String>>,
  pub update_error:  Mutex<Option<Error>>,
  pub logout_error:  Mutex<Option<Error>>,
  /// Every patch received, in order.
  pub patches:       Mutex<Vec<(String, UserPatch)>>,
}

pub fn user(id: &str, name: &str, email: &str) -> User {
  User {
    id:         id.into(),
    name:       name.into(),
    email:      email.into(),
    phone:      Some("11999998888".into()),
    birth_date: Some("1990-05-10T03:00:00.000Z".into()),
    avatar:     None,
    role:       Role::Member,
    is_active:  true,
    created_at: Some("2024-01-01T12:00:00.000Z".into()),
    updated_at: Some("2024-01-01T12:00:00.000Z".into()),
  }
}

impl FakeService {
  pub fn with_users(n: usize) -> Self {
    let users = (1..=n)
      .map(|i| user(&format!("u-{i}"), &format!("User {i}"), &format!("user{i}@sistema.com")))
      .collect();
    Self {
      users: Mutex::new(users),
      ..Self::default()
    }
  }

  pub fn delayed(mut self, delay: Duration) -> Self {
    self.delay = delay;
    self
  }
}

impl UserApi for FakeService {
  async fn list_users(&self, page: u32, limit: u32) -> Result<UserPage> {
    bump(&self.calls.list);
    sleep(self.delay).await;
    if let Some(err) = self.list_failures.lock().pop_front() {
      return Err(err);
    }
    let users = self.users.lock();
    let start = (page.saturating_sub(1) * limit) as usize;
    let data = users.iter().skip(start).take(limit as usize).cloned().collect();
    let total = users.len() as u64;
    Ok(UserPage {
      data,
      meta: PageMeta {
        total,
        page,
        limit,
        total_pages: (users.len() as u32).div_ceil(limit).max(1),
      },
    })
  }

  async fn get_user(&self, id: &str) -> Result<User> {
    bump(&self.calls.get);
    sleep(self.delay).await;
    if let Some(err) = self.get_failures.lock().pop_front() {
      return Err(err);
    }
    if self.forbidden.lock().contains(id) {
      return Err(Error::AccessDenied("You can only view your own profile".into()));
    }
    self
      .users
      .lock()
      .iter()
      .find(|u| u.id == id)
      .cloned()
      .ok_or_else(|| Error::remote(Some(404), "Usuário não encontrado"))
  }

  async fn create_user(&self, payload: &NewUser) -> Result<User> {
    bump(&self.calls.create);
    sleep(self.delay).await;
    let mut users = self.users.lock();
    if users.iter().any(|u| u.email == payload.email) {
      return Err(Error::DuplicateEmail("E-mail já está em uso.".into()));
    }
    let mut created = user(&format!("u-{}", users.len() + 1), &payload.name, &payload.email);
    created.phone = payload.phone.clone();
    created.birth_date = payload.birth_date.clone();
    created.role = payload.role;
    users.push(created.clone());
    Ok(created)
  }

  async fn update_user(&self, id: &str, patch: &UserPatch) -> Result<User> {
    bump(&self.calls.update);
    sleep(self.delay).await;
    if let Some(err) = self.update_error.lock().clone() {
      return Err(err);
    }
    self.patches.lock().push((id.to_string(), patch.clone()));
    let mut users = self.users.lock();
    let Some(u) = users.iter_mut().find(|u| u.id == id) else {
      return Err(Error::remote(Some(404), "Usuário não encontrado"));
    };
    if let Some(name) = &patch.name {
      u.name = name.clone();
    }
    if let Some(email) = &patch.email {
      u.email = email.clone();
    }
    if let Some(phone) = &patch.phone {
      u.phone = Some(phone.clone());
    }
    if let Some(birth_date) = &patch.birth_date {
      u.birth_date = Some(birth_date.clone());
    }
    if let Some(role) = patch.role {
      u.role = role;
    }
    if let Some(is_active) = patch.is_active {
      u.is_active = is_active;
    }
    Ok(u.clone())
  }
}

impl AuthApi for FakeService {
  async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
    bump(&self.calls.login);
    sleep(self.delay).await;
    if email != ADMIN_EMAIL || password != ADMIN_PASSWORD {
      return Err(Error::remote(Some(401), "Credenciais inválidas"));
    }
    Ok(LoginResponse {
      message:       "Login realizado com sucesso".into(),
      user:          SessionIdentity {
        name:   "Admin".into(),
        email:  ADMIN_EMAIL.into(),
        avatar: None,
      },
      access_token:  "tok-123".into(),
      refresh_token: "ref-456".into(),
    })
  }

  async fn logout(&self) -> Result<()> {
    bump(&self.calls.logout);
    sleep(self.delay).await;
    match self.logout_error.lock().clone() {
      Some(err) => Err(err),
      None => Ok(()),
    }
  }
}

/// Records every navigation with the (paused) clock time it happened at.
#[derive(Default)]
pub struct RecordingNavigator {
  visits: Mutex<Vec<(Route, Instant)>>,
}

impl RecordingNavigator {
  pub fn routes(&self) -> Vec<Route> {
    self.visits.lock().iter().map(|(route, _)| *route).collect()
  }

  pub fn visits(&self) -> Vec<(Route, Instant)> { self.visits.lock().clone() }
}

impl Navigator for RecordingNavigator {
  fn navigate(&self, route: Route) { self.visits.lock().push((route, Instant::now())); }
}
