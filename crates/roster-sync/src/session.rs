//! Session gate: who is logged in, and where the console goes next.
//!
//! The gate owns the client-side view of the session. The credential itself
//! is a cookie held by the [`AuthApi`] implementation; the gate tracks the
//! identity returned at login, the last error, and whether a profile view
//! has been refused.

use std::{sync::Arc, time::Duration};

use parking_lot::RwLock;
use roster_core::{
  Error, Result,
  service::AuthApi,
  user::{LoginResponse, SessionIdentity},
};
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{info, warn};

// ─── Routing ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
  /// The user list.
  Landing,
  Login,
}

impl Route {
  pub fn path(&self) -> &'static str {
    match self {
      Self::Landing => "/",
      Self::Login => "/login",
    }
  }
}

/// Receives navigation requests from the gate.
pub trait Navigator: Send + Sync + 'static {
  fn navigate(&self, route: Route);
}

// ─── State ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
  Anonymous,
  Authenticating,
  Authenticated(SessionIdentity),
  /// Logout requested; carries the identity being logged out, if any.
  LoggingOut(Option<SessionIdentity>),
}

/// What to do with the local session when the remote logout fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutPolicy {
  /// Drop the local identity regardless and report the failure.
  #[default]
  ClearAlways,
  /// Keep the session until the server confirms the logout.
  RequireRemoteSuccess,
}

/// Whether the profile view has been refused.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Denial {
  #[default]
  Clear,
  Denied { message: String },
}

/// Delays applied by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateTimings {
  /// Pause between a successful login and the redirect to the landing view.
  pub settle_delay:    Duration,
  /// Pause between an access denial and the redirect to the landing view.
  pub denial_redirect: Duration,
}

impl Default for GateTimings {
  fn default() -> Self {
    Self {
      settle_delay:    Duration::from_secs(1),
      denial_redirect: Duration::from_secs(3),
    }
  }
}

#[derive(Debug)]
struct Inner {
  state:      SessionState,
  last_error: Option<String>,
  denial:     Denial,
}

// ─── SessionGate ──────────────────────────────────────────────────────────────

/// Shared session state. Wrap it in an `Arc` to hand it to every view.
pub struct SessionGate<A, N> {
  api:       Arc<A>,
  navigator: Arc<N>,
  timings:   GateTimings,
  policy:    LogoutPolicy,
  inner:     RwLock<Inner>,
}

impl<A: AuthApi, N: Navigator> SessionGate<A, N> {
  pub fn new(api: Arc<A>, navigator: Arc<N>) -> Self {
    Self::with_options(api, navigator, GateTimings::default(), LogoutPolicy::default())
  }

  pub fn with_options(
    api: Arc<A>,
    navigator: Arc<N>,
    timings: GateTimings,
    policy: LogoutPolicy,
  ) -> Self {
    Self {
      api,
      navigator,
      timings,
      policy,
      inner: RwLock::new(Inner {
        state:      SessionState::Anonymous,
        last_error: None,
        denial:     Denial::Clear,
      }),
    }
  }

  // ── Accessors ─────────────────────────────────────────────────────────────

  pub fn state(&self) -> SessionState { self.inner.read().state.clone() }

  pub fn identity(&self) -> Option<SessionIdentity> {
    match &self.inner.read().state {
      SessionState::Authenticated(identity) => Some(identity.clone()),
      SessionState::LoggingOut(identity) => identity.clone(),
      _ => None,
    }
  }

  pub fn is_authenticated(&self) -> bool {
    matches!(self.inner.read().state, SessionState::Authenticated(_))
  }

  /// Whether a login or logout is in progress.
  pub fn is_loading(&self) -> bool {
    matches!(
      self.inner.read().state,
      SessionState::Authenticating | SessionState::LoggingOut(_)
    )
  }

  pub fn last_error(&self) -> Option<String> { self.inner.read().last_error.clone() }

  pub fn denial(&self) -> Denial { self.inner.read().denial.clone() }

  pub fn logout_policy(&self) -> LogoutPolicy { self.policy }

  // ── Transitions ───────────────────────────────────────────────────────────

  /// Log in and, once the settle delay has passed, go to the landing view.
  pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
    {
      let mut inner = self.inner.write();
      inner.state = SessionState::Authenticating;
      inner.last_error = None;
    }

    match self.api.login(email, password).await {
      Ok(response) => {
        info!(email = %response.user.email, "logged in");
        {
          let mut inner = self.inner.write();
          inner.state = SessionState::Authenticated(response.user.clone());
          inner.denial = Denial::Clear;
        }
        sleep(self.timings.settle_delay).await;
        self.navigator.navigate(Route::Landing);
        Ok(response)
      }
      Err(err) => {
        let mut inner = self.inner.write();
        inner.state = SessionState::Anonymous;
        inner.last_error = Some(err.to_string());
        Err(err)
      }
    }
  }

  /// End the session. See [`LogoutPolicy`] for what a remote failure does.
  pub async fn logout(&self) -> Result<()> {
    let previous = {
      let mut inner = self.inner.write();
      let identity = match &inner.state {
        SessionState::Authenticated(identity) => Some(identity.clone()),
        SessionState::LoggingOut(identity) => identity.clone(),
        _ => None,
      };
      inner.state = SessionState::LoggingOut(identity.clone());
      inner.last_error = None;
      identity
    };

    let result = self.api.logout().await;
    match (&result, self.policy) {
      (Err(err), LogoutPolicy::RequireRemoteSuccess) => {
        warn!(error = %err, "logout failed; keeping session");
        let mut inner = self.inner.write();
        inner.state = previous.map_or(SessionState::Anonymous, SessionState::Authenticated);
        inner.last_error = Some(err.to_string());
      }
      (outcome, _) => {
        match outcome {
          Ok(()) => info!("logged out"),
          Err(err) => warn!(error = %err, "remote logout failed; local session cleared"),
        }
        {
          let mut inner = self.inner.write();
          inner.state = SessionState::Anonymous;
          inner.denial = Denial::Clear;
          inner.last_error = outcome.as_ref().err().map(ToString::to_string);
        }
        self.navigator.navigate(Route::Login);
      }
    }
    result
  }

  /// Feed an error from loading the own-profile view.
  ///
  /// An access denial clears the identity, records the server's message and
  /// schedules a redirect to the landing view. Returns `true` only when this
  /// call entered the denied state.
  pub fn observe_profile_error(&self, err: &Error) -> bool {
    let Error::AccessDenied(message) = err else {
      return false;
    };
    {
      let mut inner = self.inner.write();
      if matches!(inner.denial, Denial::Denied { .. }) {
        return false;
      }
      inner.denial = Denial::Denied {
        message: message.clone(),
      };
      inner.state = SessionState::Anonymous;
    }
    warn!(%message, "profile access denied");

    let navigator = Arc::clone(&self.navigator);
    let delay = self.timings.denial_redirect;
    tokio::spawn(async move {
      sleep(delay).await;
      navigator.navigate(Route::Landing);
    });
    true
  }

  /// Leave the denied state, e.g. when a new profile view opens.
  pub fn clear_denial(&self) { self.inner.write().denial = Denial::Clear; }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn routes_have_paths() {
    assert_eq!(Route::Landing.path(), "/");
    assert_eq!(Route::Login.path(), "/login");
  }

  #[test]
  fn logout_policy_reads_snake_case() {
    #[derive(Deserialize)]
    struct Cfg {
      policy: LogoutPolicy,
    }
    let cfg: Cfg =
      serde_json::from_str(r#"{"policy":"require_remote_success"}"#).unwrap();
    assert_eq!(cfg.policy, LogoutPolicy::RequireRemoteSuccess);
    assert_eq!(LogoutPolicy::default(), LogoutPolicy::ClearAlways);
  }
}
