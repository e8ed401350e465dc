//! Async HTTP client wrapping the user-management JSON API.

use std::{sync::Arc, time::Duration};

use reqwest::{
  Client, RequestBuilder, Url,
  cookie::{CookieStore, Jar},
};
use roster_core::{
  Error, Result,
  service::{AuthApi, UserApi},
  user::{LoginRequest, LoginResponse, NewUser, User, UserPage, UserPatch},
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{Operation, server_message, transport};

/// Name of the cookie the API sets on login.
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

/// Connection settings for the API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub timeout:  Duration,
}

impl ApiConfig {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self {
      base_url: base_url.into(),
      timeout:  Duration::from_secs(30),
    }
  }
}

/// Async HTTP client for the user-management API.
///
/// Cheap to clone; clones share the connection pool and the cookie jar, so a
/// login through one clone authenticates all of them.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  jar:    Arc<Jar>,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self, reqwest::Error> {
    let jar = Arc::new(Jar::default());
    let client = Client::builder()
      .cookie_provider(Arc::clone(&jar))
      .timeout(config.timeout)
      .build()?;
    Ok(Self {
      client,
      jar,
      config,
    })
  }

  pub fn base_url(&self) -> &str { &self.config.base_url }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  /// `/users/<id>` with `id` percent-encoded as a single path segment.
  fn user_url(&self, id: &str) -> Result<Url> {
    let invalid =
      |detail: String| Error::NetworkUnavailable(format!("invalid API URL: {detail}"));
    let mut url =
      Url::parse(&self.url("/users")).map_err(|e| invalid(e.to_string()))?;
    url
      .path_segments_mut()
      .map_err(|()| invalid(self.config.base_url.clone()))?
      .push(id);
    Ok(url)
  }

  /// Whether the jar holds an access-token cookie for the API origin.
  ///
  /// This is the presence check the edge gate performs before letting a
  /// protected view load; it says nothing about the token's validity.
  pub fn has_session_credential(&self) -> bool {
    let Ok(url) = Url::parse(&self.url("/")) else {
      return false;
    };
    let Some(header) = self.jar.cookies(&url) else {
      return false;
    };
    header.to_str().is_ok_and(|cookies| {
      cookies.split(';').any(|pair| {
        pair
          .trim()
          .split_once('=')
          .is_some_and(|(name, value)| {
            name == ACCESS_TOKEN_COOKIE && !value.is_empty()
          })
      })
    })
  }

  /// Send `req` and return the status and raw body of a success response.
  async fn execute(
    &self,
    req: RequestBuilder,
    op: Operation,
  ) -> Result<(u16, Vec<u8>)> {
    let resp = req
      .header(reqwest::header::ACCEPT, "*/*")
      .send()
      .await
      .map_err(|e| transport(op, e))?;

    let status = resp.status();
    let body = resp.bytes().await.map_err(|e| transport(op, e))?;
    debug!(operation = ?op, %status, bytes = body.len(), "response");

    if !status.is_success() {
      return Err(op.classify(status, server_message(&body)));
    }
    Ok((status.as_u16(), body.to_vec()))
  }

  async fn execute_json<T: DeserializeOwned>(
    &self,
    req: RequestBuilder,
    op: Operation,
  ) -> Result<T> {
    let (status, body) = self.execute(req, op).await?;
    serde_json::from_slice(&body).map_err(|e| {
      Error::remote(Some(status), format!("invalid response body: {e}"))
    })
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  /// `GET /users?limit=<limit>&page=<page>`
  pub async fn list_users(&self, page: u32, limit: u32) -> Result<UserPage> {
    let req = self
      .client
      .get(self.url("/users"))
      .query(&[("limit", limit), ("page", page)]);
    self.execute_json(req, Operation::ListUsers).await
  }

  /// `GET /users/:id`
  pub async fn get_user(&self, id: &str) -> Result<User> {
    let req = self.client.get(self.user_url(id)?);
    self.execute_json(req, Operation::GetUser).await
  }

  /// `POST /users`
  pub async fn create_user(&self, payload: &NewUser) -> Result<User> {
    let req = self.client.post(self.url("/users")).json(payload);
    self.execute_json(req, Operation::CreateUser).await
  }

  /// `PUT /users/:id` with only the changed fields in the body.
  pub async fn update_user(&self, id: &str, patch: &UserPatch) -> Result<User> {
    let req = self
      .client
      .put(self.user_url(id)?)
      .json(patch);
    self.execute_json(req, Operation::UpdateUser).await
  }

  // ── Auth ──────────────────────────────────────────────────────────────────

  /// `POST /auth/login`. On success the server sets the session cookies.
  pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
    let body = LoginRequest {
      email:    email.to_string(),
      password: password.to_string(),
    };
    let req = self.client.post(self.url("/auth/login")).json(&body);
    self.execute_json(req, Operation::Login).await
  }

  /// `POST /auth/logout`
  pub async fn logout(&self) -> Result<()> {
    let req = self.client.post(self.url("/auth/logout"));
    self.execute(req, Operation::Logout).await.map(drop)
  }
}

impl UserApi for ApiClient {
  async fn list_users(&self, page: u32, limit: u32) -> Result<UserPage> {
    ApiClient::list_users(self, page, limit).await
  }

  async fn get_user(&self, id: &str) -> Result<User> {
    ApiClient::get_user(self, id).await
  }

  async fn create_user(&self, payload: &NewUser) -> Result<User> {
    ApiClient::create_user(self, payload).await
  }

  async fn update_user(&self, id: &str, patch: &UserPatch) -> Result<User> {
    ApiClient::update_user(self, id, patch).await
  }
}

impl AuthApi for ApiClient {
  async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
    ApiClient::login(self, email, password).await
  }

  async fn logout(&self) -> Result<()> { ApiClient::logout(self).await }
}
