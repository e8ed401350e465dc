//! User records and the payloads exchanged with the user-management API.
//!
//! Field names follow the API's camelCase JSON. Server-owned fields (`id`,
//! `createdAt`, `updatedAt`) appear only on [`User`]; the write payloads
//! ([`NewUser`], [`UserPatch`]) cannot express them.

use std::fmt;

use serde::{Deserialize, Serialize};

// ─── Role ────────────────────────────────────────────────────────────────────

/// Access level of an account.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
  Admin,
  #[default]
  Member,
}

impl Role {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Admin => "ADMIN",
      Self::Member => "MEMBER",
    }
  }

  /// Parse the wire spelling (`ADMIN` / `MEMBER`), case-insensitively.
  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_ascii_uppercase().as_str() {
      "ADMIN" => Some(Self::Admin),
      "MEMBER" => Some(Self::Member),
      _ => None,
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── User ────────────────────────────────────────────────────────────────────

/// A user account as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  /// Opaque, server-assigned, immutable.
  pub id:         String,
  pub name:       String,
  pub email:      String,
  #[serde(default)]
  pub phone:      Option<String>,
  /// ISO-8601 date-time string.
  #[serde(default)]
  pub birth_date: Option<String>,
  #[serde(default)]
  pub avatar:     Option<String>,
  pub role:       Role,
  pub is_active:  bool,
  #[serde(default)]
  pub created_at: Option<String>,
  #[serde(default)]
  pub updated_at: Option<String>,
}

// ─── Listing ─────────────────────────────────────────────────────────────────

/// Pagination metadata attached to a list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
  pub total:       u64,
  pub page:        u32,
  pub limit:       u32,
  pub total_pages: u32,
}

/// One page of `GET /users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPage {
  pub data: Vec<User>,
  pub meta: PageMeta,
}

// ─── Write payloads ──────────────────────────────────────────────────────────

/// Body of `POST /users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
  pub name:       String,
  pub email:      String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub phone:      Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub birth_date: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub avatar:     Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub password:   Option<String>,
  pub is_active:  bool,
  pub role:       Role,
}

impl NewUser {
  /// A payload with only the required fields; active member by default.
  pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
    Self {
      name:       name.into(),
      email:      email.into(),
      phone:      None,
      birth_date: None,
      avatar:     None,
      password:   None,
      is_active:  true,
      role:       Role::default(),
    }
  }
}

/// Body of `PUT /users/:id`. A `None` field is absent from the JSON and left
/// untouched by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name:       Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email:      Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub phone:      Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub birth_date: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub avatar:     Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub is_active:  Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub role:       Option<Role>,
}

impl UserPatch {
  pub fn is_empty(&self) -> bool { *self == Self::default() }

  /// Names of the fields this patch would send, in wire spelling.
  pub fn field_names(&self) -> Vec<&'static str> {
    [
      ("name", self.name.is_some()),
      ("email", self.email.is_some()),
      ("phone", self.phone.is_some()),
      ("birthDate", self.birth_date.is_some()),
      ("avatar", self.avatar.is_some()),
      ("isActive", self.is_active.is_some()),
      ("role", self.role.is_some()),
    ]
    .into_iter()
    .filter_map(|(name, present)| present.then_some(name))
    .collect()
  }
}

// ─── Authentication ──────────────────────────────────────────────────────────

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
  pub email:    String,
  pub password: String,
}

/// The minimal projection of a user kept while a session is active.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
  pub name:   String,
  pub email:  String,
  #[serde(default)]
  pub avatar: Option<String>,
}

impl From<&User> for SessionIdentity {
  fn from(user: &User) -> Self {
    Self {
      name:   user.name.clone(),
      email:  user.email.clone(),
      avatar: user.avatar.clone(),
    }
  }
}

/// Response of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
  #[serde(default)]
  pub message:       String,
  pub user:          SessionIdentity,
  pub access_token:  String,
  pub refresh_token: String,
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn user_reads_camel_case_and_nulls() {
    let user: User = serde_json::from_value(json!({
      "id": "u-1",
      "name": "Ana",
      "email": "ana@sistema.com",
      "phone": null,
      "birthDate": "1990-05-10T03:00:00.000Z",
      "role": "ADMIN",
      "isActive": true,
      "createdAt": "2024-01-01T00:00:00.000Z",
      "updatedAt": "2024-01-02T00:00:00.000Z"
    }))
    .unwrap();
    assert_eq!(user.role, Role::Admin);
    assert_eq!(user.phone, None);
    assert_eq!(user.avatar, None);
    assert_eq!(user.birth_date.as_deref(), Some("1990-05-10T03:00:00.000Z"));
  }

  #[test]
  fn patch_omits_absent_fields() {
    let patch = UserPatch {
      phone: Some(String::new()),
      is_active: Some(false),
      ..UserPatch::default()
    };
    let value = serde_json::to_value(&patch).unwrap();
    assert_eq!(value, json!({ "phone": "", "isActive": false }));
    assert_eq!(patch.field_names(), vec!["phone", "isActive"]);
  }

  #[test]
  fn new_user_defaults_to_active_member() {
    let value = serde_json::to_value(NewUser::new("Ana", "ana@x.com")).unwrap();
    assert_eq!(
      value,
      json!({
        "name": "Ana",
        "email": "ana@x.com",
        "isActive": true,
        "role": "MEMBER"
      })
    );
  }

  #[test]
  fn login_response_projects_identity() {
    let resp: LoginResponse = serde_json::from_value(json!({
      "message": "ok",
      "user": { "name": "Admin", "email": "admin@sistema.com", "avatar": "https://i.pravatar.cc/150" },
      "accessToken": "a",
      "refreshToken": "r"
    }))
    .unwrap();
    assert_eq!(resp.user.email, "admin@sistema.com");
    assert_eq!(resp.access_token, "a");
  }
}
