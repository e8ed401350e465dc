//! Form drafts and the date normalisation shared by both forms.
//!
//! The forms edit a birth date as a plain calendar date. The API stores an
//! ISO-8601 instant, so on submit the date is turned back into midnight in
//! the operator's time zone. The reconciler relies on this to compare
//! like with like.

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};

use crate::user::{NewUser, Role, User, UserPatch};

// ─── Dates ───────────────────────────────────────────────────────────────────

/// Parse a date typed into a form: ISO (`1990-05-10`) or Brazilian
/// (`10/05/1990`).
pub fn parse_date(s: &str) -> Option<NaiveDate> {
  let s = s.trim();
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .or_else(|_| NaiveDate::parse_from_str(s, "%d/%m/%Y"))
    .ok()
}

/// Midnight of `date` in `tz`, as a UTC ISO string with milliseconds.
///
/// When midnight does not exist locally (a DST gap), the first valid hour of
/// the day is used instead.
pub fn midnight_iso<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> String {
  let instant = (0..24)
    .find_map(|h| tz.from_local_datetime(&date.and_hms_opt(h, 0, 0)?).earliest())
    .map(|local| local.with_timezone(&Utc))
    .unwrap_or_else(|| date.and_time(NaiveTime::MIN).and_utc());
  instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The calendar date (`YYYY-MM-DD`) of an ISO instant as seen from `tz`.
///
/// Strings that are not RFC 3339 fall back to their date prefix.
pub fn date_in_zone<Tz: TimeZone>(iso: &str, tz: &Tz) -> String {
  match DateTime::parse_from_rfc3339(iso) {
    Ok(instant) => instant
      .with_timezone(tz)
      .date_naive()
      .format("%Y-%m-%d")
      .to_string(),
    Err(_) => iso.split('T').next().unwrap_or_default().to_string(),
  }
}

fn non_empty(s: &str) -> Option<String> {
  let s = s.trim();
  (!s.is_empty()).then(|| s.to_string())
}

// ─── Edit form ───────────────────────────────────────────────────────────────

/// Draft of the "edit user" form. Every field is present; the defaults match
/// an empty form before the record arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserForm {
  pub name:       String,
  pub email:      String,
  pub phone:      String,
  /// Calendar date as typed, e.g. `1990-05-10`.
  pub birth_date: String,
  pub avatar:     String,
  pub is_active:  bool,
  pub role:       Role,
}

impl Default for UserForm {
  fn default() -> Self {
    Self {
      name:       String::new(),
      email:      String::new(),
      phone:      String::new(),
      birth_date: String::new(),
      avatar:     String::new(),
      is_active:  true,
      role:       Role::Member,
    }
  }
}

impl UserForm {
  /// Pre-populate the draft from a server record.
  pub fn from_user<Tz: TimeZone>(user: &User, tz: &Tz) -> Self {
    Self {
      name:       user.name.clone(),
      email:      user.email.clone(),
      phone:      user.phone.clone().unwrap_or_default(),
      birth_date: user
        .birth_date
        .as_deref()
        .map(|iso| date_in_zone(iso, tz))
        .unwrap_or_default(),
      avatar:     user.avatar.clone().unwrap_or_default(),
      is_active:  user.is_active,
      role:       user.role,
    }
  }

  /// The draft exactly as typed; this is what the edit schema checks.
  pub fn as_patch(&self) -> UserPatch {
    UserPatch {
      name:       Some(self.name.clone()),
      email:      Some(self.email.clone()),
      phone:      Some(self.phone.clone()),
      birth_date: non_empty(&self.birth_date),
      avatar:     Some(self.avatar.clone()),
      is_active:  Some(self.is_active),
      role:       Some(self.role),
    }
  }

  /// The submitted snapshot: the draft with its birth date reconstructed as
  /// midnight in `tz`. An empty or unreadable date is left out.
  pub fn snapshot<Tz: TimeZone>(&self, tz: &Tz) -> UserPatch {
    UserPatch {
      birth_date: parse_date(&self.birth_date).map(|d| midnight_iso(d, tz)),
      ..self.as_patch()
    }
  }
}

// ─── Create form ─────────────────────────────────────────────────────────────

/// Draft of the "new user" form, held as raw text inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUserForm {
  pub name:       String,
  pub email:      String,
  pub phone:      String,
  pub birth_date: String,
  pub avatar:     String,
  pub password:   String,
  pub role:       String,
}

impl Default for CreateUserForm {
  fn default() -> Self {
    Self {
      name:       String::new(),
      email:      String::new(),
      phone:      String::new(),
      birth_date: String::new(),
      avatar:     String::new(),
      password:   String::new(),
      role:       Role::Member.as_str().to_string(),
    }
  }
}

impl CreateUserForm {
  /// Build the `POST /users` payload. Blank optional inputs are omitted and
  /// new accounts start active.
  pub fn to_new_user<Tz: TimeZone>(&self, tz: &Tz) -> NewUser {
    NewUser {
      name:       self.name.trim().to_string(),
      email:      self.email.trim().to_string(),
      phone:      non_empty(&self.phone),
      birth_date: parse_date(&self.birth_date).map(|d| midnight_iso(d, tz)),
      avatar:     non_empty(&self.avatar),
      password:   non_empty(&self.password),
      is_active:  true,
      role:       Role::parse(&self.role).unwrap_or_default(),
    }
  }
}
