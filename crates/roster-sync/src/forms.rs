//! Edit and create form controllers.
//!
//! Each controller owns a draft, the field errors of the last rejected
//! submission, and a notice for the user. Remote failures leave the draft
//! untouched so the user can correct it and resubmit.

use std::time::Duration;

use chrono::TimeZone;
use roster_core::{
  Error, Result,
  form::{CreateUserForm, UserForm},
  reconcile::diff,
  service::UserApi,
  user::User,
  validate::{ValidationErrors, validate_create, validate_edit},
};
use tokio::time::Instant;
use tracing::debug;

use crate::queries::UserQueries;

/// How long the "saved" confirmation of the edit form stays visible.
pub const SUCCESS_FLASH: Duration = Duration::from_secs(3);

/// Delay between a successful creation and the create sheet closing.
pub const CLOSE_DELAY: Duration = Duration::from_millis(1500);

pub const CREATED_MESSAGE: &str = "Usuário criado com sucesso!";
pub const UPDATED_MESSAGE: &str = "Usuário atualizado com sucesso!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
  Success,
  Error,
}

/// A one-line banner shown above a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
  pub kind:    NoticeKind,
  pub message: String,
}

impl Notice {
  pub fn success(message: impl Into<String>) -> Self {
    Self {
      kind:    NoticeKind::Success,
      message: message.into(),
    }
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self {
      kind:    NoticeKind::Error,
      message: message.into(),
    }
  }
}

// ─── UserEditor ───────────────────────────────────────────────────────────────

/// Controller of the profile edit form for one user.
pub struct UserEditor<Tz: TimeZone> {
  user_id:       String,
  tz:            Tz,
  record:        Option<User>,
  /// The form inputs.
  pub draft:     UserForm,
  field_errors:  ValidationErrors,
  notice:        Option<Notice>,
  success_until: Option<Instant>,
}

impl<Tz: TimeZone> UserEditor<Tz> {
  /// `tz` is the zone birth dates are displayed and entered in.
  pub fn new(user_id: impl Into<String>, tz: Tz) -> Self {
    Self {
      user_id: user_id.into(),
      tz,
      record: None,
      draft: UserForm::default(),
      field_errors: ValidationErrors::default(),
      notice: None,
      success_until: None,
    }
  }

  pub fn user_id(&self) -> &str { &self.user_id }

  pub fn record(&self) -> Option<&User> { self.record.as_ref() }

  pub fn field_errors(&self) -> &ValidationErrors { &self.field_errors }

  pub fn notice(&self) -> Option<&Notice> { self.notice.as_ref() }

  /// Whether the success confirmation is still showing.
  pub fn showing_success(&self) -> bool {
    self.success_until.is_some_and(|until| Instant::now() < until)
  }

  /// Fetch the record and fill the draft from it.
  ///
  /// Errors are returned untouched so the caller can hand them to the
  /// session gate.
  pub async fn load<S: UserApi + 'static>(&mut self, queries: &UserQueries<S>) -> Result<()> {
    let user = queries.user(&self.user_id).await?;
    self.draft = UserForm::from_user(&user, &self.tz);
    self.record = Some(User::clone(&user));
    self.field_errors = ValidationErrors::default();
    Ok(())
  }

  /// Validate the draft and send whatever changed.
  ///
  /// Returns `Ok(None)` when there was nothing to send, including when the
  /// record has not been loaded yet.
  pub async fn submit<S: UserApi + 'static>(
    &mut self,
    queries: &UserQueries<S>,
  ) -> Result<Option<User>> {
    let Some(record) = self.record.as_ref() else {
      return Ok(None);
    };
    self.notice = None;

    if let Err(errors) = validate_edit(&self.draft.as_patch()) {
      self.field_errors = errors.clone();
      return Err(Error::InvalidForm(errors));
    }
    self.field_errors = ValidationErrors::default();

    let patch = diff(record, &self.draft.snapshot(&self.tz));
    if patch.is_empty() {
      debug!(id = %self.user_id, "no changes to submit");
      return Ok(None);
    }

    match queries.update_user(&self.user_id, &patch).await {
      Ok(updated) => {
        self.draft = UserForm::from_user(&updated, &self.tz);
        self.record = Some(updated.clone());
        self.notice = Some(Notice::success(UPDATED_MESSAGE));
        self.success_until = Some(Instant::now() + SUCCESS_FLASH);
        Ok(Some(updated))
      }
      Err(err) => {
        self.notice = Some(Notice::error(err.to_string()));
        Err(err)
      }
    }
  }
}

// ─── UserCreator ──────────────────────────────────────────────────────────────

/// Controller of the "new user" sheet.
pub struct UserCreator<Tz: TimeZone> {
  tz:           Tz,
  /// The form inputs.
  pub draft:    CreateUserForm,
  field_errors: ValidationErrors,
  notice:       Option<Notice>,
  close_at:     Option<Instant>,
}

impl<Tz: TimeZone> UserCreator<Tz> {
  pub fn new(tz: Tz) -> Self {
    Self {
      tz,
      draft: CreateUserForm::default(),
      field_errors: ValidationErrors::default(),
      notice: None,
      close_at: None,
    }
  }

  pub fn field_errors(&self) -> &ValidationErrors { &self.field_errors }

  pub fn notice(&self) -> Option<&Notice> { self.notice.as_ref() }

  /// Whether the sheet should be closed by now.
  pub fn should_close(&self) -> bool {
    self.close_at.is_some_and(|at| Instant::now() >= at)
  }

  pub async fn submit<S: UserApi + 'static>(&mut self, queries: &UserQueries<S>) -> Result<User> {
    self.notice = None;
    if let Err(errors) = validate_create(&self.draft) {
      self.field_errors = errors.clone();
      return Err(Error::InvalidForm(errors));
    }
    self.field_errors = ValidationErrors::default();

    let payload = self.draft.to_new_user(&self.tz);
    match queries.create_user(&payload).await {
      Ok(user) => {
        self.draft = CreateUserForm::default();
        self.notice = Some(Notice::success(CREATED_MESSAGE));
        self.close_at = Some(Instant::now() + CLOSE_DELAY);
        Ok(user)
      }
      Err(err) => {
        self.notice = Some(Notice::error(err.to_string()));
        Err(err)
      }
    }
  }

  /// Discard the draft and any banner.
  pub fn cancel(&mut self) {
    self.draft = CreateUserForm::default();
    self.field_errors = ValidationErrors::default();
    self.notice = None;
    self.close_at = None;
  }
}
