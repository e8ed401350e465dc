//! Client-side validation schemas for the create and edit forms.
//!
//! Both are advisory gates run before submission; the server remains the
//! authority and its rejections are surfaced separately.

use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::Serialize;
use url::Url;

use crate::{
  form::{CreateUserForm, parse_date},
  user::{Role, UserPatch},
};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid e-mail pattern")
});

/// Brazilian mobile or landline: optional `+55`, two-digit area code, then
/// four or five digits, optional dash, four digits.
static PHONE_BR: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(\+55\s?)?(\d{2})\s?\d{4,5}-?\d{4}$")
    .expect("valid phone pattern")
});

const PASSWORD_MIN: usize = 6;

// ─── Result types ────────────────────────────────────────────────────────────

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
  /// Wire name of the field (`name`, `birthDate`, …).
  pub field:   &'static str,
  pub message: &'static str,
}

/// Every rejected field of a form, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
  fn push(&mut self, field: &'static str, message: &'static str) {
    self.0.push(FieldError { field, message });
  }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn iter(&self) -> impl Iterator<Item = &FieldError> { self.0.iter() }

  /// The message attached to `field`, if it was rejected.
  pub fn get(&self, field: &str) -> Option<&'static str> {
    self.0.iter().find(|e| e.field == field).map(|e| e.message)
  }

  fn into_result(self) -> Result<(), Self> {
    if self.is_empty() { Ok(()) } else { Err(self) }
  }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, e) in self.0.iter().enumerate() {
      if i > 0 {
        f.write_str("; ")?;
      }
      write!(f, "{}: {}", e.field, e.message)?;
    }
    Ok(())
  }
}

// ─── Field rules ─────────────────────────────────────────────────────────────

fn is_email(s: &str) -> bool { EMAIL.is_match(s.trim()) }

fn is_phone(s: &str) -> bool { PHONE_BR.is_match(s.trim()) }

fn is_url(s: &str) -> bool { Url::parse(s.trim()).is_ok() }

/// Only the spellings the form can turn back into an instant.
fn is_date(s: &str) -> bool { parse_date(s).is_some() }

/// Empty optional strings count as "not provided".
fn provided(value: Option<&str>) -> Option<&str> {
  value.filter(|v| !v.trim().is_empty())
}

// ─── Schemas ─────────────────────────────────────────────────────────────────

/// Schema for the "new user" form. `name`, `email` and `role` are required.
pub fn validate_create(form: &CreateUserForm) -> Result<(), ValidationErrors> {
  let mut errors = ValidationErrors::default();

  if form.name.trim().is_empty() {
    errors.push("name", "Nome é obrigatório");
  }
  if !is_email(&form.email) {
    errors.push("email", "E-mail inválido");
  }
  if provided(Some(&form.phone)).is_some_and(|p| !is_phone(p)) {
    errors.push("phone", "Telefone deve ser um número brasileiro válido");
  }
  if provided(Some(&form.birth_date)).is_some_and(|d| !is_date(d)) {
    errors.push("birthDate", "Data inválida");
  }
  if provided(Some(&form.avatar)).is_some_and(|a| !is_url(a)) {
    errors.push("avatar", "URL inválida");
  }
  if provided(Some(&form.password))
    .is_some_and(|p| p.chars().count() < PASSWORD_MIN)
  {
    errors.push("password", "Mínimo 6 caracteres");
  }
  if Role::parse(&form.role).is_none() {
    errors.push("role", "Função inválida");
  }

  errors.into_result()
}

/// Schema for the edit form: the same field rules, every field optional.
pub fn validate_edit(patch: &UserPatch) -> Result<(), ValidationErrors> {
  let mut errors = ValidationErrors::default();

  if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
    errors.push("name", "Nome é obrigatório");
  }
  if patch.email.as_deref().is_some_and(|e| !is_email(e)) {
    errors.push("email", "E-mail inválido");
  }
  if provided(patch.phone.as_deref()).is_some_and(|p| !is_phone(p)) {
    errors.push("phone", "Telefone deve ser um número brasileiro válido");
  }
  if provided(patch.birth_date.as_deref()).is_some_and(|d| !is_date(d)) {
    errors.push("birthDate", "Data inválida");
  }
  if provided(patch.avatar.as_deref()).is_some_and(|a| !is_url(a)) {
    errors.push("avatar", "URL inválida");
  }

  errors.into_result()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn valid_create() -> CreateUserForm {
    CreateUserForm {
      name: "Maria Souza".into(),
      email: "maria@sistema.com".into(),
      ..CreateUserForm::default()
    }
  }

  #[test]
  fn minimal_create_form_passes() {
    assert_eq!(validate_create(&valid_create()), Ok(()));
  }

  #[test]
  fn create_requires_name_and_email() {
    let form = CreateUserForm::default();
    let errors = validate_create(&form).unwrap_err();
    assert_eq!(errors.get("name"), Some("Nome é obrigatório"));
    assert_eq!(errors.get("email"), Some("E-mail inválido"));
    assert_eq!(errors.len(), 2);
  }

  #[test]
  fn brazilian_phone_formats() {
    for ok in [
      "11999998888",
      "11 99999-8888",
      "+55 11 99999-8888",
      "+5511999998888",
      "1133334444",
      "11 3333-4444",
    ] {
      assert!(is_phone(ok), "{ok} should be accepted");
    }
    for bad in ["999998888", "(11) 99999-8888", "abc", "+1 11 99999-8888"] {
      assert!(!is_phone(bad), "{bad} should be rejected");
    }
  }

  #[test]
  fn create_rejects_bad_optional_fields() {
    let form = CreateUserForm {
      phone: "123".into(),
      avatar: "not a url".into(),
      password: "12345".into(),
      birth_date: "31/02/1990".into(),
      role: "OWNER".into(),
      ..valid_create()
    };
    let errors = validate_create(&form).unwrap_err();
    let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
    assert_eq!(
      fields,
      vec!["phone", "birthDate", "avatar", "password", "role"]
    );
    assert_eq!(errors.get("password"), Some("Mínimo 6 caracteres"));
  }

  #[test]
  fn empty_optional_fields_are_not_provided() {
    let form = CreateUserForm {
      phone: String::new(),
      avatar: String::new(),
      password: String::new(),
      ..valid_create()
    };
    assert_eq!(validate_create(&form), Ok(()));
  }

  #[test]
  fn edit_allows_any_subset() {
    assert_eq!(validate_edit(&UserPatch::default()), Ok(()));
    let patch = UserPatch {
      phone: Some(String::new()),
      avatar: Some("https://i.pravatar.cc/150?u=1".into()),
      birth_date: Some("1990-05-10".into()),
      ..UserPatch::default()
    };
    assert_eq!(validate_edit(&patch), Ok(()));
  }

  #[test]
  fn edit_rejects_dates_the_form_cannot_submit() {
    for typed in ["10/05/1990", "1990-05-10"] {
      let patch = UserPatch {
        birth_date: Some(typed.into()),
        ..UserPatch::default()
      };
      assert_eq!(validate_edit(&patch), Ok(()), "{typed}");
    }
    let patch = UserPatch {
      birth_date: Some("1990-05-10T00:00:00Z".into()),
      ..UserPatch::default()
    };
    let errors = validate_edit(&patch).unwrap_err();
    assert_eq!(errors.get("birthDate"), Some("Data inválida"));
  }

  #[test]
  fn edit_applies_field_rules_when_present() {
    let patch = UserPatch {
      name: Some("  ".into()),
      email: Some("nope".into()),
      phone: Some("12".into()),
      ..UserPatch::default()
    };
    let errors = validate_edit(&patch).unwrap_err();
    assert_eq!(errors.len(), 3);
    assert_eq!(
      errors.to_string(),
      "name: Nome é obrigatório; email: E-mail inválido; phone: Telefone \
       deve ser um número brasileiro válido"
    );
  }
}
