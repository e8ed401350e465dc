//! Partial-update reconciler: server record + edited snapshot → minimal patch.
//!
//! Only fields the snapshot carries are considered, and only those whose
//! value actually differs from the record are sent. Fields the form never
//! touched stay out of the payload, so concurrent server-side changes to them
//! are not clobbered.

use chrono::DateTime;

use crate::user::{User, UserPatch};

/// Compute the fields of `snapshot` that differ from `record`.
///
/// An empty result means there is nothing to send.
pub fn diff(record: &User, snapshot: &UserPatch) -> UserPatch {
  UserPatch {
    name:       changed(&snapshot.name, |v| *v == record.name),
    email:      changed(&snapshot.email, |v| *v == record.email),
    phone:      changed(&snapshot.phone, |v| {
      text_matches(v, record.phone.as_deref())
    }),
    birth_date: changed(&snapshot.birth_date, |v| {
      instants_match(v, record.birth_date.as_deref())
    }),
    avatar:     changed(&snapshot.avatar, |v| {
      text_matches(v, record.avatar.as_deref())
    }),
    is_active:  changed(&snapshot.is_active, |v| *v == record.is_active),
    role:       changed(&snapshot.role, |v| *v == record.role),
  }
}

/// `Some(new)` when the snapshot carries a value that does not match.
fn changed<T: Clone>(new: &Option<T>, same: impl Fn(&T) -> bool) -> Option<T> {
  new.as_ref().filter(|v| !same(v)).cloned()
}

/// An absent optional string on the record is shown as `""` by the form, so
/// the two are the same value.
fn text_matches(new: &str, old: Option<&str>) -> bool {
  new == old.unwrap_or_default()
}

/// Dates are compared as instants so that `…T03:00:00Z` and
/// `…T03:00:00.000Z` are not reported as a change.
fn instants_match(new: &str, old: Option<&str>) -> bool {
  let Some(old) = old else {
    return false;
  };
  match (
    DateTime::parse_from_rfc3339(new),
    DateTime::parse_from_rfc3339(old),
  ) {
    (Ok(a), Ok(b)) => a == b,
    _ => new == old,
  }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use chrono::FixedOffset;

  use super::*;
  use crate::{form::UserForm, user::Role};

  fn brt() -> FixedOffset { FixedOffset::west_opt(3 * 3600).unwrap() }

  fn record() -> User {
    User {
      id:         "7f1c".into(),
      name:       "João Silva".into(),
      email:      "joao@sistema.com".into(),
      phone:      Some("11999998888".into()),
      birth_date: Some("1990-05-10T03:00:00.000Z".into()),
      avatar:     Some("https://i.pravatar.cc/150?u=joao".into()),
      role:       Role::Member,
      is_active:  true,
      created_at: Some("2024-01-01T12:00:00.000Z".into()),
      updated_at: Some("2024-01-01T12:00:00.000Z".into()),
    }
  }

  #[test]
  fn identical_snapshot_is_empty() {
    let user = record();
    let snapshot = UserForm::from_user(&user, &brt()).snapshot(&brt());
    assert!(diff(&user, &snapshot).is_empty());
  }

  #[test]
  fn every_single_field_change_is_isolated() {
    let user = record();
    let base = UserForm::from_user(&user, &brt());
    let edits: Vec<(&str, Box<dyn Fn(&mut UserForm)>)> = vec![
      ("name", Box::new(|f: &mut UserForm| f.name = "João S.".into())),
      ("email", Box::new(|f: &mut UserForm| f.email = "js@sistema.com".into())),
      ("phone", Box::new(|f: &mut UserForm| f.phone = "21988887777".into())),
      ("birthDate", Box::new(|f: &mut UserForm| f.birth_date = "1990-05-11".into())),
      ("avatar", Box::new(|f: &mut UserForm| f.avatar = "https://x.io/a.png".into())),
      ("isActive", Box::new(|f: &mut UserForm| f.is_active = false)),
      ("role", Box::new(|f: &mut UserForm| f.role = Role::Admin)),
    ];
    for (field, edit) in edits {
      let mut form = base.clone();
      edit(&mut form);
      let patch = diff(&user, &form.snapshot(&brt()));
      assert_eq!(patch.field_names(), vec![field], "editing {field}");
    }
  }

  #[test]
  fn changed_value_is_carried() {
    let user = record();
    let mut form = UserForm::from_user(&user, &brt());
    form.birth_date = "1990-05-11".into();
    let patch = diff(&user, &form.snapshot(&brt()));
    assert_eq!(patch.birth_date.as_deref(), Some("1990-05-11T03:00:00.000Z"));
  }

  #[test]
  fn reformatted_date_is_not_a_change() {
    let user = record();
    let mut form = UserForm::from_user(&user, &brt());
    form.birth_date = "10/05/1990".into();
    assert!(diff(&user, &form.snapshot(&brt())).is_empty());

    // Same instant, different precision on the server side.
    let terse = User {
      birth_date: Some("1990-05-10T03:00:00Z".into()),
      ..record()
    };
    assert!(diff(&terse, &form.snapshot(&brt())).is_empty());
  }

  #[test]
  fn clearing_phone_sends_empty_string() {
    let user = record();
    let mut form = UserForm::from_user(&user, &brt());
    form.phone = String::new();
    let patch = diff(&user, &form.snapshot(&brt()));
    assert_eq!(
      patch,
      UserPatch {
        phone: Some(String::new()),
        ..UserPatch::default()
      }
    );
  }

  #[test]
  fn absent_optional_text_matches_empty_input() {
    let user = User {
      phone: None,
      avatar: None,
      ..record()
    };
    let snapshot = UserForm::from_user(&user, &brt()).snapshot(&brt());
    assert!(diff(&user, &snapshot).is_empty());
  }

  #[test]
  fn absent_snapshot_fields_are_never_sent() {
    let user = record();
    let snapshot = UserPatch {
      name: Some("Outro".into()),
      ..UserPatch::default()
    };
    assert_eq!(diff(&user, &snapshot).field_names(), vec!["name"]);
  }

  #[test]
  fn new_birth_date_on_record_without_one() {
    let user = User {
      birth_date: None,
      ..record()
    };
    let mut form = UserForm::from_user(&user, &brt());
    assert_eq!(form.birth_date, "");
    form.birth_date = "2000-01-01".into();
    let patch = diff(&user, &form.snapshot(&brt()));
    assert_eq!(patch.birth_date.as_deref(), Some("2000-01-01T03:00:00.000Z"));
  }
}
