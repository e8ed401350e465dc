//! REPL command parsing.

use roster_core::{
  form::{CreateUserForm, UserForm},
  user::Role,
};
use roster_sync::table::Column;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
  Login { email: String, password: String },
  Logout,
  Whoami,
  List,
  Next,
  Prev,
  Limit(u32),
  Sort(Column),
  Unsort,
  Filter(String),
  Show(String),
  Edit { id: String, fields: Vec<(String, String)> },
  Create(Vec<(String, String)>),
  Focus,
  Gc,
  Help,
  Quit,
}

impl Command {
  /// Commands that need a session cookie before they are attempted.
  pub fn is_protected(&self) -> bool {
    matches!(
      self,
      Self::List
        | Self::Next
        | Self::Prev
        | Self::Limit(_)
        | Self::Sort(_)
        | Self::Unsort
        | Self::Filter(_)
        | Self::Show(_)
        | Self::Edit { .. }
        | Self::Create(_)
    )
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
  #[error("empty line")]
  Empty,
  #[error("comando desconhecido: {0} (digite `help`)")]
  Unknown(String),
  #[error("uso: {0}")]
  Usage(&'static str),
  #[error("aspas não fechadas")]
  UnterminatedQuote,
  #[error("esperado campo=valor, recebido `{0}`")]
  BadAssignment(String),
  #[error("coluna desconhecida: {0}")]
  UnknownColumn(String),
  #[error("campo desconhecido: {0}")]
  UnknownField(String),
  #[error("valor inválido para {field}: {value}")]
  BadValue { field: String, value: String },
}

pub const HELP: &str = "\
login <email> <senha>        entrar
logout                       sair
whoami                       usuário da sessão
list                         página atual de usuários
next | prev                  página seguinte / anterior
limit <5|10|15|20|25|30>     itens por página
sort <coluna>                ordenar (id, nome, email, função, telefone)
unsort                       remover ordenação
filter [texto]               filtrar por e-mail na página atual
show <id>                    ver perfil
edit <id> campo=valor…       editar (name, email, phone, birthDate, avatar, isActive, role)
create campo=valor…          criar (name, email, phone, birthDate, avatar, password, role)
focus                        simular retorno do foco
gc                           coletar entradas expiradas do cache
help                         esta ajuda
quit                         sair do console";

/// Parse one input line.
pub fn parse(line: &str) -> Result<Command, ParseError> {
  let words = tokenize(line)?;
  let Some((head, rest)) = words.split_first() else {
    return Err(ParseError::Empty);
  };

  let command = match (head.to_lowercase().as_str(), rest) {
    ("login", [email, password]) => Command::Login {
      email:    email.clone(),
      password: password.clone(),
    },
    ("login", _) => return Err(ParseError::Usage("login <email> <senha>")),
    ("logout", []) => Command::Logout,
    ("whoami", []) => Command::Whoami,
    ("list" | "ls", []) => Command::List,
    ("next" | "n", []) => Command::Next,
    ("prev" | "p", []) => Command::Prev,
    ("limit", [n]) => Command::Limit(n.parse().map_err(|_| ParseError::BadValue {
      field: "limit".into(),
      value: n.clone(),
    })?),
    ("limit", _) => return Err(ParseError::Usage("limit <n>")),
    ("sort", [column]) => Command::Sort(
      Column::parse(column).ok_or_else(|| ParseError::UnknownColumn(column.clone()))?,
    ),
    ("sort", _) => return Err(ParseError::Usage("sort <coluna>")),
    ("unsort", []) => Command::Unsort,
    ("filter", words) => Command::Filter(words.join(" ")),
    ("show", [id]) => Command::Show(id.clone()),
    ("show", _) => return Err(ParseError::Usage("show <id>")),
    ("edit", [id, fields @ ..]) if !fields.is_empty() => Command::Edit {
      id:     id.clone(),
      fields: assignments(fields)?,
    },
    ("edit", _) => return Err(ParseError::Usage("edit <id> campo=valor…")),
    ("create", fields) if !fields.is_empty() => Command::Create(assignments(fields)?),
    ("create", _) => return Err(ParseError::Usage("create campo=valor…")),
    ("focus", []) => Command::Focus,
    ("gc", []) => Command::Gc,
    ("help" | "?", _) => Command::Help,
    ("quit" | "exit", _) => Command::Quit,
    (other, _) => return Err(ParseError::Unknown(other.to_string())),
  };
  Ok(command)
}

/// Split on whitespace; double quotes group words and may appear mid-word
/// (`name="Ana Lima"`).
fn tokenize(line: &str) -> Result<Vec<String>, ParseError> {
  let mut words = Vec::new();
  let mut current = String::new();
  let mut in_word = false;
  let mut quoted = false;

  for c in line.chars() {
    match c {
      '"' => {
        quoted = !quoted;
        in_word = true;
      }
      c if c.is_whitespace() && !quoted => {
        if in_word {
          words.push(std::mem::take(&mut current));
          in_word = false;
        }
      }
      c => {
        current.push(c);
        in_word = true;
      }
    }
  }
  if quoted {
    return Err(ParseError::UnterminatedQuote);
  }
  if in_word {
    words.push(current);
  }
  Ok(words)
}

fn assignments(words: &[String]) -> Result<Vec<(String, String)>, ParseError> {
  words
    .iter()
    .map(|w| match w.split_once('=') {
      Some((field, value)) if !field.is_empty() => Ok((field.to_string(), value.to_string())),
      _ => Err(ParseError::BadAssignment(w.clone())),
    })
    .collect()
}

// ─── Field assignment ─────────────────────────────────────────────────────────

fn bad_value(field: &str, value: &str) -> ParseError {
  ParseError::BadValue {
    field: field.to_string(),
    value: value.to_string(),
  }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, ParseError> {
  match value.to_lowercase().as_str() {
    "true" | "sim" | "yes" | "1" => Ok(true),
    "false" | "não" | "nao" | "no" | "0" => Ok(false),
    _ => Err(bad_value(field, value)),
  }
}

/// Apply `field=value` to an edit draft. Field names are the wire names.
pub fn apply_edit(form: &mut UserForm, field: &str, value: &str) -> Result<(), ParseError> {
  match field {
    "name" => form.name = value.to_string(),
    "email" => form.email = value.to_string(),
    "phone" => form.phone = value.to_string(),
    "birthDate" => form.birth_date = value.to_string(),
    "avatar" => form.avatar = value.to_string(),
    "isActive" => form.is_active = parse_bool(field, value)?,
    "role" => form.role = Role::parse(value).ok_or_else(|| bad_value(field, value))?,
    other => return Err(ParseError::UnknownField(other.to_string())),
  }
  Ok(())
}

/// Apply `field=value` to a create draft. Values are checked by the schema
/// on submit, not here.
pub fn apply_create(
  form: &mut CreateUserForm,
  field: &str,
  value: &str,
) -> Result<(), ParseError> {
  let slot = match field {
    "name" => &mut form.name,
    "email" => &mut form.email,
    "phone" => &mut form.phone,
    "birthDate" => &mut form.birth_date,
    "avatar" => &mut form.avatar,
    "password" => &mut form.password,
    "role" => &mut form.role,
    other => return Err(ParseError::UnknownField(other.to_string())),
  };
  *slot = value.to_string();
  Ok(())
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
      .iter()
      .map(|(f, v)| (f.to_string(), v.to_string()))
      .collect()
  }

  #[test]
  fn simple_commands() {
    assert_eq!(parse("  list "), Ok(Command::List));
    assert_eq!(parse("NEXT"), Ok(Command::Next));
    assert_eq!(parse("limit 25"), Ok(Command::Limit(25)));
    assert_eq!(parse("sort telefone"), Ok(Command::Sort(Column::Phone)));
    assert_eq!(parse("filter"), Ok(Command::Filter(String::new())));
    assert_eq!(parse("filter @sistema"), Ok(Command::Filter("@sistema".into())));
    assert_eq!(parse("quit"), Ok(Command::Quit));
    assert_eq!(
      parse("login admin@sistema.com secret123"),
      Ok(Command::Login {
        email:    "admin@sistema.com".into(),
        password: "secret123".into(),
      })
    );
  }

  #[test]
  fn usage_errors() {
    assert_eq!(parse(""), Err(ParseError::Empty));
    assert_eq!(parse("   "), Err(ParseError::Empty));
    assert!(matches!(parse("login only-email"), Err(ParseError::Usage(_))));
    assert!(matches!(parse("show"), Err(ParseError::Usage(_))));
    assert!(matches!(parse("edit u-1"), Err(ParseError::Usage(_))));
    assert!(matches!(parse("limit ten"), Err(ParseError::BadValue { .. })));
    assert_eq!(parse("sort avatar"), Err(ParseError::UnknownColumn("avatar".into())));
    assert_eq!(parse("frobnicate"), Err(ParseError::Unknown("frobnicate".into())));
  }

  #[test]
  fn quoted_assignments() {
    assert_eq!(
      parse(r#"edit u-1 name="João da Silva" phone="#),
      Ok(Command::Edit {
        id:     "u-1".into(),
        fields: fields(&[("name", "João da Silva"), ("phone", "")]),
      })
    );
    assert_eq!(
      parse(r#"create "name=Ana Lima" email=ana@sistema.com"#),
      Ok(Command::Create(fields(&[
        ("name", "Ana Lima"),
        ("email", "ana@sistema.com"),
      ])))
    );
    assert_eq!(parse(r#"create name="Ana"#), Err(ParseError::UnterminatedQuote));
    assert_eq!(
      parse("create nome"),
      Err(ParseError::BadAssignment("nome".into()))
    );
  }

  #[test]
  fn protected_commands() {
    assert!(Command::List.is_protected());
    assert!(Command::Show("u-1".into()).is_protected());
    assert!(Command::Create(vec![]).is_protected());
    assert!(!Command::Whoami.is_protected());
    assert!(!Command::Focus.is_protected());
  }

  #[test]
  fn edit_fields() {
    let mut form = UserForm::default();
    apply_edit(&mut form, "isActive", "não").unwrap();
    apply_edit(&mut form, "role", "admin").unwrap();
    apply_edit(&mut form, "birthDate", "10/05/1990").unwrap();
    assert!(!form.is_active);
    assert_eq!(form.role, Role::Admin);
    assert_eq!(form.birth_date, "10/05/1990");
    assert!(matches!(
      apply_edit(&mut form, "role", "owner"),
      Err(ParseError::BadValue { .. })
    ));
    assert_eq!(
      apply_edit(&mut form, "password", "x"),
      Err(ParseError::UnknownField("password".into()))
    );
  }

  #[test]
  fn create_fields() {
    let mut form = CreateUserForm::default();
    apply_create(&mut form, "password", "secret1").unwrap();
    apply_create(&mut form, "role", "ADMIN").unwrap();
    assert_eq!(form.password, "secret1");
    assert_eq!(form.role, "ADMIN");
    assert!(apply_create(&mut form, "isActive", "true").is_err());
  }
}
