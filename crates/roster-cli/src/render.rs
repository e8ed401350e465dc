//! Plain-text rendering of console views.

use chrono::TimeZone;
use roster_core::{form::date_in_zone, user::User, validate::ValidationErrors};
use roster_sync::{
  forms::{Notice, NoticeKind},
  session::Denial,
  table::{Column, Direction, TableView, UsersTable},
};

/// The user list as an aligned table, followed by the summary line.
pub fn table(view: &TableView, table: &UsersTable, is_fetching: bool) -> String {
  let mut out = String::new();
  out.push_str(&view.page_label());
  out.push('\n');

  if is_fetching && view.rows.is_empty() {
    out.push_str("Carregando usuários...\n");
    return out;
  }

  let headers: Vec<String> = Column::ALL
    .iter()
    .map(|c| match table.sort() {
      Some(sort) if sort.column == *c => {
        let arrow = match sort.direction {
          Direction::Ascending => "↑",
          Direction::Descending => "↓",
        };
        format!("{} {arrow}", c.header())
      }
      _ => c.header().to_string(),
    })
    .collect();
  let cells: Vec<Vec<String>> = view
    .rows
    .iter()
    .map(|u| Column::ALL.iter().map(|c| c.cell(u)).collect())
    .collect();

  let widths: Vec<usize> = (0..Column::ALL.len())
    .map(|i| {
      cells
        .iter()
        .map(|row| row[i].chars().count())
        .chain(std::iter::once(headers[i].chars().count()))
        .max()
        .unwrap_or(0)
    })
    .collect();

  let line = |values: &[String]| {
    values
      .iter()
      .zip(&widths)
      .map(|(v, &w)| format!("{v:<w$}"))
      .collect::<Vec<_>>()
      .join("  ")
      .trim_end()
      .to_string()
  };

  out.push_str(&line(&headers));
  out.push('\n');
  if cells.is_empty() {
    out.push_str("Nenhum usuário encontrado.\n");
  }
  for row in &cells {
    out.push_str(&line(row));
    out.push('\n');
  }

  out.push_str(&view.summary());
  if is_fetching {
    out.push_str(" (atualizando…)");
  }
  let mut nav = Vec::new();
  if view.can_previous {
    nav.push("prev");
  }
  if view.can_next {
    nav.push("next");
  }
  if !nav.is_empty() {
    out.push_str(&format!("  [{}]", nav.join(" | ")));
  }
  out
}

pub fn profile<Tz: TimeZone>(user: &User, tz: &Tz) -> String {
  let optional = |v: Option<&str>| match v {
    Some(s) if !s.is_empty() => s.to_string(),
    _ => "-".to_string(),
  };
  let birth = user.birth_date.as_deref().map(|iso| date_in_zone(iso, tz));
  [
    ("ID", user.id.clone()),
    ("Nome", user.name.clone()),
    ("E-mail", user.email.clone()),
    ("Telefone", optional(user.phone.as_deref())),
    ("Nascimento", optional(birth.as_deref())),
    ("Avatar", optional(user.avatar.as_deref())),
    ("Função", user.role.to_string()),
    ("Ativo", if user.is_active { "sim" } else { "não" }.to_string()),
  ]
  .iter()
  .map(|(label, value)| format!("{label:<11}{value}"))
  .collect::<Vec<_>>()
  .join("\n")
}

pub fn field_errors(errors: &ValidationErrors) -> String {
  errors
    .iter()
    .map(|e| format!("  {}: {}", e.field, e.message))
    .collect::<Vec<_>>()
    .join("\n")
}

pub fn notice(notice: &Notice) -> String {
  match notice.kind {
    NoticeKind::Success => format!("✓ {}", notice.message),
    NoticeKind::Error => format!("✗ {}", notice.message),
  }
}

pub fn denial(denial: &Denial, redirect_secs: u64) -> Option<String> {
  match denial {
    Denial::Clear => None,
    Denial::Denied { message } => Some(format!(
      "Acesso negado: {message}\nRedirecionando para a lista em {redirect_secs} segundos..."
    )),
  }
}
