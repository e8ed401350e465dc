//! View-model for the paginated user list.
//!
//! Pagination is server-side: the table only tracks `page` and `limit` and
//! turns them into a [`UsersKey`]. Sorting and the e-mail filter apply to
//! the rows of the current page only.

use std::cmp::Ordering;

use roster_core::user::{User, UserPage};

use crate::queries::UsersKey;

/// Page sizes offered by the list.
pub const PAGE_SIZES: [u32; 6] = [5, 10, 15, 20, 25, 30];

pub const DEFAULT_PAGE_SIZE: u32 = 10;

// ─── Columns ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
  Id,
  Name,
  Email,
  Role,
  Phone,
}

impl Column {
  pub const ALL: [Column; 5] = [
    Column::Id,
    Column::Name,
    Column::Email,
    Column::Role,
    Column::Phone,
  ];

  pub fn header(&self) -> &'static str {
    match self {
      Self::Id => "ID",
      Self::Name => "Nome",
      Self::Email => "Email",
      Self::Role => "Função",
      Self::Phone => "Telefone",
    }
  }

  /// Accepts the English field name or the header, case-insensitively.
  pub fn parse(s: &str) -> Option<Self> {
    let s = s.trim().to_lowercase();
    Self::ALL.into_iter().find(|c| {
      c.header().to_lowercase() == s || format!("{c:?}").to_lowercase() == s
    })
  }

  /// Display text of this column for `user`.
  pub fn cell(&self, user: &User) -> String {
    match self {
      Self::Id => user.id.clone(),
      Self::Name => user.name.clone(),
      Self::Email => user.email.to_lowercase(),
      Self::Role => user.role.as_str().to_string(),
      Self::Phone => match user.phone.as_deref() {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => "-".to_string(),
      },
    }
  }

  fn compare(&self, a: &User, b: &User) -> Ordering {
    let key = |u: &User| match self {
      Self::Phone => u.phone.clone().unwrap_or_default(),
      _ => self.cell(u).to_lowercase(),
    };
    key(a).cmp(&key(b))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  Ascending,
  Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
  pub column:    Column,
  pub direction: Direction,
}

// ─── TableView ────────────────────────────────────────────────────────────────

/// Everything needed to draw one frame of the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
  /// Rows of the current page after filtering and sorting.
  pub rows:         Vec<User>,
  pub page:         u32,
  pub total_pages:  u32,
  pub total_items:  u64,
  /// Items the server returned for this page, before filtering.
  pub current_len:  usize,
  pub can_previous: bool,
  pub can_next:     bool,
}

impl TableView {
  pub fn summary(&self) -> String {
    format!("{} usuários exibidos de {}", self.current_len, self.total_items)
  }

  pub fn page_label(&self) -> String {
    format!("Página {} de {}", self.page, self.total_pages)
  }
}

// ─── UsersTable ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsersTable {
  page:         u32,
  limit:        u32,
  sort:         Option<Sort>,
  email_filter: String,
}

impl Default for UsersTable {
  fn default() -> Self {
    Self {
      page:         1,
      limit:        DEFAULT_PAGE_SIZE,
      sort:         None,
      email_filter: String::new(),
    }
  }
}

impl UsersTable {
  pub fn new() -> Self { Self::default() }

  pub fn page(&self) -> u32 { self.page }

  pub fn limit(&self) -> u32 { self.limit }

  pub fn sort(&self) -> Option<Sort> { self.sort }

  pub fn email_filter(&self) -> &str { &self.email_filter }

  pub fn query_key(&self) -> UsersKey {
    UsersKey {
      page:  self.page,
      limit: self.limit,
    }
  }

  // ── Pagination ────────────────────────────────────────────────────────────

  /// Change the page size. Sizes outside [`PAGE_SIZES`] are rejected.
  /// Any change of size returns to the first page.
  pub fn set_limit(&mut self, limit: u32) -> bool {
    if !PAGE_SIZES.contains(&limit) {
      return false;
    }
    self.limit = limit;
    self.page = 1;
    true
  }

  pub fn can_previous(&self) -> bool { self.page > 1 }

  pub fn can_next(&self, total_pages: u32) -> bool { self.page < total_pages }

  pub fn next_page(&mut self, total_pages: u32) -> bool {
    if !self.can_next(total_pages) {
      return false;
    }
    self.page += 1;
    true
  }

  pub fn previous_page(&mut self) -> bool {
    if !self.can_previous() {
      return false;
    }
    self.page -= 1;
    true
  }

  // ── Sorting and filtering ─────────────────────────────────────────────────

  /// Unsorted or descending becomes ascending; ascending becomes descending.
  pub fn toggle_sort(&mut self, column: Column) {
    let direction = match self.sort {
      Some(Sort {
        column: current,
        direction: Direction::Ascending,
      }) if current == column => Direction::Descending,
      _ => Direction::Ascending,
    };
    self.sort = Some(Sort { column, direction });
  }

  pub fn clear_sort(&mut self) { self.sort = None; }

  pub fn set_email_filter(&mut self, filter: impl Into<String>) {
    self.email_filter = filter.into();
  }

  // ── View ──────────────────────────────────────────────────────────────────

  pub fn view(&self, page: Option<&UserPage>) -> TableView {
    let total_pages = page.map_or(1, |p| p.meta.total_pages);
    let total_items = page.map_or(0, |p| p.meta.total);
    let current_len = page.map_or(0, |p| p.data.len());

    let needle = self.email_filter.trim().to_lowercase();
    let mut rows: Vec<User> = page
      .map(|p| p.data.as_slice())
      .unwrap_or_default()
      .iter()
      .filter(|u| needle.is_empty() || u.email.to_lowercase().contains(&needle))
      .cloned()
      .collect();

    if let Some(Sort { column, direction }) = self.sort {
      rows.sort_by(|a, b| {
        let ord = column.compare(a, b);
        match direction {
          Direction::Ascending => ord,
          Direction::Descending => ord.reverse(),
        }
      });
    }

    TableView {
      rows,
      page: self.page,
      total_pages,
      total_items,
      current_len,
      can_previous: self.can_previous(),
      can_next: self.can_next(total_pages),
    }
  }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
