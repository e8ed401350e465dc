//! Console state and command dispatcher.

use std::sync::Arc;

use chrono::Local;
use roster_client::ApiClient;
use roster_core::{Error, user::UserPage};
use roster_sync::{
  UserQueries, UsersKey,
  cache::Subscription,
  forms::{UserCreator, UserEditor},
  session::{Navigator, Route, SessionGate},
  table::UsersTable,
};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::{
  command::{self, Command, HELP},
  render,
  settings::ConsoleConfig,
};

// ─── Navigator ────────────────────────────────────────────────────────────────

/// Forwards navigation requests to the REPL loop.
pub struct ChannelNavigator(UnboundedSender<Route>);

impl ChannelNavigator {
  pub fn new(tx: UnboundedSender<Route>) -> Self { Self(tx) }
}

impl Navigator for ChannelNavigator {
  fn navigate(&self, route: Route) {
    if self.0.send(route).is_err() {
      debug!(?route, "navigation after console shutdown");
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
  Continue,
  Quit,
}

// ─── Console ──────────────────────────────────────────────────────────────────

/// Top-level console state.
pub struct Console {
  /// Shared HTTP client; its cookie jar is the session credential.
  client:        Arc<ApiClient>,
  queries:       UserQueries<ApiClient>,
  gate:          SessionGate<ApiClient, ChannelNavigator>,
  table:         UsersTable,
  /// Keeps the visible list page observed so invalidation and focus
  /// refetch it.
  list_watch:    Option<Subscription<UsersKey, UserPage>>,
  /// Current view.
  pub route:     Route,
  redirect_secs: u64,
}

impl Console {
  pub fn new(client: ApiClient, navigator: ChannelNavigator, config: &ConsoleConfig) -> Self {
    let client = Arc::new(client);
    let gate = SessionGate::with_options(
      Arc::clone(&client),
      Arc::new(navigator),
      config.timings(),
      config.logout_policy,
    );
    Self {
      queries: UserQueries::new(Arc::clone(&client)),
      client,
      gate,
      table: UsersTable::new(),
      list_watch: None,
      route: Route::Login,
      redirect_secs: config.denial_redirect_ms.div_ceil(1000),
    }
  }

  pub fn prompt(&self) -> String { format!("roster:{}> ", self.route.path()) }

  /// Handle a navigation request from the session gate.
  pub async fn arrive(&mut self, route: Route) {
    self.route = route;
    match route {
      Route::Landing if self.client.has_session_credential() => self.list().await,
      Route::Landing => {}
      Route::Login => println!("Faça login com `login <email> <senha>`."),
    }
  }

  pub async fn execute(&mut self, command: Command) -> Flow {
    if command.is_protected() && !self.client.has_session_credential() {
      println!("Sessão necessária. Faça login para continuar.");
      self.route = Route::Login;
      return Flow::Continue;
    }

    match command {
      Command::Login { email, password } => self.login(&email, &password).await,
      Command::Logout => self.logout().await,
      Command::Whoami => match self.gate.identity() {
        Some(identity) => println!("{} <{}>", identity.name, identity.email),
        None => println!("Nenhuma sessão ativa."),
      },
      Command::List => self.list().await,
      Command::Next => {
        if self.table.next_page(self.total_pages()) {
          self.list().await;
        } else {
          println!("Já está na última página.");
        }
      }
      Command::Prev => {
        if self.table.previous_page() {
          self.list().await;
        } else {
          println!("Já está na primeira página.");
        }
      }
      Command::Limit(limit) => {
        if self.table.set_limit(limit) {
          self.list().await;
        } else {
          println!("Tamanho de página inválido: {limit} (use 5, 10, 15, 20, 25 ou 30).");
        }
      }
      Command::Sort(column) => {
        self.table.toggle_sort(column);
        self.list().await;
      }
      Command::Unsort => {
        self.table.clear_sort();
        self.list().await;
      }
      Command::Filter(text) => {
        self.table.set_email_filter(text);
        self.list().await;
      }
      Command::Show(id) => self.show(&id).await,
      Command::Edit { id, fields } => self.edit(&id, &fields).await,
      Command::Create(fields) => self.create(&fields).await,
      Command::Focus => println!("{} consulta(s) recarregada(s).", self.queries.refocus()),
      Command::Gc => println!("{} entrada(s) removida(s) do cache.", self.queries.collect_garbage()),
      Command::Help => println!("{HELP}"),
      Command::Quit => return Flow::Quit,
    }
    Flow::Continue
  }

  // ── Session ───────────────────────────────────────────────────────────────

  async fn login(&mut self, email: &str, password: &str) {
    println!("Entrando...");
    match self.gate.login(email, password).await {
      Ok(response) => println!("{} Bem-vindo, {}.", response.message, response.user.name),
      Err(err) => println!("✗ {err}"),
    }
  }

  async fn logout(&mut self) {
    let result = self.gate.logout().await;
    if !self.gate.is_authenticated() {
      self.list_watch = None;
      self.queries.reset();
    }
    match result {
      Ok(()) => println!("Sessão encerrada."),
      Err(err) => println!("⚠ Falha ao encerrar a sessão no servidor: {err}"),
    }
  }

  // ── List ──────────────────────────────────────────────────────────────────

  fn total_pages(&self) -> u32 {
    let key = self.table.query_key();
    self
      .queries
      .users_snapshot(key.page, key.limit)
      .and_then(|s| s.data)
      .map_or(1, |page| page.meta.total_pages)
  }

  async fn list(&mut self) {
    let key = self.table.query_key();
    if self.list_watch.as_ref().is_none_or(|w| *w.key() != key) {
      self.list_watch = Some(self.queries.watch_users(key.page, key.limit));
    }
    self.route = Route::Landing;

    match self.queries.users(key.page, key.limit).await {
      Ok(page) => {
        let fetching = self
          .queries
          .users_snapshot(key.page, key.limit)
          .is_some_and(|s| s.is_fetching);
        println!("{}", render::table(&self.table.view(Some(&page)), &self.table, fetching));
      }
      Err(err) => println!("Erro ao carregar os dados: {err}"),
    }
  }

  // ── Profile ───────────────────────────────────────────────────────────────

  /// Load `id` into a fresh editor, routing a denial to the gate.
  async fn open(&mut self, id: &str) -> Option<UserEditor<Local>> {
    self.gate.clear_denial();
    let mut editor = UserEditor::new(id, Local);
    match editor.load(&self.queries).await {
      Ok(()) => Some(editor),
      Err(err) => {
        if self.gate.observe_profile_error(&err) {
          if let Some(banner) = render::denial(&self.gate.denial(), self.redirect_secs) {
            println!("{banner}");
          }
        } else {
          println!("✗ {err}");
        }
        None
      }
    }
  }

  async fn show(&mut self, id: &str) {
    if let Some(editor) = self.open(id).await
      && let Some(user) = editor.record()
    {
      println!("{}", render::profile(user, &Local));
    }
  }

  async fn edit(&mut self, id: &str, fields: &[(String, String)]) {
    let Some(mut editor) = self.open(id).await else {
      return;
    };
    for (field, value) in fields {
      if let Err(err) = command::apply_edit(&mut editor.draft, field, value) {
        println!("✗ {err}");
        return;
      }
    }

    match editor.submit(&self.queries).await {
      Ok(None) => println!("Nenhuma alteração para salvar."),
      Ok(Some(user)) => {
        if let Some(notice) = editor.notice() {
          println!("{}", render::notice(notice));
        }
        println!("{}", render::profile(&user, &Local));
      }
      Err(Error::InvalidForm(_)) => {
        println!("Corrija os campos:");
        println!("{}", render::field_errors(editor.field_errors()));
      }
      Err(_) => {
        if let Some(notice) = editor.notice() {
          println!("{}", render::notice(notice));
        }
      }
    }
  }

  async fn create(&mut self, fields: &[(String, String)]) {
    let mut creator = UserCreator::new(Local);
    for (field, value) in fields {
      if let Err(err) = command::apply_create(&mut creator.draft, field, value) {
        println!("✗ {err}");
        return;
      }
    }

    let result = creator.submit(&self.queries).await;
    if let Err(Error::InvalidForm(_)) = result {
      println!("Corrija os campos:");
      println!("{}", render::field_errors(creator.field_errors()));
      return;
    }
    if let Some(notice) = creator.notice() {
      println!("{}", render::notice(notice));
    }
    if let Ok(user) = result {
      println!("ID: {}", user.id);
    }
  }
}
