//! Status-code classification for remote failures.

use reqwest::StatusCode;
use roster_core::Error;
use serde::Deserialize;

/// Banner text for a rejected duplicate e-mail; the server's own message is
/// not shown for this case.
pub const DUPLICATE_EMAIL: &str = "E-mail já está em uso.";

/// The remote operation a response belongs to. Classification and fallback
/// messages depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
  ListUsers,
  GetUser,
  CreateUser,
  UpdateUser,
  Login,
  Logout,
}

impl Operation {
  /// Message used when the server does not provide one.
  pub fn fallback(self) -> &'static str {
    match self {
      Self::ListUsers => "Erro ao buscar os usuários",
      Self::GetUser => "Erro ao carregar usuário.",
      Self::CreateUser => "Erro ao criar usuário.",
      Self::UpdateUser => "Erro ao atualizar usuário",
      Self::Login => "Falha ao realizar login",
      Self::Logout => "Falha ao realizar logout",
    }
  }

  /// Map a non-success response to the error taxonomy.
  pub fn classify(self, status: StatusCode, message: Option<String>) -> Error {
    match (self, status) {
      (Self::CreateUser, StatusCode::BAD_REQUEST) => Error::ValidationFailed(
        message.unwrap_or_else(|| "Dados inválidos.".to_string()),
      ),
      (Self::CreateUser, StatusCode::CONFLICT) => {
        Error::DuplicateEmail(DUPLICATE_EMAIL.to_string())
      }
      (Self::GetUser, StatusCode::FORBIDDEN) => Error::AccessDenied(
        message.unwrap_or_else(|| "Acesso negado".to_string()),
      ),
      (op, status) => Error::remote(
        Some(status.as_u16()),
        message.unwrap_or_else(|| op.fallback().to_string()),
      ),
    }
  }
}

/// The API reports errors as `{"message": "..."}`; validation failures may
/// carry a list of messages instead.
#[derive(Deserialize)]
struct ErrorBody {
  message: Option<MessageField>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MessageField {
  One(String),
  Many(Vec<String>),
}

/// Extract the server-provided message from an error body, if any.
pub(crate) fn server_message(body: &[u8]) -> Option<String> {
  let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
  let message = match parsed.message? {
    MessageField::One(m) => m,
    MessageField::Many(ms) => ms.join("; "),
  };
  (!message.trim().is_empty()).then_some(message)
}

/// A request that never produced a usable response.
pub(crate) fn transport(op: Operation, err: reqwest::Error) -> Error {
  if err.is_decode() {
    return Error::remote(
      err.status().map(|s| s.as_u16()),
      format!("invalid response body: {err}"),
    );
  }
  tracing::warn!(operation = ?op, error = %err, "transport failure");
  Error::NetworkUnavailable(err.to_string())
}
