//! Console configuration.

use std::{path::Path, time::Duration};

use anyhow::Context as _;
use roster_client::ApiConfig;
use roster_sync::session::{GateTimings, LogoutPolicy};
use serde::Deserialize;

/// Settings read from `roster.toml`, `ROSTER_*` variables and flags, in
/// increasing order of precedence.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleConfig {
  #[serde(default = "default_api_url")]
  pub api_url:            String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs:       u64,
  /// Pause between login and the first list render.
  #[serde(default = "default_settle_delay_ms")]
  pub settle_delay_ms:    u64,
  #[serde(default = "default_denial_redirect_ms")]
  pub denial_redirect_ms: u64,
  #[serde(default)]
  pub logout_policy:      LogoutPolicy,
}

fn default_api_url() -> String { "http://localhost:3000".to_string() }

fn default_timeout_secs() -> u64 { 30 }

fn default_settle_delay_ms() -> u64 { 1000 }

fn default_denial_redirect_ms() -> u64 { 3000 }

/// Values given on the command line, which win over every other source.
#[derive(Debug, Default)]
pub struct Overrides {
  pub api_url:      Option<String>,
  pub timeout_secs: Option<u32>,
}

impl ConsoleConfig {
  pub fn load(path: &Path, overrides: Overrides) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("ROSTER"))
      .set_override_option("api_url", overrides.api_url)?
      .set_override_option("timeout_secs", overrides.timeout_secs.map(i64::from))?
      .build()
      .with_context(|| format!("failed to read config from {}", path.display()))?;

    settings
      .try_deserialize()
      .context("failed to deserialise ConsoleConfig")
  }

  pub fn api(&self) -> ApiConfig {
    ApiConfig {
      base_url: self.api_url.clone(),
      timeout:  Duration::from_secs(self.timeout_secs),
    }
  }

  pub fn timings(&self) -> GateTimings {
    GateTimings {
      settle_delay:    Duration::from_millis(self.settle_delay_ms),
      denial_redirect: Duration::from_millis(self.denial_redirect_ms),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_apply_without_a_file() {
    let cfg = ConsoleConfig::load(Path::new("does-not-exist.toml"), Overrides::default())
      .unwrap();
    assert_eq!(cfg.timeout_secs, 30);
    assert_eq!(cfg.logout_policy, LogoutPolicy::ClearAlways);
    assert_eq!(cfg.timings(), GateTimings::default());
  }

  #[test]
  fn flags_win() {
    let cfg = ConsoleConfig::load(
      Path::new("does-not-exist.toml"),
      Overrides {
        api_url:      Some("http://api.test".into()),
        timeout_secs: Some(5),
      },
    )
    .unwrap();
    assert_eq!(cfg.api().base_url, "http://api.test");
    assert_eq!(cfg.api().timeout, Duration::from_secs(5));
  }
}
