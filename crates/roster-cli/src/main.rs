//! `roster`: interactive console for the user-management API.
//!
//! # Usage
//!
//! ```
//! roster --url http://localhost:3000
//! roster --config ~/.config/roster/roster.toml
//! ```
//!
//! Logs go to stderr; set `RUST_LOG=roster_sync=debug` to watch the cache.

mod app;
mod command;
mod render;
mod settings;

use std::{
  io::{self, Write as _},
  path::PathBuf,
};

use anyhow::Context as _;
use app::{ChannelNavigator, Console, Flow};
use clap::Parser;
use command::ParseError;
use roster_client::ApiClient;
use tokio::{
  io::{AsyncBufReadExt, BufReader},
  sync::mpsc,
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::{ConsoleConfig, Overrides};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "roster", about = "Console for the user-management API")]
struct Args {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE", default_value = "roster.toml")]
  config: PathBuf,

  /// Base URL of the API.
  #[arg(long)]
  url: Option<String>,

  /// Request timeout in seconds.
  #[arg(long, value_name = "SECS")]
  timeout: Option<u32>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();
  let config = ConsoleConfig::load(
    &args.config,
    Overrides {
      api_url:      args.url,
      timeout_secs: args.timeout,
    },
  )?;

  let client = ApiClient::new(config.api()).context("failed to build HTTP client")?;
  tracing::info!(api = %client.base_url(), "console starting");

  let (tx, mut routes) = mpsc::unbounded_channel();
  let mut console = Console::new(client, ChannelNavigator::new(tx), &config);
  let mut lines = BufReader::new(tokio::io::stdin()).lines();

  println!("Digite `help` para ver os comandos.");
  loop {
    print!("{}", console.prompt());
    io::stdout().flush().ok();

    tokio::select! {
      line = lines.next_line() => {
        let Some(line) = line.context("failed to read stdin")? else {
          break;
        };
        match command::parse(&line) {
          Ok(cmd) => {
            if console.execute(cmd).await == Flow::Quit {
              break;
            }
          }
          Err(ParseError::Empty) => {}
          Err(err) => println!("{err}"),
        }
      }
      Some(route) = routes.recv() => {
        println!();
        console.arrive(route).await;
      }
    }
  }

  Ok(())
}
