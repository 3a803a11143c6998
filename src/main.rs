mod api;
mod app;
mod cache;
mod commands;
mod config;
mod event;
mod logging;
mod nav;
mod query;
mod ui;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "castly")]
#[command(about = "A terminal browser for Rick and Morty characters")]
#[command(version)]
struct Args {
  /// Location to open, e.g. "/?page=2&name=rick" or "/character/1"
  #[arg(default_value = "/")]
  location: String,

  /// Path to config file (default: $XDG_CONFIG_HOME/castly/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// API base URL, overrides the config file and CASTLY_BASE_URL
  #[arg(long)]
  base_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let _guard = logging::init()?;

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;

  // Override base URL if specified on command line
  let config = match args.base_url {
    Some(base_url) => config.with_base_url(base_url),
    None => config,
  };

  let start = nav::NavState::parse(&args.location)
    .map_err(|e| eyre!("Invalid location {:?}: {}", args.location, e))?;

  // Initialize and run the app
  let mut app = app::App::new(config, start)?;
  app.run().await?;

  Ok(())
}
