mod api;
mod app;
mod cache;
mod config;
mod logging;
mod pages;
mod query;
mod retry;

use clap::{ArgAction, Parser};
use color_eyre::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "wellpulse")]
#[command(about = "A terminal client for the employee well-being backend")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./wellpulse.yaml, then $XDG_CONFIG_HOME/wellpulse/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Backend base URL, overrides the config file and WELLPULSE_API_URL
  #[arg(long, global = true)]
  api_url: Option<String>,

  /// Write logs to this file instead of stderr
  #[arg(long, global = true)]
  log_file: Option<PathBuf>,

  /// More log output (-v info, -vv debug, -vvv trace)
  #[arg(short, long, action = ArgAction::Count, global = true)]
  verbose: u8,

  #[command(subcommand)]
  command: app::Command,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let _log_guard = logging::init(args.verbose, args.log_file.as_deref())?;

  // Load configuration, command line wins
  let config = config::Config::load(args.config.as_deref())?.with_api_url(args.api_url);

  let app = app::App::new(&config)?;
  app.run(args.command).await?;

  Ok(())
}
