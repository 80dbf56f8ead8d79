use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use shelf_kernel::settings::Settings;

#[derive(Debug, Parser)]
#[command(name = "shelf", version, about = "Shelf book catalog service")]
struct Cli {
    /// Directory holding `base.toml` and per-environment overlays
    #[arg(long, env = "SHELF_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Environment overlay to load (local, staging, production)
    #[arg(long, env = "SHELF_ENV", default_value = "local")]
    env: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
    /// Print the resolved configuration
    Config,
}

impl Cli {
    fn settings(&self) -> anyhow::Result<Settings> {
        let config_dir = match &self.config_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()
                .context("unable to resolve current directory")?
                .join("config"),
        };
        Settings::load_from(&config_dir, &self.env)
            .with_context(|| "failed to load Shelf settings")
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `.env` must be loaded before clap reads `SHELF_ENV` / `SHELF_CONFIG_DIR`
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = cli.settings()?;
    shelf_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Command::Serve => shelf_app::run(settings).await,
        Command::Migrate => {
            let applied = shelf_app::migrate(&settings).await?;
            tracing::info!(applied, "migrations complete");
            println!("applied {applied} migration(s)");
            Ok(())
        }
        Command::Config => {
            println!("{settings:#?}");
            Ok(())
        }
    }
}
