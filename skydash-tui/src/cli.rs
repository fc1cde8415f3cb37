use clap::{Parser, Subcommand};
use skydash_core::Config;
use tracing_subscriber::EnvFilter;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skydash", version, about = "Weather dashboard TUI")]
pub struct Cli {
    /// Backend base URL; overrides the configured value for this run.
    #[arg(long)]
    pub backend: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the backend base URL in the config file.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        // Nothing is logged unless RUST_LOG asks for it; stderr keeps the
        // alternate screen clean and can be redirected to a file.
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();

        match self.command {
            Some(Command::Configure) => configure(),
            None => {
                let config = Config::load()?;
                let base_url =
                    self.backend.unwrap_or_else(|| config.backend_url().to_string());
                crate::app::run_dashboard(base_url).await
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let url = inquire::Text::new("Backend base URL:")
        .with_default(config.backend_url())
        .prompt()?;

    config.set_backend_url(url.trim().trim_end_matches('/').to_string());
    config.save()?;

    println!("Saved to {}", Config::config_file_path()?.display());
    Ok(())
}
