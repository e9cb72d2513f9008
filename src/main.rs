use boutique::cli::{Cli, execute_command, init_logger_from_settings, load_and_merge_config};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = load_and_merge_config(&cli)?;
    init_logger_from_settings(&settings)?;
    tracing::debug!(version = boutique::pkg_version(), "Configuration loaded");

    execute_command(&cli, settings).await?;
    Ok(())
}
