use clap::Parser;
use fetchbatch::app;
use fetchbatch::cli::{Cli, Commands};
use fetchbatch::config::Settings;
use fetchbatch::observability::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_tracing();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config)?;

    match cli.command {
        Commands::Download(args) => {
            app::run_download(settings, args).await?;
        }
        Commands::Check(args) => {
            app::run_check(settings, args).await?;
        }
    }

    Ok(())
}
