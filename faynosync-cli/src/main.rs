use anyhow::Result;
use clap::Parser;

use faynosync_cli::app::App;
use faynosync_cli::cli::Cli;
use faynosync_cli::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    logging::init_tracing(&cli.log_level)?;

    let input = tokio::io::BufReader::new(tokio::io::stdin());
    let mut app = App::new(input, std::io::stdout());
    app.run(cli).await?;

    Ok(())
}
