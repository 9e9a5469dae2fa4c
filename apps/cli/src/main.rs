//! serialnorm CLI: normalize reddit-serialized fiction chapters into clean
//! Markdown, one chapter at a time or a whole corpus incrementally.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
