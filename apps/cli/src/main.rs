//! leadkit CLI: import lead spreadsheets and enrich the stored leads.
//!
//! Parses and validates CSV uploads, imports the valid rows with duplicate
//! detection, and runs gender, email-verification, and message actions
//! against the local lead database.

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
