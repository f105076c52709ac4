//! Delicious CLI - database migrations and sample data.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations (including the session table)
//! delicious migrate
//!
//! # Load sample stores
//! delicious seed load --file data/stores.json --author-email wes@example.com
//!
//! # Delete all stores
//! delicious seed clear
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "delicious")]
#[command(author, version, about = "Delicious CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Load or clear sample stores
    Seed {
        #[command(subcommand)]
        action: SeedAction,
    },
}

#[derive(Subcommand)]
enum SeedAction {
    /// Load stores from a JSON file
    Load {
        /// Path to the JSON file
        #[arg(short, long, default_value = "data/stores.json")]
        file: String,

        /// Email of the existing user who will own the stores
        #[arg(short, long, env = "SEED_AUTHOR_EMAIL")]
        author_email: String,
    },
    /// Delete every store, with its reviews and hearts
    Clear,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { action } => match action {
            SeedAction::Load { file, author_email } => {
                commands::seed::load(&file, &author_email).await?;
            }
            SeedAction::Clear => {
                commands::seed::clear().await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
