//! Fitting Room CLI - Database migrations and credit support tools.
//!
//! # Usage
//!
//! ```bash
//! # Run studio database migrations
//! fr-cli migrate
//!
//! # Show a user's balance
//! fr-cli credits show 6f1c2e9a-3b7d-4c1e-9a2b-1d2e3f4a5b6c
//!
//! # Grant credits after a billing discrepancy
//! fr-cli credits grant 6f1c2e9a-3b7d-4c1e-9a2b-1d2e3f4a5b6c 50
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `credits show` - Print a user's balance
//! - `credits grant` - Add credits to a user's balance

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use fitting_room_core::UserId;

mod commands;

#[derive(Parser)]
#[command(name = "fr-cli")]
#[command(author, version, about = "Fitting Room CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Inspect and adjust credit balances
    Credits {
        #[command(subcommand)]
        action: CreditsAction,
    },
}

#[derive(Subcommand)]
enum CreditsAction {
    /// Print a user's balance (creates the profile if missing)
    Show {
        /// Supabase user ID
        user_id: UserId,
    },
    /// Add credits to a user's balance
    Grant {
        /// Supabase user ID
        user_id: UserId,

        /// Number of credits to add
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        credits: u32,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Credits { action } => match action {
            CreditsAction::Show { user_id } => commands::credits::show(user_id).await?,
            CreditsAction::Grant { user_id, credits } => {
                commands::credits::grant(user_id, credits).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_grant() {
        let cli = Cli::try_parse_from([
            "fr-cli",
            "credits",
            "grant",
            "6f1c2e9a-3b7d-4c1e-9a2b-1d2e3f4a5b6c",
            "50",
        ])
        .expect("parse");

        assert!(matches!(
            cli.command,
            Commands::Credits {
                action: CreditsAction::Grant { credits: 50, .. }
            }
        ));
    }

    #[test]
    fn test_grant_rejects_zero() {
        assert!(
            Cli::try_parse_from([
                "fr-cli",
                "credits",
                "grant",
                "6f1c2e9a-3b7d-4c1e-9a2b-1d2e3f4a5b6c",
                "0",
            ])
            .is_err()
        );
    }

    #[test]
    fn test_rejects_bad_user_id() {
        assert!(Cli::try_parse_from(["fr-cli", "credits", "show", "alice"]).is_err());
    }
}
