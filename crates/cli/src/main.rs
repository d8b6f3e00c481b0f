//! Emporium CLI - Database migrations and maintenance tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! emporium-cli migrate
//!
//! # Inspect and maintain accounts
//! emporium-cli users list
//! emporium-cli users prune-unverified --older-than-hours 48
//! emporium-cli users promote --email admin@example.com
//!
//! # Purge expired verification and revoked tokens
//! emporium-cli tokens cleanup
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "emporium-cli")]
#[command(author, version, about = "Emporium CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage users
    Users {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Token housekeeping
    Tokens {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// List the newest users
    List {
        /// Maximum number of users to show
        #[arg(short, long, default_value_t = 50)]
        limit: i64,
    },
    /// Delete accounts that never verified their email
    PruneUnverified {
        /// Only delete accounts older than this many hours
        #[arg(long, default_value_t = 24)]
        older_than_hours: u32,
    },
    /// Grant the admin role to an existing user
    Promote {
        /// Email address of the user
        #[arg(short, long)]
        email: String,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Delete expired verification tokens and stale revocations
    Cleanup,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Users { action } => match action {
            UserAction::List { limit } => commands::users::list(limit).await?,
            UserAction::PruneUnverified { older_than_hours } => {
                commands::users::prune_unverified(older_than_hours).await?;
            }
            UserAction::Promote { email } => commands::users::promote(&email).await?,
        },
        Commands::Tokens { action } => match action {
            TokenAction::Cleanup => commands::tokens::cleanup().await?,
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

    #[test]
    fn test_prune_defaults_to_one_day() {
        let cli = Cli::try_parse_from(["emporium-cli", "users", "prune-unverified"])
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(matches!(
            cli.command,
            Commands::Users {
                action: UserAction::PruneUnverified {
                    older_than_hours: 24
                }
            }
        ));
    }
}
