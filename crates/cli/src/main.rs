//! Appy Link CLI - database migrations, seeding and admin account management.
//!
//! # Usage
//!
//! ```bash
//! # Apply directory and admin migrations
//! appy-cli migrate
//!
//! # Insert the built-in categories and providers into a fresh database
//! appy-cli seed
//!
//! # Create an admin account
//! appy-cli admin create -e admin@appylink.co.uk -r admin
//!
//! # Change an account's role
//! appy-cli admin grant -e editor@appylink.co.uk -r editor
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Insert the built-in directory
//! - `admin create | grant | list` - Manage admin accounts
//! - `tokens purge` - Delete expired sign-in and reset tokens

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "appy-cli")]
#[command(author, version, about = "Appy Link CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Insert the built-in categories and providers
    Seed,
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Sign-in token maintenance
    Tokens {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin account
    Create {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Role (`admin`, `editor`, `viewer`, `none`)
        #[arg(short, long, default_value = "viewer")]
        role: String,

        /// Read a password from stdin instead of relying on magic links
        #[arg(long)]
        password_stdin: bool,
    },
    /// Set or clear an account's role
    Grant {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Role (`admin`, `editor`, `viewer`, `none`)
        #[arg(short, long)]
        role: String,
    },
    /// List all accounts
    List,
}

#[derive(Subcommand)]
enum TokenAction {
    /// Delete tokens that expired more than a day ago
    Purge,
}

#[tokio::main]
async fn main() {
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
        Commands::Seed => {
            commands::seed::run().await?;
        }
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                role,
                password_stdin,
            } => {
                commands::admin::create(&email, &role, password_stdin).await?;
            }
            AdminAction::Grant { email, role } => commands::admin::grant(&email, &role).await?,
            AdminAction::List => commands::admin::list().await?,
        },
        Commands::Tokens { action } => match action {
            TokenAction::Purge => {
                commands::tokens::purge().await?;
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

    #[test]
    fn test_admin_create_defaults_to_viewer() {
        let cli = Cli::try_parse_from(["appy-cli", "admin", "create", "-e", "a@b.co"])
            .expect("parses");
        match cli.command {
            Commands::Admin {
                action:
                    AdminAction::Create {
                        email,
                        role,
                        password_stdin,
                    },
            } => {
                assert_eq!(email, "a@b.co");
                assert_eq!(role, "viewer");
                assert!(!password_stdin);
            }
            _ => panic!("expected admin create"),
        }
    }
}
