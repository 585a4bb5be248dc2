//! Tiddly CLI
//!
//! Administrative tools for the tiddly server.
//!
//! # Commands
//!
//! - `pepper` - Generate a new password pepper
//! - `hash-password` - Hash a password with the pepper
//! - `add-user` - Write a user into the user file
//! - `migrate` - Show or apply schema migrations
//! - `inspect` - Display store statistics

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tiddly_sync_server::CONFIG_FILE;
use tracing_subscriber::EnvFilter;

/// Tiddly command-line administration tools.
#[derive(Parser)]
#[command(name = "tiddly")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(global = true, short, long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Path to the database file (overrides the configuration)
    #[arg(global = true, short, long)]
    database: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new random pepper
    Pepper,

    /// Hash a password for the user file
    HashPassword {
        /// The password to hash
        #[arg(short, long)]
        password: String,

        /// Pepper to append (defaults to the configuration's)
        #[arg(long)]
        pepper: Option<String>,

        /// bcrypt cost
        #[arg(long, default_value_t = commands::DEFAULT_COST)]
        cost: u32,
    },

    /// Add a user, or replace an existing user's password hash
    AddUser {
        /// The user's email address
        #[arg(short, long)]
        email: String,

        /// A hash produced by `hash-password`
        #[arg(long, conflicts_with = "password", required_unless_present = "password")]
        hash: Option<String>,

        /// A plain password to hash with the configured pepper
        #[arg(short, long)]
        password: Option<String>,

        /// Directory holding users.json (defaults to the configuration's)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Show or apply schema migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },

    /// Display store statistics
    Inspect {
        /// Recompute the system flag of every tiddler first
        #[arg(long)]
        reclassify: bool,

        /// System title prefix for reclassification (repeatable; replaces the configured set)
        #[arg(long = "prefix", value_name = "PREFIX")]
        prefixes: Vec<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Show the schema version and pending migrations
    Status {
        /// Load migrations from this directory instead of the built-in set
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Apply pending migrations
    Run {
        /// Load migrations from this directory instead of the built-in set
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Show what would be applied without applying it
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = commands::Settings::load(&cli.config, cli.database)?;

    match cli.command {
        Commands::Pepper => commands::credentials::pepper()?,
        Commands::HashPassword {
            password,
            pepper,
            cost,
        } => {
            let pepper = settings.pepper(pepper)?;
            commands::credentials::hash_password(&password, &pepper, cost)?;
        }
        Commands::AddUser {
            email,
            hash,
            password,
            dir,
        } => {
            let config = settings.credential_config(dir);
            commands::credentials::add_user(config, &email, hash, password)?;
        }
        Commands::Migrate { action } => match action {
            MigrateAction::Status { dir } => {
                commands::migrate::status(&settings.database, dir.as_deref())?;
            }
            MigrateAction::Run { dir, dry_run } => {
                commands::migrate::run(&settings.database, dir.as_deref(), dry_run)?;
            }
        },
        Commands::Inspect {
            reclassify,
            prefixes,
            format,
        } => {
            commands::inspect::run(settings.store_config(&prefixes), reclassify, &format)?;
        }
        Commands::Version => {
            println!("Tiddly CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Tiddly Core v{}", tiddly_core::VERSION);
        }
    }

    Ok(())
}
