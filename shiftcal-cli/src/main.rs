mod commands;
mod context;
mod render;
mod session_file;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use shiftcal_core::ShiftKind;
use tracing_subscriber::EnvFilter;

use crate::context::Context;

#[derive(Parser)]
#[command(name = "shiftcal")]
#[command(about = "Record your work shifts and export them to your calendar")]
struct Cli {
    /// Use this config file instead of ~/.config/shiftcal/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        #[arg(short, long)]
        email: String,
    },
    /// Create an account
    Signup {
        #[arg(short, long)]
        email: String,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Add the same shift on one or more dates
    Add {
        /// Dates (YYYY-MM-DD)
        #[arg(required = true)]
        dates: Vec<String>,

        /// Also add every day from the last date up to this one (YYYY-MM-DD)
        #[arg(long)]
        through: Option<String>,

        /// day, night or 8hour
        #[arg(short, long, default_value = "day")]
        kind: ShiftKind,

        /// Start time (HH:MM, 24-hour). Defaults to the kind's usual start.
        #[arg(short, long)]
        start: Option<String>,

        /// End time (HH:MM, 24-hour). Defaults to the kind's usual end.
        #[arg(short, long)]
        end: Option<String>,

        /// Mark the shifts as overtime
        #[arg(long)]
        overtime: bool,

        /// Don't ask before adding to dates that already have a shift
        #[arg(short, long)]
        yes: bool,
    },
    /// List your shifts
    List,
    /// Delete a shift by id
    Delete { id: String },
    /// Show which dates already have a shift
    Check {
        #[arg(required = true)]
        dates: Vec<String>,
    },
    /// Download your shifts as an .ics calendar file
    Export {
        /// Where to write the file (defaults to the name the server suggests)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = Context::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Login { email } => commands::auth::login(&ctx, &email).await,
        Commands::Signup { email } => commands::auth::signup(&ctx, &email).await,
        Commands::Logout => commands::auth::logout(&ctx).await,
        Commands::Add {
            dates,
            through,
            kind,
            start,
            end,
            overtime,
            yes,
        } => {
            let args = commands::add::AddArgs {
                dates,
                through,
                kind,
                start,
                end,
                overtime,
                yes,
            };
            commands::add::run(&ctx, args).await
        }
        Commands::List => commands::list::run(&ctx).await,
        Commands::Delete { id } => commands::delete::run(&ctx, &id).await,
        Commands::Check { dates } => commands::check::run(&ctx, &dates).await,
        Commands::Export { output } => commands::export::run(&ctx, output).await,
    }
}
