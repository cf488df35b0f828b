//! Glide CLI - Headless player toolkit
//!
//! Features:
//! - Media id extraction from source URLs
//! - Session record inspection
//! - Related-content listing against a catalog file
//! - Drag, fling and snap simulation
//! - Scripted minimize/restore hand-off against in-memory hosts

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;

use output::OutputFormat;

/// Glide CLI - Playback continuity toolkit
#[derive(Parser)]
#[command(name = "glide-cli")]
#[command(author = "Purple Squirrel Media")]
#[command(version)]
#[command(about = "Inspect and simulate Glide player hand-offs", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    format: OutputFormat,

    /// Player configuration overrides (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract provider media ids from source URLs
    Extract {
        /// Source URLs
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Inspect a stored session record
    Session {
        /// File holding the session JSON
        file: PathBuf,

        /// Evaluate freshness at this epoch-millisecond time instead of now
        #[arg(long)]
        now: Option<u64>,
    },

    /// List related videos for a catalog entry
    Related {
        /// Catalog JSON file
        #[arg(long)]
        catalog: PathBuf,

        /// Video slug
        slug: String,
    },

    /// Simulate dragging the floating window and releasing it
    Fling {
        /// Window position before the drag, as x,y
        #[arg(long, default_value = "20,20")]
        from: String,

        /// Pointer displacement, as dx,dy
        #[arg(long)]
        by: String,

        /// Gesture duration in milliseconds
        #[arg(long, default_value = "100")]
        duration: u64,

        /// Viewport, as WIDTHxHEIGHT
        #[arg(long, default_value = "1280x720")]
        viewport: String,

        /// Use touch input (rubber-band and fling) instead of the mouse
        #[arg(long)]
        touch: bool,
    },

    /// Run a scripted minimize and restore round trip
    Handoff {
        /// Catalog JSON file
        #[arg(long)]
        catalog: PathBuf,

        /// Video slug
        slug: String,

        /// Playback position when minimizing, in seconds
        #[arg(long, default_value = "42")]
        at: f64,

        /// Volume set before minimizing
        #[arg(long, default_value = "80")]
        volume: u8,

        /// Mute before minimizing
        #[arg(long)]
        muted: bool,

        /// Seconds spent in the floating player before restoring
        #[arg(long, default_value = "5")]
        floating_for: u64,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "info" };
    if cli.log_json {
        tracing_subscriber::fmt().json().with_env_filter(level).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(level).init();
    }
    glide_core::init();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Extract { urls } => {
            commands::extract(&urls, cli.format)?;
        }
        Commands::Session { file, now } => {
            commands::session(&file, now, &config, cli.format)?;
        }
        Commands::Related { catalog, slug } => {
            commands::related(&catalog, &slug, &config, cli.format)?;
        }
        Commands::Fling { from, by, duration, viewport, touch } => {
            commands::fling(&from, &by, duration, &viewport, touch, &config, cli.format)?;
        }
        Commands::Handoff { catalog, slug, at, volume, muted, floating_for } => {
            let script = commands::HandoffScript { slug, at, volume, muted, floating_for };
            commands::handoff(&catalog, script, config, cli.format).await?;
        }
    }

    Ok(())
}
