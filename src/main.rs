//! `storyreel` CLI - Build and list story videos

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod cmd;

#[derive(Parser)]
#[command(name = "storyreel")]
#[command(about = "Assemble narrated story assets into captioned videos")]
#[command(version)]
struct Cli {
    /// Story store root directory
    #[arg(short, long, global = true, default_value = "stories")]
    store: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the final video for a story
    Build {
        /// Story ID (directory name under the store root)
        story_id: String,

        /// Subtitle stream language tag
        #[arg(long, default_value = "eng")]
        language: String,

        /// Maximum words per caption cue
        #[arg(long, default_value = "10")]
        max_words: usize,

        /// Pause (seconds) that closes a caption cue
        #[arg(long, default_value = "0.7")]
        max_gap: f64,

        /// Keep the build's scratch directory for debugging
        #[arg(long)]
        keep_scratch: bool,
    },

    /// List story IDs with a completed final video
    List,

    /// Check that ffmpeg and ffprobe are callable
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            story_id,
            language,
            max_words,
            max_gap,
            keep_scratch,
        } => {
            cmd::build::cmd_build(
                &cli.store,
                &story_id,
                &language,
                max_words,
                max_gap,
                keep_scratch,
            )
            .await?;
        }
        Commands::List => {
            cmd::list::cmd_list(&cli.store).await?;
        }
        Commands::Doctor => {
            cmd::doctor::cmd_doctor().await?;
        }
    }

    Ok(())
}
