use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "autopub")]
#[command(author, version, about = "Watch-folder video publishing automation")]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging and progress bars
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub run: RunArgs,

    /// Without a subcommand, process the watch folder once
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Flags for a processing run.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Publish to Xiaohongshu
    #[arg(long)]
    pub pub_xhs: bool,

    /// Publish to Bilibili
    #[arg(long)]
    pub pub_bilibili: bool,

    /// Publish to Douyin
    #[arg(long)]
    pub pub_douyin: bool,

    /// Publish to WeChat Channels
    #[arg(long)]
    pub pub_shipinhao: bool,

    /// Publish to YouTube
    #[arg(long)]
    pub pub_y2b: bool,

    /// Disable publishing to every platform
    #[arg(long)]
    pub no_pub: bool,

    /// Ask the publishing service for a test run
    #[arg(long)]
    pub test: bool,

    /// Reuse existing processed bundles
    #[arg(long)]
    pub use_cache: bool,

    /// Let the processing service reuse cached translations
    #[arg(long)]
    pub use_translation_cache: bool,

    /// Let the processing service reuse cached metadata
    #[arg(long)]
    pub use_metadata_cache: bool,

    /// Comma-separated names (or parts of names) to reprocess
    #[arg(long, value_name = "LIST")]
    pub force: Option<String>,

    /// Process a single file instead of the watch folder
    #[arg(long, value_name = "FILE")]
    pub path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that ffmpeg and ffprobe are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses --config or defaults if not specified)
        #[arg(value_name = "CONFIG")]
        file: Option<PathBuf>,
    },

    /// Print the duration of a video and whether it would be looped
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,
    },

    /// Create data directories and ledgers, and write a config file if missing
    Init,

    /// Display version information
    Version,
}
