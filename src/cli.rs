use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::language::DEFAULT_LANGUAGE;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web form
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        addr: Option<String>,

        /// Port to bind (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Dub a single video file
    Dub {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Target language display name, e.g. "French"
        #[arg(short, long, default_value = DEFAULT_LANGUAGE)]
        language: String,

        /// Regenerate mouth movement with Wav2Lip
        #[arg(long)]
        lip_sync: bool,

        /// Copy the dubbed video into this directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Dub all video files in a directory
    Batch {
        /// Input directory containing video files
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Target language display name
        #[arg(short, long, default_value = DEFAULT_LANGUAGE)]
        language: String,

        /// Regenerate mouth movement with Wav2Lip
        #[arg(long)]
        lip_sync: bool,
    },

    /// List supported target languages and their voices
    Languages,

    /// Check that the external tools are installed
    Check,

    /// Write the default configuration to a file
    InitConfig {
        /// Destination file
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
