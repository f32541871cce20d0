//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Upload media to, and download media from, a media library backend.
///
/// Each transfer shows live progress and can be cancelled with Ctrl-C.
#[derive(Parser, Debug)]
#[command(name = "media-transfer")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Backend API base URL, e.g. https://media.example/api
    #[arg(short = 'b', long, env = "MEDIA_BACKEND_URL", global = true)]
    pub backend_url: Option<String>,

    /// Bearer token sent with every request
    #[arg(long, env = "MEDIA_AUTH_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// TCP/TLS connect timeout in seconds (1-3600)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3600), global = true)]
    pub connect_timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Transfer direction.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Download one media file from the backend
    Download {
        /// Path of the media file within the library
        media_path: String,

        /// Directory to save into
        #[arg(short = 'o', long, default_value = ".")]
        output_dir: PathBuf,

        /// Save under this name instead of the server-provided one
        #[arg(long)]
        name: Option<String>,
    },

    /// Upload one or more files to the backend
    Upload {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Destination directory within the library (default: root)
        #[arg(long, default_value = "")]
        dest: String,
    },
}
