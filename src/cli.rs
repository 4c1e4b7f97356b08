// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines the deploy and create subcommands and global output flags.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use fastack::config::DEFAULT_SERVER;

#[derive(Parser)]
#[command(name = "fastack")]
#[command(about = "Package a project directory and deploy it to a fastack server")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print the final result
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print JSON lines instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Package a directory and deploy it
    Deploy {
        /// Project directory (defaults to the current directory)
        directory: Option<PathBuf>,

        /// App to deploy (overrides fastack.json)
        #[arg(short, long)]
        app: Option<String>,

        /// RPC endpoint of the fastack server
        #[arg(long, env = "FASTACK_SERVER", default_value = DEFAULT_SERVER)]
        server: String,

        /// Skip unreadable files instead of failing
        #[arg(long)]
        lenient: bool,

        /// Stream file contents into the archive instead of reading them whole
        #[arg(long)]
        stream: bool,

        /// Do not compare the client version with the server's
        #[arg(long)]
        skip_version_check: bool,

        /// Maximum number of directories listed concurrently
        #[arg(long, default_value_t = fastack::walk::DEFAULT_MAX_CONCURRENCY)]
        max_concurrency: usize,
    },

    /// Create a fastack.json in the current directory
    Create {
        /// Name of the app
        app_name: Option<String>,

        /// Overwrite an existing fastack.json
        #[arg(short, long)]
        force: bool,
    },
}
