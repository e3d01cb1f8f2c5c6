//! Command-line argument definition.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

/// Novaflow - run shell commands the same way on Linux, macOS and Windows
#[derive(Parser, Debug)]
#[command(name = "novaflow")]
#[command(version)]
#[command(about = "Run shell commands the same way on Linux, macOS and Windows", long_about = None)]
pub struct Args {
    /// Configuration directory (default: ~/.config/novaflow)
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Set the logging level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Enable verbose logging (equivalent to --log-level debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one command through the platform shell
    Run(RunArgs),
    /// Run the commands listed in a JSON file
    Batch(BatchArgs),
    /// Manage and run saved custom commands
    Alias {
        /// Alias operation
        #[command(subcommand)]
        action: AliasAction,
    },
    /// Re-run commands on an interval and show their output
    Watch(WatchArgs),
    /// Show the detected platform and shell
    Platform,
    /// Check which common tools are installed
    Tools {
        /// Tools to check (default: a built-in list)
        names: Vec<String>,
    },
}

/// Arguments of `novaflow run`.
#[derive(ClapArgs, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunArgs {
    /// Command line; several words are joined with spaces
    #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,

    /// Capture the output instead of streaming it
    #[arg(long)]
    pub capture: bool,

    /// Kill the command after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<f64>,

    /// Working directory of the command
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Label used in progress messages
    #[arg(short, long)]
    pub description: Option<String>,

    /// Do not echo the command and platform before running
    #[arg(long)]
    pub no_echo: bool,
}

/// Arguments of `novaflow batch`.
#[derive(ClapArgs, Debug)]
pub struct BatchArgs {
    /// JSON file: array of {"command": string | platform map, "description": string}
    pub file: PathBuf,

    /// Launch every command at once
    #[arg(long)]
    pub parallel: bool,

    /// Continue a sequential batch after a failure
    #[arg(long)]
    pub keep_going: bool,

    /// Capture output (default for --parallel)
    #[arg(long)]
    pub capture: bool,

    /// Per-command timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<f64>,
}

/// Operations of `novaflow alias`.
#[derive(Subcommand, Debug)]
pub enum AliasAction {
    /// Save a command under a name
    Add {
        /// Alias name
        name: String,
        /// Command line
        command: String,
        /// Optional description
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Delete a saved command
    Remove {
        /// Alias name
        name: String,
    },
    /// List saved commands
    List,
    /// Search names, commands and descriptions
    Search {
        /// Case-insensitive keyword
        keyword: String,
    },
    /// Run a saved command
    Run {
        /// Alias name
        name: String,
    },
    /// Write all saved commands to a file
    Export {
        /// Destination file
        #[arg(default_value = "custom-commands-backup.json")]
        path: PathBuf,
    },
    /// Merge saved commands from a file
    Import {
        /// Source file (export file or plain map)
        path: PathBuf,
    },
    /// Delete every saved command
    Clear,
}

/// Arguments of `novaflow watch`.
#[derive(ClapArgs, Debug)]
pub struct WatchArgs {
    /// Commands to show, one section each
    #[arg(required = true)]
    pub commands: Vec<String>,

    /// Seconds between refreshes
    #[arg(long, default_value_t = 3.0, value_name = "SECS")]
    pub interval: f64,

    /// Stop after this many refreshes
    #[arg(long, value_name = "N")]
    pub frames: Option<u32>,

    /// Dashboard title
    #[arg(long, default_value = "Real-time Monitoring Dashboard")]
    pub title: String,
}

/// What: Determine the log level from flags and settings.
///
/// Output:
/// - `debug` with `--verbose`, else `--log-level`, else the settings value.
pub fn determine_log_level(args: &Args, configured: &str) -> String {
    if args.verbose {
        "debug".to_string()
    } else {
        args.log_level
            .clone()
            .unwrap_or_else(|| configured.to_string())
    }
}
