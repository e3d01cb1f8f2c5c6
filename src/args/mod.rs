//! Command-line argument parsing and subcommand handlers.

pub mod alias;
pub mod batch;
pub mod definition;
pub mod info;
pub mod run;
pub mod watch;

use std::time::Duration;

use novaflow::exec::{ExecutionResult, Runner};
use novaflow::settings::{ConfigPaths, Settings};

pub use definition::{Args, Command, determine_log_level};

/// Exit code for invalid input or configuration.
pub const EXIT_CONFIG: i32 = 2;

/// Exit code for failures without a child exit code.
pub const EXIT_FAILURE: i32 = 1;

/// What: Loaded settings and paths shared by the handlers.
#[derive(Debug)]
pub struct Context {
    /// Parsed `settings.conf`.
    pub settings: Settings,
    /// Config directory layout.
    pub paths: ConfigPaths,
}

impl Context {
    /// Runner configured from the settings.
    pub fn runner(&self) -> Runner {
        Runner::new(self.settings.runner_config())
    }
}

/// What: Run the selected subcommand.
///
/// Output:
/// - Process exit code.
pub async fn dispatch(command: Command, ctx: &Context) -> i32 {
    match command {
        Command::Run(args) => run::handle_run(args, ctx).await,
        Command::Batch(args) => batch::handle_batch(args, ctx).await,
        Command::Alias { action } => alias::handle_alias(action, ctx).await,
        Command::Watch(args) => watch::handle_watch(args, ctx).await,
        Command::Platform => info::handle_platform(ctx),
        Command::Tools { names } => info::handle_tools(&names),
    }
}

/// What: Map a run result to a process exit code.
///
/// Output:
/// - `0` on success, the child's code when it has one, `1` otherwise.
pub fn exit_code(result: &ExecutionResult) -> i32 {
    if result.success() {
        return 0;
    }
    match result.exit_code() {
        Some(code) if code != 0 => code,
        _ => EXIT_FAILURE,
    }
}

/// What: Parse a `--timeout`/`--interval` value in seconds.
///
/// Output:
/// - `Ok(None)` when absent, the duration when positive and finite, an
///   error message otherwise.
pub fn parse_seconds(flag: &str, value: Option<f64>) -> Result<Option<Duration>, String> {
    let Some(secs) = value else {
        return Ok(None);
    };
    if secs <= 0.0 {
        return Err(format!("{flag} must be greater than zero"));
    }
    Duration::try_from_secs_f64(secs)
        .map(Some)
        .map_err(|e| format!("{flag}: {e}"))
}
