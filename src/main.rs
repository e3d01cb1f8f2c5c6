//! Novaflow binary entrypoint: parse arguments, load settings, start logging
//! and dispatch to the subcommand handler.

mod args;

use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use clap::Parser;
use novaflow::settings::{ConfigPaths, Settings};

/// Log timestamp formatter: `YYYY-MM-DD HH:MM:SS` in local time.
struct NovaflowTimer;

impl tracing_subscriber::fmt::time::FormatTime for NovaflowTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> fmt::Result {
        let ts = chrono::Local::now().format("[%Y-%m-%d %H:%M:%S]").to_string();
        w.write_str(&ts)
    }
}

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// What: Install the tracing subscriber.
///
/// Inputs:
/// - `logs_dir`: Directory receiving `novaflow.log`.
/// - `level`: Default filter when `RUST_LOG` is unset.
///
/// Details:
/// - Falls back to stderr when the log file cannot be opened.
fn init_logging(logs_dir: &Path, level: &str) {
    let env_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level))
    };
    let log_path = logs_dir.join("novaflow.log");
    let _ = std::fs::create_dir_all(logs_dir);
    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_target(false)
                .with_ansi(false)
                .with_writer(non_blocking)
                .with_timer(NovaflowTimer)
                .init();
            let _ = LOG_GUARD.set(guard);
            tracing::info!(path = %log_path.display(), "logging initialized");
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_target(false)
                .with_ansi(true)
                .with_writer(std::io::stderr)
                .with_timer(NovaflowTimer)
                .init();
            tracing::warn!(error = %e, "failed to open log file; using stderr");
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = args::Args::parse();
    let paths = ConfigPaths::from_override(cli.config_dir.as_deref());
    let settings = match Settings::load(&paths.settings_file()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(args::EXIT_CONFIG);
        }
    };
    let level = args::determine_log_level(&cli, &settings.log_level);
    init_logging(&paths.logs_dir(), &level);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config_dir = %paths.root().display(),
        "Novaflow starting"
    );

    let ctx = args::Context { settings, paths };
    let code = args::dispatch(cli.command, &ctx).await;
    tracing::info!(code, "Novaflow exited");
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    /// What: FormatTime impl writes a bracketed timestamp without panicking
    #[test]
    fn novaflow_timer_formats_time() {
        use tracing_subscriber::fmt::time::FormatTime;
        let mut buf = String::new();
        let mut writer = tracing_subscriber::fmt::format::Writer::new(&mut buf);
        let t = super::NovaflowTimer;
        let _ = t.format_time(&mut writer);
        assert!(buf.starts_with('['));
        assert_eq!(buf.len(), "[2026-01-01 00:00:00]".len());
    }
}
