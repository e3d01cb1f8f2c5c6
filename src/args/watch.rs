//! `novaflow watch`.

use std::io::IsTerminal;

use novaflow::watch::{self, WatchOptions, WatchTarget};

use super::definition::WatchArgs;
use super::{Context, EXIT_CONFIG, parse_seconds};

/// What: Show the dashboard until the user quits or `--frames` is reached.
///
/// Details:
/// - Raw mode and screen clearing are only used when stdout is a terminal.
pub async fn handle_watch(args: WatchArgs, ctx: &Context) -> i32 {
    let interval = match parse_seconds("--interval", Some(args.interval)) {
        Ok(Some(i)) => i,
        Ok(None) => return EXIT_CONFIG,
        Err(msg) => {
            eprintln!("{msg}");
            return EXIT_CONFIG;
        }
    };
    let targets: Vec<WatchTarget> = args
        .commands
        .iter()
        .map(|c| WatchTarget::new(c.as_str(), c.as_str()))
        .collect();
    let options = WatchOptions {
        title: args.title,
        interval,
        max_frames: args.frames,
        interactive: std::io::stdout().is_terminal(),
    };
    match watch::run(&ctx.runner(), &targets, &options).await {
        Ok(summary) => {
            tracing::info!(frames = summary.frames, reason = ?summary.reason, "[CLI] watch finished");
            0
        }
        Err(e) => {
            eprintln!("{e}");
            EXIT_CONFIG
        }
    }
}
