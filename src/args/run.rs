//! `novaflow run`.

use novaflow::exec::{ExecutionRequest, OutputMode, Runner};

use super::definition::RunArgs;
use super::{Context, EXIT_CONFIG, exit_code, parse_seconds};

/// What: Run one command and exit with its status.
///
/// Details:
/// - Capture mode prints the captured stdout after the feedback line, and
///   the captured stderr to stderr.
pub async fn handle_run(args: RunArgs, ctx: &Context) -> i32 {
    let timeout = match parse_seconds("--timeout", args.timeout) {
        Ok(t) => t,
        Err(msg) => {
            eprintln!("{msg}");
            return EXIT_CONFIG;
        }
    };
    let mut config = ctx.settings.runner_config();
    if args.no_echo {
        config.show_command = false;
    }
    let runner = Runner::new(config);

    let mut request = ExecutionRequest::new(args.command.join(" "));
    if args.capture {
        request = request.mode(OutputMode::Capture);
    }
    if let Some(d) = args.description {
        request = request.description(d);
    }
    if let Some(t) = timeout {
        request = request.timeout(t);
    }
    if let Some(dir) = args.cwd {
        request = request.cwd(dir);
    }
    tracing::info!(command = request.command(), capture = args.capture, "[CLI] run");

    let result = runner.run(&request).await;
    if let Some(out) = result.stdout()
        && !out.is_empty()
    {
        println!("{out}");
    }
    if let Some(err) = result.stderr()
        && !err.is_empty()
        && !result.success()
    {
        eprintln!("{err}");
    }
    exit_code(&result)
}
