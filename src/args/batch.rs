//! `novaflow batch`.

use std::path::Path;

use novaflow::batch::{BatchItem, BatchRequest, Sequencer};
use novaflow::exec::{ExecOptions, OutputMode};

use super::definition::BatchArgs;
use super::{Context, EXIT_CONFIG, EXIT_FAILURE, parse_seconds};

/// What: Read batch items from a JSON file.
///
/// Output:
/// - Items in file order, or a message describing why the file is unusable.
pub fn read_items(path: &Path) -> Result<Vec<BatchItem>, String> {
    let body = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    serde_json::from_str(&body).map_err(|e| format!("invalid batch file {}: {e}", path.display()))
}

/// What: Run the batch file and exit `0` only when every command succeeded.
pub async fn handle_batch(args: BatchArgs, ctx: &Context) -> i32 {
    let items = match read_items(&args.file) {
        Ok(items) => items,
        Err(msg) => {
            tracing::error!(file = %args.file.display(), "[CLI] {msg}");
            eprintln!("{msg}");
            return EXIT_CONFIG;
        }
    };
    let timeout = match parse_seconds("--timeout", args.timeout) {
        Ok(t) => t,
        Err(msg) => {
            eprintln!("{msg}");
            return EXIT_CONFIG;
        }
    };

    let mut request = if args.parallel {
        let mut req = BatchRequest::parallel(items);
        if let Some(limit) = ctx.settings.parallel_limit() {
            req = req.max_concurrency(limit);
        }
        req
    } else {
        BatchRequest::sequential(items).stop_on_error(!args.keep_going)
    };
    let mode = if args.capture || args.parallel {
        OutputMode::Capture
    } else {
        OutputMode::Stream
    };
    request = request.options(ExecOptions {
        mode,
        timeout,
        cwd: None,
    });

    let sequencer = Sequencer::new(ctx.runner());
    match sequencer.run_batch(&request).await {
        Ok(result) => {
            if mode == OutputMode::Capture {
                for r in result.results() {
                    if let Some(out) = r.stdout()
                        && !out.is_empty()
                    {
                        println!("{out}");
                    }
                }
            }
            if result.all_succeeded() { 0 } else { EXIT_FAILURE }
        }
        Err(e) => {
            tracing::error!(error = %e, "[CLI] Batch rejected");
            eprintln!("{e}");
            EXIT_CONFIG
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// What: Unreadable and malformed batch files are reported, not panicked on.
    fn batch_read_items_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("missing.json");
        assert!(read_items(&missing).expect_err("missing").contains("cannot read"));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"command": "ls"}"#).expect("write");
        assert!(read_items(&bad).expect_err("not an array").contains("invalid batch file"));

        let good = dir.path().join("good.json");
        std::fs::write(&good, r#"[{"command": "echo hi", "description": "Greet"}]"#)
            .expect("write");
        assert_eq!(read_items(&good).expect("items").len(), 1);
    }
}
