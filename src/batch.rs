//! Batch sequencer: runs several command specs sequentially or concurrently
//! and aggregates their results.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use crate::command::{CommandSpec, ConfigurationError};
use crate::exec::{ExecOptions, ExecutionRequest, ExecutionResult, FailureKind, OutputMode, Runner};
use crate::platform::PlatformId;

/// What: One entry of a batch.
///
/// Details:
/// - Deserializes from `{"command": "..." | {platform map}, "description": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    /// Command to resolve and run.
    pub command: CommandSpec,
    /// Feedback label; defaults to `Command N` (sequential) or `Command`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl BatchItem {
    /// Item with a description.
    pub fn new(command: impl Into<CommandSpec>, description: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            description: Some(description.into()),
        }
    }
}

/// What: A batch plus its execution policy.
///
/// Details:
/// - `stop_on_error` only applies to sequential batches.
/// - `max_concurrency` only applies to parallel batches (`None`/`0` = all at once).
#[derive(Debug, Clone, Default)]
pub struct BatchRequest {
    /// Items in input order.
    pub items: Vec<BatchItem>,
    /// Launch all items concurrently.
    pub parallel: bool,
    /// Abort a sequential batch after the first failure.
    pub stop_on_error: bool,
    /// Options applied to every item.
    pub options: ExecOptions,
    /// Upper bound on concurrently running children in parallel mode.
    pub max_concurrency: Option<usize>,
}

impl BatchRequest {
    /// Sequential, streaming, stopping at the first failure.
    #[must_use]
    pub fn sequential(items: Vec<BatchItem>) -> Self {
        Self {
            items,
            parallel: false,
            stop_on_error: true,
            options: ExecOptions::default(),
            max_concurrency: None,
        }
    }

    /// Parallel in capture mode, so concurrent output does not interleave.
    #[must_use]
    pub fn parallel(items: Vec<BatchItem>) -> Self {
        Self {
            items,
            parallel: true,
            stop_on_error: false,
            options: ExecOptions::capture(),
            max_concurrency: None,
        }
    }

    /// Set the stop-on-error policy.
    #[must_use]
    pub const fn stop_on_error(mut self, stop: bool) -> Self {
        self.stop_on_error = stop;
        self
    }

    /// Replace the per-item options.
    #[must_use]
    pub fn options(mut self, options: ExecOptions) -> Self {
        self.options = options;
        self
    }

    /// Cap concurrently running children.
    #[must_use]
    pub const fn max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = Some(limit);
        self
    }
}

/// What: Ordered results of the attempted items plus the success count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    /// One result per attempted item, in input order.
    results: Vec<ExecutionResult>,
    /// Number of items in the request.
    requested: usize,
    /// Successful entries among `results`.
    success_count: usize,
    /// Platform the batch was resolved for.
    platform: PlatformId,
}

impl BatchResult {
    /// Aggregate a list of results.
    #[must_use]
    pub fn from_results(
        results: Vec<ExecutionResult>,
        requested: usize,
        platform: PlatformId,
    ) -> Self {
        let success_count = results.iter().filter(|r| r.success()).count();
        Self {
            results,
            requested,
            success_count,
            platform,
        }
    }

    /// Results in input order.
    #[must_use]
    pub fn results(&self) -> &[ExecutionResult] {
        &self.results
    }

    /// Number of attempted items.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.results.len()
    }

    /// Number of items in the request.
    #[must_use]
    pub const fn requested(&self) -> usize {
        self.requested
    }

    /// Successful entries.
    #[must_use]
    pub const fn success_count(&self) -> usize {
        self.success_count
    }

    /// Every requested item was attempted and succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.success_count == self.requested
    }

    /// Fewer items were attempted than requested.
    #[must_use]
    pub fn stopped_early(&self) -> bool {
        self.results.len() < self.requested
    }

    /// Summary line shown after a batch.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Summary: {}/{} commands succeeded on {}",
            self.success_count,
            self.results.len(),
            self.platform
        )
    }
}

/// What: Runs [`BatchRequest`]s through a [`Runner`].
#[derive(Debug, Clone)]
pub struct Sequencer {
    /// Runner used for every item.
    runner: Runner,
}

impl Sequencer {
    /// Sequencer backed by `runner`.
    #[must_use]
    pub const fn new(runner: Runner) -> Self {
        Self { runner }
    }

    /// Underlying runner.
    #[must_use]
    pub const fn runner(&self) -> &Runner {
        &self.runner
    }

    /// What: Run a batch.
    ///
    /// Inputs:
    /// - `request`: Items and policy.
    ///
    /// Output:
    /// - [`BatchResult`] with one entry per attempted item.
    ///
    /// # Errors
    /// - Returns [`ConfigurationError`] if any item cannot be resolved for the
    ///   runner's platform. Validation covers every item before the first spawn.
    ///
    /// Details:
    /// - Sequential: strictly one child at a time; stops after a failure when
    ///   `stop_on_error`, and always after a user cancellation.
    /// - Parallel: every item runs to completion; results keep input order.
    pub async fn run_batch(&self, request: &BatchRequest) -> Result<BatchResult, ConfigurationError> {
        let platform = self.runner.platform();
        for item in &request.items {
            item.command.resolve(platform)?;
        }
        let feedback = self.runner.feedback();
        feedback.notice(&format!("Detected platform: {platform}"));

        let results = if request.parallel {
            self.run_parallel(request).await?
        } else {
            self.run_sequential(request).await?
        };

        let batch = BatchResult::from_results(results, request.items.len(), platform);
        tracing::info!(
            succeeded = batch.success_count(),
            attempted = batch.attempted(),
            requested = batch.requested(),
            parallel = request.parallel,
            "[Batch] {}",
            batch.summary()
        );
        feedback.notice(&batch.summary());
        Ok(batch)
    }

    /// Run items one after another.
    async fn run_sequential(
        &self,
        request: &BatchRequest,
    ) -> Result<Vec<ExecutionResult>, ConfigurationError> {
        let platform = self.runner.platform();
        let total = request.items.len();
        let mut results = Vec::with_capacity(total);
        for (idx, item) in request.items.iter().enumerate() {
            let command = item.command.resolve(platform)?;
            let description = item
                .description
                .clone()
                .unwrap_or_else(|| format!("Command {}", idx + 1));
            self.runner
                .feedback()
                .notice(&format!("[{}/{total}] {description}", idx + 1));
            let req = ExecutionRequest::new(command)
                .description(description)
                .options(request.options.clone());
            let result = self.runner.run(&req).await;
            let failed = !result.success();
            let interrupted = result.failure() == Some(FailureKind::Interrupted);
            results.push(result);
            if interrupted || (failed && request.stop_on_error) {
                tracing::warn!(
                    item = idx + 1,
                    total,
                    interrupted,
                    "[Batch] Stopping sequence due to an error"
                );
                self.runner
                    .feedback()
                    .notice("Stopping sequence due to an error");
                break;
            }
        }
        Ok(results)
    }

    /// Launch items concurrently and wait for all of them.
    async fn run_parallel(
        &self,
        request: &BatchRequest,
    ) -> Result<Vec<ExecutionResult>, ConfigurationError> {
        if request.options.mode == OutputMode::Stream && request.items.len() > 1 {
            tracing::warn!(
                items = request.items.len(),
                "[Batch] Parallel batch in streaming mode: output will interleave"
            );
        }
        let platform = self.runner.platform();
        let mut requests = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let command = item.command.resolve(platform)?;
            let description = item
                .description
                .clone()
                .unwrap_or_else(|| "Command".to_string());
            requests.push(
                ExecutionRequest::new(command)
                    .description(description)
                    .options(request.options.clone()),
            );
        }
        let limit = request
            .max_concurrency
            .filter(|n| *n > 0)
            .unwrap_or(requests.len())
            .max(1);
        let runner = &self.runner;
        let results = stream::iter(requests)
            .map(|req| async move { runner.run(&req).await })
            .buffered(limit)
            .collect::<Vec<_>>()
            .await;
        Ok(results)
    }
}
