//! Process runner: spawns one resolved command through the host shell and
//! reports a normalized [`ExecutionResult`].
//!
//! Submodules:
//! - `request`: what to run and how (output mode, timeout, working directory)
//! - `result`: normalized outcome and failure kinds
//! - `runner`: spawning, supervision, timeout and interrupt handling
//! - `cancel`: programmatic cancellation handles
//! - `kill`: process (tree) termination helpers

mod cancel;
mod kill;
mod request;
mod result;
mod runner;

pub use cancel::{CancelHandle, CancelSignal};
pub use request::{ExecOptions, ExecutionRequest, OutputMode};
pub use result::{ExecutionResult, FailureKind};
pub use runner::{DEFAULT_CAPTURE_TIMEOUT, Runner, RunnerConfig};
