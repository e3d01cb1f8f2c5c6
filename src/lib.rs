//! Novaflow: cross-platform command execution and dispatch.
//!
//! - [`platform`]: host platform and shell detection
//! - [`command`]: platform-keyed command maps and their resolution
//! - [`exec`]: spawning, supervising and normalizing one command
//! - [`batch`]: sequential and parallel batches
//! - [`feedback`]: spinners and success/failure lines
//! - [`aliases`], [`settings`], [`tools`], [`watch`], [`terminal`]: the
//!   surrounding command-line tool

pub mod aliases;
pub mod batch;
pub mod command;
pub mod exec;
pub mod feedback;
pub mod platform;
pub mod settings;
pub mod terminal;
pub mod tools;
pub mod watch;

pub use batch::{BatchItem, BatchRequest, BatchResult, Sequencer};
pub use command::{CommandSpec, ConfigurationError, PlatformMap};
pub use exec::{ExecutionRequest, ExecutionResult, Runner, RunnerConfig};
pub use platform::{PlatformId, current_platform};
