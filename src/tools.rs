//! Availability probe for the external tools commands commonly rely on.

use std::path::PathBuf;

/// Tools probed by default.
pub const KNOWN_TOOLS: &[&str] = &[
    "git",
    "docker",
    "kubectl",
    "npm",
    "node",
    "systemctl",
    "psql",
    "mysql",
    "mongosh",
    "redis-cli",
    "curl",
    "ping",
    "ssh",
];

/// What: Result of probing one tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolStatus {
    /// Executable name.
    pub name: String,
    /// Resolved location, `None` when not on `PATH`.
    pub path: Option<PathBuf>,
}

impl ToolStatus {
    /// Whether the tool was found.
    #[must_use]
    pub const fn available(&self) -> bool {
        self.path.is_some()
    }
}

/// What: Probe each tool in `names`.
///
/// Output:
/// - One [`ToolStatus`] per name, in input order.
pub fn probe<S: AsRef<str>>(names: &[S]) -> Vec<ToolStatus> {
    names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            let path = which::which(name).ok();
            tracing::debug!(tool = name, found = path.is_some(), "[Tools] Probed");
            ToolStatus {
                name: name.to_string(),
                path,
            }
        })
        .collect()
}
