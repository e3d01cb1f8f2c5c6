//! Locations of the config directory and the files inside it.

use std::env;
use std::path::{Path, PathBuf};

/// Name of the application directory under the config base.
const APP_DIR: &str = "novaflow";

/// What: Resolved file locations.
///
/// Details:
/// - Directories are created lazily by [`ConfigPaths::ensure`], not on
///   construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    /// Config directory.
    root: PathBuf,
}

impl ConfigPaths {
    /// Paths rooted at an explicit directory.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// What: Default location.
    ///
    /// Output:
    /// - `$HOME/.config/novaflow`, else `$XDG_CONFIG_HOME/novaflow`, else
    ///   `./.config/novaflow`.
    #[must_use]
    pub fn discover() -> Self {
        Self::at(default_root(
            env::var_os("HOME").map(PathBuf::from),
            env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        ))
    }

    /// Paths from an optional CLI override.
    #[must_use]
    pub fn from_override(dir: Option<&Path>) -> Self {
        dir.map_or_else(Self::discover, Self::at)
    }

    /// Config directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `settings.conf`.
    #[must_use]
    pub fn settings_file(&self) -> PathBuf {
        self.root.join("settings.conf")
    }

    /// `custom_commands.json`.
    #[must_use]
    pub fn aliases_file(&self) -> PathBuf {
        self.root.join("custom_commands.json")
    }

    /// `logs/`.
    #[must_use]
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Create the config and logs directories.
    ///
    /// # Errors
    /// - Returns the I/O error when a directory cannot be created.
    pub fn ensure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.logs_dir())
    }
}

/// Pick the config root from `HOME` and `XDG_CONFIG_HOME`.
fn default_root(home: Option<PathBuf>, xdg: Option<PathBuf>) -> PathBuf {
    if let Some(h) = home.filter(|p| !p.as_os_str().is_empty()) {
        return h.join(".config").join(APP_DIR);
    }
    if let Some(x) = xdg.filter(|p| !p.as_os_str().is_empty()) {
        return x.join(APP_DIR);
    }
    PathBuf::from(".config").join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// What: HOME wins over XDG; XDG is used without HOME.
    fn paths_default_root_priority() {
        assert_eq!(
            default_root(Some("/home/a".into()), Some("/xdg".into())),
            PathBuf::from("/home/a/.config/novaflow")
        );
        assert_eq!(
            default_root(None, Some("/xdg".into())),
            PathBuf::from("/xdg/novaflow")
        );
        assert_eq!(
            default_root(Some(PathBuf::new()), None),
            PathBuf::from(".config/novaflow")
        );
    }

    #[test]
    /// What: Files live under the chosen root and `ensure` creates logs/.
    fn paths_layout_under_override() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = ConfigPaths::from_override(Some(dir.path()));
        assert_eq!(paths.settings_file(), dir.path().join("settings.conf"));
        assert_eq!(paths.aliases_file(), dir.path().join("custom_commands.json"));
        paths.ensure().expect("ensure");
        assert!(paths.logs_dir().is_dir());
    }
}
