//! Named custom commands persisted as JSON in the config directory.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::command::CommandSpec;

/// Version tag written into export files.
pub const EXPORT_VERSION: &str = "1.0";

/// What: One stored alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomCommand {
    /// Shell command line.
    pub command: String,
    /// Free text; empty when not given.
    #[serde(default)]
    pub description: String,
}

/// Errors raised by [`AliasStore`] operations.
#[derive(Debug)]
pub enum AliasError {
    /// Name or command was blank.
    MissingField(&'static str),
    /// No alias with that name.
    NotFound(String),
    /// Import file is neither an export envelope nor a bare map.
    InvalidFormat(PathBuf),
    /// Filesystem failure.
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// JSON (de)serialization failure.
    Json(serde_json::Error),
}

impl fmt::Display for AliasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "{field} is required"),
            Self::NotFound(name) => write!(f, "command \"{name}\" not found"),
            Self::InvalidFormat(path) => {
                write!(f, "invalid import file format: {}", path.display())
            }
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Json(e) => write!(f, "invalid JSON: {e}"),
        }
    }
}

impl std::error::Error for AliasError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for AliasError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Header of an export file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportMetadata {
    /// RFC 3339 timestamp of the export.
    export_date: String,
    /// Number of exported aliases.
    total_commands: usize,
    /// Format version.
    version: String,
}

/// Export file layout.
#[derive(Debug, Serialize)]
struct ExportEnvelope<'a> {
    /// Header.
    metadata: ExportMetadata,
    /// Aliases keyed by name.
    commands: &'a BTreeMap<String, CustomCommand>,
}

/// Accepted import layouts.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImportFile {
    /// Output of [`AliasStore::export_to`].
    Envelope {
        /// Aliases keyed by name.
        commands: BTreeMap<String, CustomCommand>,
    },
    /// Raw store file.
    Bare(BTreeMap<String, CustomCommand>),
}

/// What: Alias collection bound to a JSON file.
///
/// Details:
/// - Every mutating call writes the file before returning, and only updates
///   the in-memory map once the write succeeded.
#[derive(Debug, Clone)]
pub struct AliasStore {
    /// Backing file.
    path: PathBuf,
    /// Aliases keyed by name.
    commands: BTreeMap<String, CustomCommand>,
    /// The file on disk failed to parse and has not been backed up yet.
    unparsed_on_disk: bool,
}

impl AliasStore {
    /// What: Load the store at `path`.
    ///
    /// Inputs:
    /// - `path`: JSON file holding a name → alias map.
    ///
    /// Output:
    /// - The loaded store. A missing file yields an empty store that is
    ///   written to disk; an unreadable or corrupt file yields an empty store
    ///   (logged, file left untouched). A corrupt file is copied to
    ///   `<file>.corrupt` before the first write replaces it.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut store = Self {
            path,
            commands: BTreeMap::new(),
            unparsed_on_disk: false,
        };
        match fs::read_to_string(&store.path) {
            Ok(body) => match serde_json::from_str::<BTreeMap<String, CustomCommand>>(&body) {
                Ok(commands) => {
                    tracing::debug!(
                        path = %store.path.display(),
                        count = commands.len(),
                        "[Aliases] Loaded custom commands"
                    );
                    store.commands = commands;
                }
                Err(e) => {
                    tracing::warn!(
                        path = %store.path.display(),
                        error = %e,
                        "[Aliases] Custom commands file is corrupt; starting empty"
                    );
                    store.unparsed_on_disk = true;
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if let Err(e) = store.save() {
                    tracing::warn!(error = %e, "[Aliases] Failed to create custom commands file");
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %store.path.display(),
                    error = %e,
                    "[Aliases] Failed to read custom commands"
                );
            }
        }
        store
    }

    /// Backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where a corrupt store file is preserved.
    #[must_use]
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".corrupt");
        PathBuf::from(name)
    }

    /// Write the store as pretty JSON.
    ///
    /// # Errors
    /// - Returns [`AliasError::Io`] when the file cannot be written.
    pub fn save(&mut self) -> Result<(), AliasError> {
        self.preserve_unparsed()?;
        persist(&self.path, &self.commands)
    }

    /// Write `next` and adopt it; memory is untouched when the write fails.
    fn commit(&mut self, next: BTreeMap<String, CustomCommand>) -> Result<(), AliasError> {
        self.preserve_unparsed()?;
        persist(&self.path, &next)?;
        self.commands = next;
        Ok(())
    }

    /// Copy a file that failed to parse aside before it is overwritten.
    fn preserve_unparsed(&mut self) -> Result<(), AliasError> {
        if !self.unparsed_on_disk {
            return Ok(());
        }
        let backup = self.backup_path();
        match fs::copy(&self.path, &backup) {
            Ok(_) => {
                tracing::warn!(
                    backup = %backup.display(),
                    "[Aliases] Kept a copy of the corrupt custom commands file"
                );
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => return Err(AliasError::Io { path: backup, source }),
        }
        self.unparsed_on_disk = false;
        Ok(())
    }

    /// What: Add or replace an alias.
    ///
    /// Inputs:
    /// - `name`, `command`: Required, trimmed.
    /// - `description`: Optional free text, trimmed.
    ///
    /// # Errors
    /// - [`AliasError::MissingField`] when name or command is blank.
    /// - [`AliasError::Io`] when the store cannot be saved.
    pub fn add(&mut self, name: &str, command: &str, description: &str) -> Result<(), AliasError> {
        let name = name.trim();
        let command = command.trim();
        if name.is_empty() {
            return Err(AliasError::MissingField("name"));
        }
        if command.is_empty() {
            return Err(AliasError::MissingField("command"));
        }
        let mut next = self.commands.clone();
        next.insert(
            name.to_string(),
            CustomCommand {
                command: command.to_string(),
                description: description.trim().to_string(),
            },
        );
        self.commit(next)?;
        tracing::info!(name, "[Aliases] Command added");
        Ok(())
    }

    /// Remove an alias and return it.
    ///
    /// # Errors
    /// - [`AliasError::NotFound`] for unknown names; [`AliasError::Io`] on save failure.
    pub fn remove(&mut self, name: &str) -> Result<CustomCommand, AliasError> {
        let mut next = self.commands.clone();
        let removed = next
            .remove(name)
            .ok_or_else(|| AliasError::NotFound(name.to_string()))?;
        self.commit(next)?;
        tracing::info!(name, "[Aliases] Command removed");
        Ok(removed)
    }

    /// Look up an alias.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CustomCommand> {
        self.commands.get(name)
    }

    /// All aliases sorted by name.
    pub fn list(&self) -> impl Iterator<Item = (&str, &CustomCommand)> {
        self.commands.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of aliases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// What: Case-insensitive search over name, command and description.
    ///
    /// Output:
    /// - Matches sorted by name; empty for a blank keyword.
    #[must_use]
    pub fn search(&self, keyword: &str) -> Vec<(&str, &CustomCommand)> {
        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        let hit = |field: &str| field.to_lowercase().contains(&needle);
        self.list()
            .filter(|(name, cmd)| hit(name) || hit(&cmd.command) || hit(&cmd.description))
            .collect()
    }

    /// Remove every alias; returns how many were removed.
    ///
    /// # Errors
    /// - [`AliasError::Io`] when the store cannot be saved.
    pub fn clear(&mut self) -> Result<usize, AliasError> {
        let count = self.commands.len();
        if count == 0 {
            return Ok(0);
        }
        self.commit(BTreeMap::new())?;
        tracing::info!(count, "[Aliases] Cleared custom commands");
        Ok(count)
    }

    /// What: Write all aliases to `path` inside an export envelope.
    ///
    /// Output:
    /// - Number of exported aliases.
    ///
    /// # Errors
    /// - [`AliasError::Io`] when the file cannot be written.
    pub fn export_to(&self, path: &Path) -> Result<usize, AliasError> {
        let envelope = ExportEnvelope {
            metadata: ExportMetadata {
                export_date: chrono::Utc::now().to_rfc3339(),
                total_commands: self.commands.len(),
                version: EXPORT_VERSION.to_string(),
            },
            commands: &self.commands,
        };
        let body = serde_json::to_string_pretty(&envelope)?;
        write_file(path, &body)?;
        tracing::info!(path = %path.display(), count = self.commands.len(), "[Aliases] Exported");
        Ok(self.commands.len())
    }

    /// What: Merge aliases from an export file or a bare map.
    ///
    /// Output:
    /// - Number of aliases read from the file. Imported names replace
    ///   existing ones.
    ///
    /// # Errors
    /// - [`AliasError::Io`] when the file cannot be read or the store saved.
    /// - [`AliasError::InvalidFormat`] when the JSON has neither layout.
    pub fn import_from(&mut self, path: &Path) -> Result<usize, AliasError> {
        let body = fs::read_to_string(path).map_err(|source| AliasError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let imported = match serde_json::from_str::<ImportFile>(&body) {
            Ok(ImportFile::Envelope { commands } | ImportFile::Bare(commands)) => commands,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "[Aliases] Import rejected");
                return Err(AliasError::InvalidFormat(path.to_path_buf()));
            }
        };
        let count = imported.len();
        let mut next = self.commands.clone();
        next.extend(imported);
        self.commit(next)?;
        tracing::info!(path = %path.display(), count, "[Aliases] Imported");
        Ok(count)
    }

    /// What: Command spec and label for running an alias.
    ///
    /// Output:
    /// - The alias command as a literal spec and its description, or
    ///   `Executing "<name>"` when the description is empty.
    ///
    /// # Errors
    /// - [`AliasError::NotFound`] for unknown names.
    pub fn command_spec(&self, name: &str) -> Result<(CommandSpec, String), AliasError> {
        let cmd = self
            .get(name)
            .ok_or_else(|| AliasError::NotFound(name.to_string()))?;
        let label = if cmd.description.is_empty() {
            format!("Executing \"{name}\"")
        } else {
            cmd.description.clone()
        };
        Ok((CommandSpec::from(cmd.command.as_str()), label))
    }
}

/// Serialize `commands` as pretty JSON into `path`.
fn persist(path: &Path, commands: &BTreeMap<String, CustomCommand>) -> Result<(), AliasError> {
    let body = serde_json::to_string_pretty(commands)?;
    write_file(path, &body)?;
    tracing::debug!(
        path = %path.display(),
        count = commands.len(),
        "[Aliases] Custom commands persisted"
    );
    Ok(())
}

/// Write `body` to `path`, creating parent directories.
fn write_file(path: &Path, body: &str) -> Result<(), AliasError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        let _ = fs::create_dir_all(parent);
    }
    fs::write(path, body).map_err(|source| AliasError::Io {
        path: path.to_path_buf(),
        source,
    })
}
