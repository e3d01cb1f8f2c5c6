//! Platform-keyed command specifications and their resolution.
//!
//! Menu handlers describe a command either as a single literal line or as a
//! [`PlatformMap`] with a `default` fallback. [`resolve`] turns either form into
//! the one string the runner spawns, and refuses maps that cannot serve the host.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::platform::{PlatformId, UnknownPlatform};

/// Key used for the fallback entry of a platform map.
const DEFAULT_KEY: &str = "default";

/// What: Error raised when a platform map has neither the requested platform
/// key nor a `default` entry.
///
/// Details:
/// - Always raised before any process is spawned.
/// - Indicates a bug in the calling menu code, not an environmental failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationError {
    /// Platform that was requested.
    pub platform: PlatformId,
    /// Keys present in the offending map, in display order.
    pub available: Vec<String>,
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.available.is_empty() {
            write!(
                f,
                "no command defined for platform {} and no default fallback (map is empty)",
                self.platform
            )
        } else {
            write!(
                f,
                "no command defined for platform {} and no default fallback (available keys: {})",
                self.platform,
                self.available.join(", ")
            )
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// What: Mapping from platform to command line, with an optional fallback.
///
/// Details:
/// - Serialized as a flat JSON object: `{"windows": "...", "default": "..."}`.
/// - Blank entries count as missing, so an empty per-platform string falls
///   through to `default`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, String>",
    into = "BTreeMap<String, String>"
)]
pub struct PlatformMap {
    /// Per-platform command lines.
    entries: BTreeMap<PlatformId, String>,
    /// Fallback used when the host has no entry.
    default: Option<String>,
}

impl PlatformMap {
    /// Empty map (resolves to a [`ConfigurationError`] until entries are added).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the command line for one platform.
    #[must_use]
    pub fn with_platform(mut self, platform: PlatformId, command: impl Into<String>) -> Self {
        self.entries.insert(platform, command.into());
        self
    }

    /// Set the fallback command line.
    #[must_use]
    pub fn with_default(mut self, command: impl Into<String>) -> Self {
        self.default = Some(command.into());
        self
    }

    /// Command line registered for `platform`, ignoring blank entries.
    #[must_use]
    pub fn get(&self, platform: PlatformId) -> Option<&str> {
        self.entries
            .get(&platform)
            .map(String::as_str)
            .filter(|c| !c.trim().is_empty())
    }

    /// Fallback command line, ignoring a blank entry.
    #[must_use]
    pub fn default_command(&self) -> Option<&str> {
        self.default.as_deref().filter(|c| !c.trim().is_empty())
    }

    /// Keys present in the map, platforms first, then `default`.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .keys()
            .map(|p| p.as_str().to_string())
            .collect();
        if self.default.is_some() {
            keys.push(DEFAULT_KEY.to_string());
        }
        keys
    }
}

impl TryFrom<BTreeMap<String, String>> for PlatformMap {
    type Error = UnknownPlatform;

    fn try_from(raw: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        let mut map = Self::new();
        for (key, command) in raw {
            if key.eq_ignore_ascii_case(DEFAULT_KEY) {
                map.default = Some(command);
            } else {
                map.entries.insert(key.parse()?, command);
            }
        }
        Ok(map)
    }
}

impl From<PlatformMap> for BTreeMap<String, String> {
    fn from(map: PlatformMap) -> Self {
        let mut out: Self = map
            .entries
            .into_iter()
            .map(|(p, c)| (p.as_str().to_string(), c))
            .collect();
        if let Some(default) = map.default {
            out.insert(DEFAULT_KEY.to_string(), default);
        }
        out
    }
}

/// What: A command as written by a menu handler.
///
/// Details:
/// - Deserializes from either a JSON string (literal) or a JSON object
///   (platform map).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandSpec {
    /// Same command line on every platform.
    Literal(String),
    /// Per-platform command lines with a fallback.
    PlatformMap(PlatformMap),
}

impl CommandSpec {
    /// Resolve against `platform`. See [`resolve`].
    ///
    /// # Errors
    /// - Returns [`ConfigurationError`] when a platform map cannot serve `platform`.
    pub fn resolve(&self, platform: PlatformId) -> Result<String, ConfigurationError> {
        resolve(self, platform)
    }
}

impl From<&str> for CommandSpec {
    fn from(value: &str) -> Self {
        Self::Literal(value.to_string())
    }
}

impl From<String> for CommandSpec {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

impl From<PlatformMap> for CommandSpec {
    fn from(value: PlatformMap) -> Self {
        Self::PlatformMap(value)
    }
}

/// What: Select the command line appropriate for a platform.
///
/// Inputs:
/// - `spec`: Literal or platform map.
/// - `platform`: Platform to resolve for (normally the host).
///
/// Output:
/// - The literal unchanged, the map's entry for `platform`, or its `default`.
///
/// # Errors
/// - Returns [`ConfigurationError`] naming `platform` and the available keys
///   when a map has neither entry.
pub fn resolve(spec: &CommandSpec, platform: PlatformId) -> Result<String, ConfigurationError> {
    match spec {
        CommandSpec::Literal(command) => Ok(command.clone()),
        CommandSpec::PlatformMap(map) => map
            .get(platform)
            .or_else(|| map.default_command())
            .map(ToString::to_string)
            .ok_or_else(|| ConfigurationError {
                platform,
                available: map.keys(),
            }),
    }
}
