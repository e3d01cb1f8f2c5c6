//! Host platform detection and shell selection.
//!
//! The platform is computed once per process and cached. Shell selection honors
//! `COMSPEC` on Windows and `SHELL` everywhere else, falling back to `cmd.exe`
//! and `/bin/sh` respectively.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Default Windows command interpreter when `COMSPEC` is unset.
const WINDOWS_FALLBACK_SHELL: &str = "cmd.exe";
/// Default POSIX shell when `SHELL` is unset.
const POSIX_FALLBACK_SHELL: &str = "/bin/sh";

/// What: Closed set of host operating systems the dispatcher distinguishes.
///
/// Details:
/// - Textual forms are `windows`, `linux`, `macos` and `other`.
/// - The aliases `win32` and `darwin` are accepted when parsing so
///   command catalogues written with those keys keep working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformId {
    /// Microsoft Windows.
    #[serde(alias = "win32")]
    Windows,
    /// Any Linux distribution.
    Linux,
    /// Apple macOS.
    #[serde(alias = "darwin")]
    MacOs,
    /// Anything else (BSDs, illumos, ...). Uses the POSIX shell fallback.
    Other,
}

impl PlatformId {
    /// Every platform, in the order used for display.
    pub const ALL: [Self; 4] = [Self::Windows, Self::Linux, Self::MacOs, Self::Other];

    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::MacOs => "macos",
            Self::Other => "other",
        }
    }

    /// Whether `sudo` is the conventional elevation prefix on this platform.
    #[must_use]
    pub const fn is_unix_like(self) -> bool {
        matches!(self, Self::Linux | Self::MacOs)
    }

    /// What: Map the compile-time target OS to a platform id.
    ///
    /// Output:
    /// - The matching [`PlatformId`], or [`PlatformId::Other`] for unlisted targets.
    #[must_use]
    pub const fn detect() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a known platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPlatform(pub String);

impl fmt::Display for UnknownPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown platform \"{}\" (expected windows, linux, macos, other or default)",
            self.0
        )
    }
}

impl std::error::Error for UnknownPlatform {}

impl FromStr for PlatformId {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "windows" | "win32" => Ok(Self::Windows),
            "linux" => Ok(Self::Linux),
            "macos" | "darwin" => Ok(Self::MacOs),
            "other" => Ok(Self::Other),
            _ => Err(UnknownPlatform(s.to_string())),
        }
    }
}

/// What: Return the platform of the running process.
///
/// Output:
/// - The cached [`PlatformId`]; identical on every call for the process lifetime.
pub fn current_platform() -> PlatformId {
    static PLATFORM: OnceLock<PlatformId> = OnceLock::new();
    *PLATFORM.get_or_init(PlatformId::detect)
}

/// Family of command interpreter, which decides how a command line is passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellKind {
    /// `sh`, `bash`, `zsh`, `fish`, ...: `<shell> -c <line>`.
    Posix,
    /// `cmd.exe`: `<shell> /d /s /c "<line>"`.
    Cmd,
    /// `powershell` / `pwsh`: `<shell> -NoProfile -Command <line>`.
    PowerShell,
}

/// What: Interpreter used to spawn resolved command strings.
///
/// Details:
/// - The kind is inferred from the executable's file stem so a `COMSPEC`
///   pointing at PowerShell is driven with `-Command` rather than `/c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shell {
    /// Interpreter executable (absolute path or bare name resolved via `PATH`).
    program: PathBuf,
    /// How command lines are handed to `program`.
    kind: ShellKind,
}

impl Shell {
    /// Build a shell from an executable path, inferring its kind.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        let kind = infer_kind(&program);
        Self { program, kind }
    }

    /// Build a POSIX shell regardless of the executable name.
    pub fn posix(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            kind: ShellKind::Posix,
        }
    }

    /// Interpreter executable.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Interpreter family.
    #[must_use]
    pub const fn kind(&self) -> ShellKind {
        self.kind
    }

    /// Flags placed before the command line.
    #[must_use]
    pub const fn command_flags(&self) -> &'static [&'static str] {
        match self.kind {
            ShellKind::Posix => &["-c"],
            ShellKind::Cmd => &["/d", "/s", "/c"],
            ShellKind::PowerShell => &["-NoProfile", "-Command"],
        }
    }
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())
    }
}

/// Infer the interpreter family from the executable's file stem.
///
/// Splits on both `/` and `\` so Windows paths classify on any host.
fn infer_kind(program: &Path) -> ShellKind {
    let text = program.to_string_lossy();
    let file = text.rsplit(['/', '\\']).next().unwrap_or_default();
    let stem = file
        .rsplit_once('.')
        .map_or(file, |(stem, _)| stem)
        .to_ascii_lowercase();
    match stem.as_str() {
        "cmd" => ShellKind::Cmd,
        "powershell" | "pwsh" => ShellKind::PowerShell,
        _ => ShellKind::Posix,
    }
}

/// What: Select the interactive shell for a platform from the environment.
///
/// Inputs:
/// - `platform`: Platform whose conventions apply.
///
/// Output:
/// - The shell named by `COMSPEC` (Windows) or `SHELL` (elsewhere), or the fallback.
pub fn shell_for_platform(platform: PlatformId) -> Shell {
    let var = match platform {
        PlatformId::Windows => "COMSPEC",
        PlatformId::Linux | PlatformId::MacOs | PlatformId::Other => "SHELL",
    };
    shell_from_override(platform, std::env::var_os(var))
}

/// What: Select a shell from an explicit override value.
///
/// Inputs:
/// - `platform`: Platform whose fallback applies.
/// - `override_value`: Value of the platform's shell variable, if any.
///
/// Output:
/// - The override when it is non-blank, otherwise `cmd.exe` or `/bin/sh`.
///
/// Details:
/// - Split from [`shell_for_platform`] so callers and tests can avoid touching
///   the process environment.
pub fn shell_from_override(platform: PlatformId, override_value: Option<OsString>) -> Shell {
    if let Some(value) = override_value
        && !value.to_string_lossy().trim().is_empty()
    {
        return Shell::new(value);
    }
    match platform {
        PlatformId::Windows => Shell::new(WINDOWS_FALLBACK_SHELL),
        PlatformId::Linux | PlatformId::MacOs | PlatformId::Other => {
            Shell::new(POSIX_FALLBACK_SHELL)
        }
    }
}

/// What: Detect a privilege-elevation prefix.
///
/// Inputs:
/// - `command`: Resolved command string.
/// - `platform`: Host platform.
///
/// Output:
/// - `true` when the trimmed command starts with `sudo ` on Linux or macOS.
#[must_use]
pub fn requires_elevation(command: &str, platform: PlatformId) -> bool {
    platform.is_unix_like() && command.trim().starts_with("sudo ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// What: Platform detection is stable across calls.
    fn platform_current_is_cached() {
        assert_eq!(current_platform(), current_platform());
        assert_eq!(current_platform(), PlatformId::detect());
    }

    #[test]
    /// What: Parsing accepts canonical names and aliases.
    fn platform_parse_aliases() {
        assert_eq!("win32".parse::<PlatformId>(), Ok(PlatformId::Windows));
        assert_eq!("Darwin".parse::<PlatformId>(), Ok(PlatformId::MacOs));
        assert_eq!(" linux ".parse::<PlatformId>(), Ok(PlatformId::Linux));
        assert!("beos".parse::<PlatformId>().is_err());
        for p in PlatformId::ALL {
            assert_eq!(p.as_str().parse::<PlatformId>(), Ok(p));
        }
    }

    #[test]
    /// What: Shell fallback and override rules.
    ///
    /// Details:
    /// - Blank overrides are ignored; `other` behaves like POSIX.
    fn platform_shell_override_and_fallback() {
        let sh = shell_from_override(PlatformId::Linux, None);
        assert_eq!(sh.program(), Path::new("/bin/sh"));
        assert_eq!(sh.kind(), ShellKind::Posix);

        let win = shell_from_override(PlatformId::Windows, Some(OsString::from("  ")));
        assert_eq!(win.program(), Path::new("cmd.exe"));
        assert_eq!(win.kind(), ShellKind::Cmd);
        assert_eq!(win.command_flags(), &["/d", "/s", "/c"]);

        let zsh = shell_from_override(PlatformId::MacOs, Some(OsString::from("/bin/zsh")));
        assert_eq!(zsh.program(), Path::new("/bin/zsh"));
        assert_eq!(zsh.command_flags(), &["-c"]);

        let other = shell_from_override(PlatformId::Other, None);
        assert_eq!(other.kind(), ShellKind::Posix);
    }

    #[test]
    /// What: A `COMSPEC` pointing at PowerShell is driven with `-Command`.
    fn platform_shell_kind_inferred_from_stem() {
        let ps = Shell::new(r"C:\Windows\System32\WindowsPowerShell\v1.0\powershell.exe");
        assert_eq!(ps.kind(), ShellKind::PowerShell);
        assert_eq!(Shell::new("pwsh").kind(), ShellKind::PowerShell);
        assert_eq!(Shell::new("CMD.EXE").kind(), ShellKind::Cmd);
    }

    #[test]
    /// What: `sudo` detection is Unix-only and prefix-based.
    fn platform_requires_elevation() {
        assert!(requires_elevation("  sudo systemctl restart nginx", PlatformId::Linux));
        assert!(requires_elevation("sudo ls", PlatformId::MacOs));
        assert!(!requires_elevation("sudo ls", PlatformId::Windows));
        assert!(!requires_elevation("sudo ls", PlatformId::Other));
        assert!(!requires_elevation("sudoedit /etc/hosts", PlatformId::Linux));
        assert!(!requires_elevation("echo sudo ls", PlatformId::Linux));
    }
}
