//! Discovery of the installed application's archive.
//!
//! Discovery is a pure function of a [`Platform`], the user's home
//! directory and an [`FsProbe`]. Production code passes [`RealFs`]; tests
//! pass an in-memory probe, so no test depends on what is installed on the
//! machine running it.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::version::{extract_app_version, find_last_app_version, natural_cmp};

/// Name of the packed archive inside an install's resources directory.
pub const ARCHIVE_NAME: &str = "app.asar";

/// System-wide Linux install locations, in priority order.
pub const LINUX_SYSTEM_ARCHIVES: &[&str] = &[
    "/opt/gitkraken/resources/app.asar",
    "/usr/share/gitkraken/resources/app.asar",
];

/// User-local Linux install location, relative to the home directory.
pub const LINUX_USER_ARCHIVE: &str = ".local/share/gitkraken/resources/app.asar";

/// macOS install location.
pub const MACOS_ARCHIVE: &str = "/Applications/GitKraken.app/Contents/Resources/app.asar";

/// Windows per-user install root, relative to the home directory.
pub const WINDOWS_INSTALL_ROOT: &str = "AppData/Local/gitkraken";

/// Operating systems with a known install layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Linux package-manager or user-local installs.
    Linux,
    /// Windows per-user, per-version installs.
    Windows,
    /// macOS application bundle.
    MacOs,
}

impl Platform {
    /// Returns the platform this binary was built for, if supported.
    pub fn current() -> Option<Self> {
        if cfg!(target_os = "linux") {
            Some(Self::Linux)
        } else if cfg!(target_os = "windows") {
            Some(Self::Windows)
        } else if cfg!(target_os = "macos") {
            Some(Self::MacOs)
        } else {
            None
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => write!(f, "linux"),
            Self::Windows => write!(f, "windows"),
            Self::MacOs => write!(f, "macos"),
        }
    }
}

/// Read-only view of the file system used by discovery.
pub trait FsProbe {
    /// Returns true if `path` exists.
    fn exists(&self, path: &Path) -> bool;

    /// Lists the names of the immediate subdirectories of `path`.
    ///
    /// Returns an empty list if `path` cannot be read.
    fn list_dirs(&self, path: &Path) -> Vec<String>;
}

/// [`FsProbe`] backed by the real file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFs;

impl FsProbe for RealFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn list_dirs(&self, path: &Path) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(path) else {
            return Vec::new();
        };
        entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect()
    }
}

/// Returns the user's home directory from the environment.
pub fn home_dir() -> Option<PathBuf> {
    ["HOME", "USERPROFILE"]
        .iter()
        .filter_map(std::env::var_os)
        .find(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Returns the fixed candidate paths for `platform`, in priority order.
///
/// Windows has no fixed candidates; its path depends on the installed
/// versions (see [`locate_archive`]).
pub fn candidates(platform: Platform, home: Option<&Path>) -> Vec<PathBuf> {
    match platform {
        Platform::Linux => {
            let mut paths: Vec<PathBuf> = LINUX_SYSTEM_ARCHIVES.iter().map(PathBuf::from).collect();
            if let Some(home) = home {
                paths.push(home.join(LINUX_USER_ARCHIVE));
            }
            paths
        }
        Platform::MacOs => vec![PathBuf::from(MACOS_ARCHIVE)],
        Platform::Windows => Vec::new(),
    }
}

/// Returns the first candidate that exists.
pub fn find_first_existing<P: FsProbe + ?Sized>(candidates: &[PathBuf], probe: &P) -> Option<PathBuf> {
    candidates.iter().find(|path| probe.exists(path)).cloned()
}

/// Locates the archive of the newest installed version under the Windows
/// per-user install root.
pub fn find_windows_archive<P: FsProbe + ?Sized>(home: &Path, probe: &P) -> Option<PathBuf> {
    let root = home.join(WINDOWS_INSTALL_ROOT);
    if !probe.exists(&root) {
        return None;
    }

    let mut apps: Vec<String> = probe
        .list_dirs(&root)
        .into_iter()
        .filter(|name| name.starts_with("app"))
        .collect();
    apps.sort_by(|a, b| natural_cmp(a, b));

    let versions: Vec<&str> = apps.iter().filter_map(|name| extract_app_version(name)).collect();
    let last = find_last_app_version(&versions)?;
    log::debug!("newest installed version: {}", last);

    let archive = root
        .join(format!("app-{}", last))
        .join("resources")
        .join(ARCHIVE_NAME);
    probe.exists(&archive).then_some(archive)
}

/// Discovers the archive for `platform`.
///
/// Returns the first existing candidate in priority order, or `None` if no
/// install was found.
pub fn locate_archive<P: FsProbe + ?Sized>(
    platform: Platform,
    home: Option<&Path>,
    probe: &P,
) -> Option<PathBuf> {
    let found = match platform {
        Platform::Windows => home.and_then(|home| find_windows_archive(home, probe)),
        Platform::Linux | Platform::MacOs => find_first_existing(&candidates(platform, home), probe),
    };
    match &found {
        Some(path) => log::debug!("found {} archive at {}", platform, path.display()),
        None => log::debug!("no {} archive found", platform),
    }
    found
}
