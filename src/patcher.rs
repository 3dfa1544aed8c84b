//! The archive patcher: locate, back up, unpack, patch, repack, clean up.
//!
//! [`Patcher`] holds the resolved archive path, working directory and
//! feature list, and performs each step on demand. It does not enforce step
//! order; [`Workflow`](crate::Workflow) does.
//!
//! # Example
//!
//! ```rust,no_run
//! use asarpatch::{Patcher, PatcherOptions};
//!
//! let patcher = Patcher::new(
//!     PatcherOptions::new()
//!         .archive("/opt/app/resources/app.asar")
//!         .base_dir("/usr/share/asarpatch")
//!         .feature("pro"),
//! )?;
//! patcher.backup_archive()?;
//! patcher.unpack_archive()?;
//! patcher.patch_dir()?;
//! patcher.pack_dir()?;
//! patcher.remove_dir()?;
//! # Ok::<(), asarpatch::Error>(())
//! ```

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::locate::{Platform, RealFs, home_dir, locate_archive};
use crate::patch::{FilePatch, apply_patch, parse_patch};
use crate::read::{ExtractResult, extract_all};
use crate::write::{PackResult, create_package};
use crate::{ArchivePath, Error, Result};

/// Subdirectory of the base directory holding patch sets.
pub const PATCHES_DIR: &str = "patches";

/// Extension of patch-set files.
pub const PATCH_EXTENSION: &str = "diff";

/// Suffix appended to backup file names.
pub const BACKUP_SUFFIX: &str = "backup";

/// How file mutations of a feature are committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatchMode {
    /// Each file is deleted and written as soon as its patch is processed.
    ///
    /// A failure leaves earlier files of the run modified, and the source of
    /// a rename may already be gone.
    #[default]
    Direct,
    /// All patches of a feature are applied in memory first; deletes and
    /// writes happen only once every hunk of the feature applied.
    Staged,
}

/// Construction options for [`Patcher`].
#[derive(Debug, Clone, Default)]
pub struct PatcherOptions {
    archive: Option<PathBuf>,
    dir: Option<PathBuf>,
    features: Vec<String>,
    base_dir: Option<PathBuf>,
    mode: PatchMode,
}

impl PatcherOptions {
    /// Creates empty options: discover the archive, derive the directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an explicit archive path. Empty paths are ignored.
    pub fn archive(mut self, path: impl Into<PathBuf>) -> Self {
        self.archive = non_empty(path.into());
        self
    }

    /// Sets an explicit working directory. Empty paths are ignored.
    pub fn dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.dir = non_empty(path.into());
        self
    }

    /// Appends one feature.
    pub fn feature(mut self, feature: impl Into<String>) -> Self {
        self.features.push(feature.into());
        self
    }

    /// Appends several features, keeping their order.
    pub fn features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features.extend(features.into_iter().map(Into::into));
        self
    }

    /// Sets the directory whose `patches/` subdirectory holds patch sets.
    ///
    /// Defaults to the current directory.
    pub fn base_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_dir = non_empty(path.into());
        self
    }

    /// Sets how patch results are committed.
    pub fn mode(mut self, mode: PatchMode) -> Self {
        self.mode = mode;
        self
    }
}

fn non_empty(path: PathBuf) -> Option<PathBuf> {
    (!path.as_os_str().is_empty()).then_some(path)
}

/// Patches an application's asar archive.
#[derive(Debug, Clone)]
pub struct Patcher {
    archive: PathBuf,
    dir: PathBuf,
    features: Vec<String>,
    base_dir: PathBuf,
    mode: PatchMode,
}

impl Patcher {
    /// Resolves the archive and working directory.
    ///
    /// Without an explicit archive, a given working directory `d` implies
    /// `d.asar`; otherwise the archive is discovered for the current
    /// platform.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArchiveNotFound`] if no archive path resolves, and
    /// [`Error::InvalidArchivePath`] if the archive has no extension to strip
    /// and no working directory is given.
    pub fn new(options: PatcherOptions) -> Result<Self> {
        Self::with_discovery(options, || {
            Platform::current().and_then(|platform| {
                locate_archive(platform, home_dir().as_deref(), &RealFs)
            })
        })
    }

    /// Like [`Patcher::new`], with a caller-supplied discovery fallback.
    pub fn with_discovery(
        options: PatcherOptions,
        discover: impl FnOnce() -> Option<PathBuf>,
    ) -> Result<Self> {
        let archive = match (options.archive, &options.dir) {
            (Some(archive), _) => Some(archive),
            (None, Some(dir)) => Some(archive_for_dir(dir)),
            (None, None) => discover(),
        }
        .and_then(non_empty)
        .ok_or(Error::ArchiveNotFound)?;

        let dir = options.dir.unwrap_or_else(|| find_dir(&archive));
        if dir == archive {
            return Err(Error::InvalidArchivePath(format!(
                "working directory would be the archive itself: {}",
                archive.display()
            )));
        }
        let base_dir = options.base_dir.unwrap_or_else(|| PathBuf::from("."));
        log::debug!(
            "patcher: archive {}, dir {}, features {:?}",
            archive.display(),
            dir.display(),
            options.features
        );

        Ok(Self {
            archive,
            dir,
            features: options.features,
            base_dir,
            mode: options.mode,
        })
    }

    /// The archive path.
    pub fn archive(&self) -> &Path {
        &self.archive
    }

    /// The working directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The features, in application order.
    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// The patch commit mode.
    pub fn mode(&self) -> PatchMode {
        self.mode
    }

    /// Directory holding `<feature>.diff` files.
    pub fn patches_dir(&self) -> PathBuf {
        self.base_dir.join(PATCHES_DIR)
    }

    /// Path of the patch set for `feature`.
    pub fn patch_file(&self, feature: &str) -> PathBuf {
        self.patches_dir()
            .join(format!("{}.{}", feature, PATCH_EXTENSION))
    }

    /// Copies the archive to `<archive>.<epoch-millis>.backup`.
    ///
    /// Never overwrites: if a backup with the same timestamp already exists
    /// the call fails with [`io::ErrorKind::AlreadyExists`].
    pub fn backup_archive(&self) -> Result<PathBuf> {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let mut name = OsString::from(self.archive.as_os_str());
        name.push(format!(".{}.{}", millis, BACKUP_SUFFIX));
        let backup = PathBuf::from(name);

        let mut source = File::open(&self.archive)?;
        let mut target = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&backup)?;
        let copied = io::copy(&mut source, &mut target)?;
        target.sync_all()?;
        fs::set_permissions(&backup, source.metadata()?.permissions())?;

        log::info!("backed up {} ({} bytes) to {}", self.archive.display(), copied, backup.display());
        Ok(backup)
    }

    /// Extracts the archive into the working directory.
    pub fn unpack_archive(&self) -> Result<ExtractResult> {
        log::debug!("unpacking {} into {}", self.archive.display(), self.dir.display());
        extract_all(&self.archive, &self.dir)
    }

    /// Packs the working directory into the archive, replacing it.
    pub fn pack_dir(&self) -> Result<PackResult> {
        create_package(&self.dir, &self.archive)
    }

    /// Packs the working directory into the archive on Tokio's blocking pool.
    ///
    /// Await the returned future before relying on the archive or removing
    /// the working directory.
    #[cfg(feature = "async")]
    pub async fn pack_dir_async(&self) -> Result<PackResult> {
        crate::async_pack::create_package_async(self.dir.clone(), self.archive.clone()).await
    }

    /// Deletes the working directory. Succeeds if it does not exist.
    pub fn remove_dir(&self) -> Result<()> {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => {
                log::debug!("removed {}", self.dir.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Applies every feature's patch set to the working directory, in order.
    ///
    /// Patch sets are read from disk on every call. There is no rollback
    /// across features; see [`PatchMode`] for rollback within a feature.
    pub fn patch_dir(&self) -> Result<()> {
        for feature in &self.features {
            let patches = self.load_patch_set(feature)?;
            if patches.is_empty() {
                log::warn!("patch set for feature '{}' contains no file patches", feature);
            }
            log::debug!("applying feature '{}' ({} files)", feature, patches.len());
            match self.mode {
                PatchMode::Direct => {
                    for patch in &patches {
                        self.apply_direct(patch)?;
                    }
                }
                PatchMode::Staged => self.apply_staged(&patches)?,
            }
        }
        Ok(())
    }

    /// Loads and parses the patch set of `feature`.
    pub fn load_patch_set(&self, feature: &str) -> Result<Vec<FilePatch>> {
        let path = self.patch_file(feature);
        let text = read_text(&path)?;
        parse_patch(&text)
    }

    fn resolve(&self, path: &ArchivePath) -> PathBuf {
        path.to_fs_path(&self.dir)
    }

    fn apply_direct(&self, patch: &FilePatch) -> Result<()> {
        let source = match &patch.old_path {
            Some(old) => read_text(&self.resolve(old))?,
            None => String::new(),
        };
        if patch.is_rename() {
            if let Some(old) = &patch.old_path {
                fs::remove_file(self.resolve(old))?;
            }
        }

        let patched = apply_patch(&source, patch)?;

        match (&patch.old_path, &patch.new_path) {
            (_, Some(new)) => write_text(&self.resolve(new), &patched)?,
            (Some(old), None) => fs::remove_file(self.resolve(old))?,
            (None, None) => {}
        }
        log::debug!("patched {}", patch.display_path());
        Ok(())
    }

    fn apply_staged(&self, patches: &[FilePatch]) -> Result<()> {
        // `None` marks a file deleted by an earlier patch of this feature.
        let mut staged: HashMap<ArchivePath, Option<String>> = HashMap::new();
        let mut order: Vec<ArchivePath> = Vec::new();

        for patch in patches {
            let source = match &patch.old_path {
                Some(old) => match staged.get(old) {
                    Some(Some(text)) => text.clone(),
                    Some(None) => {
                        return Err(Error::Io(io::Error::new(
                            io::ErrorKind::NotFound,
                            format!("{} was removed by an earlier patch", old),
                        )));
                    }
                    None => read_text(&self.resolve(old))?,
                },
                None => String::new(),
            };
            let patched = apply_patch(&source, patch)?;

            if let Some(old) = &patch.old_path {
                if patch.new_path.as_ref() != Some(old) {
                    if staged.insert(old.clone(), None).is_none() {
                        order.push(old.clone());
                    }
                }
            }
            if let Some(new) = &patch.new_path {
                if staged.insert(new.clone(), Some(patched)).is_none() {
                    order.push(new.clone());
                }
            }
        }

        for path in order {
            let target = self.resolve(&path);
            match staged.remove(&path).flatten() {
                Some(text) => write_text(&target, &text)?,
                None => match fs::remove_file(&target) {
                    Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e.into()),
                    _ => {}
                },
            }
            log::debug!("committed {}", path);
        }
        Ok(())
    }
}

/// Derives the working directory from an archive path by removing the
/// extension: `/x/app.asar` becomes `/x/app`.
pub fn find_dir(archive: &Path) -> PathBuf {
    archive.with_extension("")
}

/// The archive implied by a working directory: `/x/app` becomes `/x/app.asar`.
pub fn archive_for_dir(dir: &Path) -> PathBuf {
    let mut name: OsString = dir.components().collect::<PathBuf>().into_os_string();
    name.push(".asar");
    PathBuf::from(name)
}

fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    String::from_utf8(bytes).map_err(|_| Error::InvalidUtf8(path.to_path_buf()))
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_dir_strips_extension() {
        assert_eq!(find_dir(Path::new("/opt/app/resources/app.asar")), PathBuf::from("/opt/app/resources/app"));
        assert_eq!(find_dir(Path::new("relative/app.asar")), PathBuf::from("relative/app"));
        assert_eq!(find_dir(Path::new("a.b.asar")), PathBuf::from("a.b"));
    }

    #[test]
    fn test_archive_for_dir_normalizes() {
        assert_eq!(archive_for_dir(Path::new("/x/app/")), PathBuf::from("/x/app.asar"));
        assert_eq!(archive_for_dir(Path::new("x//app")), PathBuf::from("x/app.asar"));
    }

    #[test]
    fn test_explicit_archive_wins() {
        let patcher = Patcher::with_discovery(
            PatcherOptions::new().archive("/a/app.asar").features(["x", "y"]),
            || panic!("discovery must not run"),
        )
        .unwrap();
        assert_eq!(patcher.archive(), Path::new("/a/app.asar"));
        assert_eq!(patcher.dir(), Path::new("/a/app"));
        assert_eq!(patcher.features(), ["x", "y"]);
    }

    #[test]
    fn test_dir_implies_archive() {
        let patcher =
            Patcher::with_discovery(PatcherOptions::new().dir("/a/unpacked"), || None).unwrap();
        assert_eq!(patcher.archive(), Path::new("/a/unpacked.asar"));
        assert_eq!(patcher.dir(), Path::new("/a/unpacked"));
    }

    #[test]
    fn test_discovery_fallback_and_not_found() {
        let patcher = Patcher::with_discovery(PatcherOptions::new(), || {
            Some(PathBuf::from("/found/app.asar"))
        })
        .unwrap();
        assert_eq!(patcher.dir(), Path::new("/found/app"));

        let err = Patcher::with_discovery(PatcherOptions::new(), || None).unwrap_err();
        assert!(matches!(err, Error::ArchiveNotFound));

        let err = Patcher::with_discovery(PatcherOptions::new().archive(""), || None).unwrap_err();
        assert!(matches!(err, Error::ArchiveNotFound));
    }

    #[test]
    fn test_archive_without_extension_is_rejected() {
        for archive in ["/x/app", "/x/.asar"] {
            let err = Patcher::with_discovery(PatcherOptions::new().archive(archive), || None)
                .unwrap_err();
            assert!(matches!(err, Error::InvalidArchivePath(_)), "{}", archive);
        }

        let patcher = Patcher::with_discovery(
            PatcherOptions::new().archive("/x/app").dir("/x/work"),
            || None,
        )
        .unwrap();
        assert_eq!(patcher.dir(), Path::new("/x/work"));
    }

    #[test]
    fn test_patch_file_layout() {
        let patcher = Patcher::with_discovery(
            PatcherOptions::new().archive("app.asar").base_dir("/base"),
            || None,
        )
        .unwrap();
        assert_eq!(
            patcher.patch_file("pro"),
            Path::new("/base").join("patches").join("pro.diff")
        );
    }
}
