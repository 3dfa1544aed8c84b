//! Ordered execution of the patching steps.
//!
//! [`Patcher`] exposes each step independently. [`Workflow`] tracks which
//! step ran last and refuses to run a step out of order, before touching
//! the file system.
//!
//! ```rust,no_run
//! use asarpatch::{Patcher, PatcherOptions, RunOptions, Workflow};
//!
//! let patcher = Patcher::new(PatcherOptions::new().feature("pro"))?;
//! let report = Workflow::new(&patcher).run(RunOptions::default())?;
//! println!("{} files repacked", report.packed.files_packed);
//! # Ok::<(), asarpatch::Error>(())
//! ```

use std::fmt;
use std::path::PathBuf;

use crate::read::ExtractResult;
use crate::write::PackResult;
use crate::{Error, Patcher, Result};

/// Progress of a [`Workflow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Nothing has run yet.
    Created,
    /// The archive has been extracted into the working directory.
    Unpacked,
    /// Every feature's patch set has been applied.
    Patched,
    /// The working directory has been packed back into the archive.
    Packed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Unpacked => write!(f, "unpacked"),
            Self::Patched => write!(f, "patched"),
            Self::Packed => write!(f, "packed"),
        }
    }
}

/// Options for [`Workflow::run`].
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Back up the archive before unpacking.
    pub backup: bool,
    /// Remove the working directory after packing.
    pub cleanup: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            backup: true,
            cleanup: true,
        }
    }
}

/// Outcome of a full [`Workflow::run`].
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Path of the backup, if one was taken.
    pub backup: Option<PathBuf>,
    /// Extraction statistics.
    pub unpacked: ExtractResult,
    /// Packing statistics.
    pub packed: PackResult,
    /// Whether the working directory was removed.
    pub cleaned_up: bool,
}

/// Step-ordered driver over a borrowed [`Patcher`].
#[derive(Debug)]
pub struct Workflow<'a> {
    patcher: &'a Patcher,
    stage: Stage,
    backup: Option<PathBuf>,
}

impl<'a> Workflow<'a> {
    /// Starts a workflow in [`Stage::Created`].
    pub fn new(patcher: &'a Patcher) -> Self {
        Self {
            patcher,
            stage: Stage::Created,
            backup: None,
        }
    }

    /// The current stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The patcher being driven.
    pub fn patcher(&self) -> &'a Patcher {
        self.patcher
    }

    /// Path of the backup taken by [`Workflow::backup`], if any.
    pub fn backup_path(&self) -> Option<&PathBuf> {
        self.backup.as_ref()
    }

    fn require(&self, expected: Stage) -> Result<()> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(Error::StageOrder {
                expected,
                actual: self.stage,
            })
        }
    }

    /// Backs up the archive. Only allowed before unpacking.
    pub fn backup(&mut self) -> Result<PathBuf> {
        self.require(Stage::Created)?;
        let path = self.patcher.backup_archive()?;
        self.backup = Some(path.clone());
        Ok(path)
    }

    /// Extracts the archive.
    pub fn unpack(&mut self) -> Result<ExtractResult> {
        self.require(Stage::Created)?;
        log::debug!("workflow: unpack");
        let result = self.patcher.unpack_archive()?;
        self.stage = Stage::Unpacked;
        Ok(result)
    }

    /// Applies every feature's patch set.
    pub fn patch(&mut self) -> Result<()> {
        self.require(Stage::Unpacked)?;
        log::debug!("workflow: patch");
        self.patcher.patch_dir()?;
        self.stage = Stage::Patched;
        Ok(())
    }

    /// Repacks the working directory.
    pub fn pack(&mut self) -> Result<PackResult> {
        self.require(Stage::Patched)?;
        log::debug!("workflow: pack");
        let result = self.patcher.pack_dir()?;
        self.stage = Stage::Packed;
        Ok(result)
    }

    /// Repacks the working directory on Tokio's blocking pool.
    #[cfg(feature = "async")]
    pub async fn pack_async(&mut self) -> Result<PackResult> {
        self.require(Stage::Patched)?;
        log::debug!("workflow: pack (async)");
        let result = self.patcher.pack_dir_async().await?;
        self.stage = Stage::Packed;
        Ok(result)
    }

    /// Removes the working directory. Only allowed once packed.
    pub fn cleanup(&mut self) -> Result<()> {
        self.require(Stage::Packed)?;
        log::debug!("workflow: cleanup");
        self.patcher.remove_dir()
    }

    /// Runs every remaining step from [`Stage::Created`].
    pub fn run(mut self, options: RunOptions) -> Result<RunReport> {
        let backup = if options.backup {
            Some(self.backup()?)
        } else {
            None
        };
        let unpacked = self.unpack()?;
        self.patch()?;
        let packed = self.pack()?;
        if options.cleanup {
            self.cleanup()?;
        }
        Ok(RunReport {
            backup,
            unpacked,
            packed,
            cleaned_up: options.cleanup,
        })
    }
}
