//! # asarpatch
//!
//! A pure-Rust library for patching the asar archive of an installed
//! Electron application.
//!
//! The patching workflow locates the application's `app.asar`, backs it up,
//! extracts it into a working directory, applies one unified-diff patch set
//! per requested feature, packs the directory back into the archive and
//! removes the working directory.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use asarpatch::{Patcher, PatcherOptions, RunOptions, Workflow};
//!
//! fn main() -> asarpatch::Result<()> {
//!     // Discover the archive and read patches from ./patches/<feature>.diff
//!     let patcher = Patcher::new(PatcherOptions::new().feature("pro"))?;
//!
//!     let report = Workflow::new(&patcher).run(RunOptions::default())?;
//!     if let Some(backup) = &report.backup {
//!         println!("Original kept at {}", backup.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### Reading an Archive
//!
//! ```rust,no_run
//! use asarpatch::Archive;
//!
//! fn main() -> asarpatch::Result<()> {
//!     let mut archive = Archive::open_path("app.asar")?;
//!     for entry in archive.entries() {
//!         println!("{}: {} bytes", entry.path, entry.size);
//!     }
//!     let package = archive.read("package.json")?;
//!     println!("{}", String::from_utf8_lossy(&package));
//!     Ok(())
//! }
//! ```
//!
//! ### Creating an Archive
//!
//! ```rust,no_run
//! use asarpatch::{PackOptions, create_package_with_options};
//!
//! fn main() -> asarpatch::Result<()> {
//!     let result = create_package_with_options("app", "app.asar", &PackOptions::new())?;
//!     println!("Packed {} files ({} bytes)", result.files_packed, result.data_size);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `async` | Yes | Packing on Tokio's blocking pool |
//! | `cli` | No | Command-line interface tool |
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`. Nothing is retried and there is no
//! rollback across steps; keep the backup until the run has succeeded.
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod archive_path;
pub mod error;
pub mod format;
pub mod locate;
pub mod patch;
pub mod patcher;
pub mod read;
pub mod version;
pub mod workflow;
pub mod write;

#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub mod async_pack;

pub use archive_path::ArchivePath;
pub use error::{Error, Result};

// Re-export the patching API at crate root for convenience
pub use patcher::{PatchMode, Patcher, PatcherOptions, find_dir};
pub use workflow::{RunOptions, RunReport, Stage, Workflow};

// Re-export reading API
pub use read::{Archive, Entry, EntryKind, ExtractResult, extract_all};

// Re-export writing API
pub use write::{PackOptions, PackResult, create_package, create_package_with_options};

// Re-export discovery API
pub use locate::{FsProbe, Platform, RealFs, locate_archive};
pub use version::{AppVersion, find_last_app_version};

#[cfg(feature = "async")]
pub use async_pack::{create_package_async, create_package_async_with_options};
