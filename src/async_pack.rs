//! Async archive packing with Tokio.
//!
//! Packing is file-bound, synchronous work; this module moves it onto
//! Tokio's blocking pool so callers on an async runtime are not stalled.
//!
//! # Example
//!
//! ```rust,ignore
//! use asarpatch::async_pack::create_package_async;
//!
//! #[tokio::main]
//! async fn main() -> asarpatch::Result<()> {
//!     let result = create_package_async("app", "app.asar").await?;
//!     println!("Packed {} files", result.files_packed);
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;

use crate::write::{PackOptions, PackResult, create_package_with_options};
use crate::{Error, Result};

/// Packs `src` into `dest` on the blocking pool.
///
/// The returned future must be awaited before relying on the archive's new
/// contents (for example, before deleting `src`).
pub async fn create_package_async(
    src: impl Into<PathBuf>,
    dest: impl Into<PathBuf>,
) -> Result<PackResult> {
    create_package_async_with_options(src, dest, PackOptions::default()).await
}

/// Packs `src` into `dest` with `options` on the blocking pool.
pub async fn create_package_async_with_options(
    src: impl Into<PathBuf>,
    dest: impl Into<PathBuf>,
    options: PackOptions,
) -> Result<PackResult> {
    let src = src.into();
    let dest = dest.into();
    tokio::task::spawn_blocking(move || create_package_with_options(&src, &dest, &options))
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))?
}
