//! Command implementations for the CLI tool.

use std::path::{Path, PathBuf};

use asarpatch::locate::home_dir;
use asarpatch::patcher::archive_for_dir;
use asarpatch::{
    Archive, PackOptions, PatchMode, Patcher, PatcherOptions, Platform, RealFs, RunOptions,
    Workflow, create_package_with_options, extract_all, find_dir, locate_archive,
};

use crate::OutputFormat;
use crate::exit_codes::{ExitCode, error_to_exit_code};
use crate::output::create_formatter;

/// Configuration for the patch command.
pub struct PatchConfig<'a> {
    pub features: &'a [String],
    pub asar: Option<PathBuf>,
    pub dir: Option<PathBuf>,
    pub base_dir: PathBuf,
    pub backup: bool,
    pub cleanup: bool,
    pub staged: bool,
    pub format: OutputFormat,
    pub quiet: bool,
}

/// Patch command implementation
pub fn patch(config: &PatchConfig<'_>) -> ExitCode {
    let formatter = create_formatter(config.format);

    let mut options = PatcherOptions::new()
        .features(config.features.iter().cloned())
        .base_dir(&config.base_dir)
        .mode(if config.staged {
            PatchMode::Staged
        } else {
            PatchMode::Direct
        });
    if let Some(asar) = &config.asar {
        options = options.archive(asar);
    }
    if let Some(dir) = &config.dir {
        options = options.dir(dir);
    }

    let patcher = match Patcher::new(options) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            return error_to_exit_code(&e);
        }
    };

    let run = RunOptions {
        backup: config.backup,
        cleanup: config.cleanup,
    };
    match Workflow::new(&patcher).run(run) {
        Ok(report) => {
            if !config.quiet || config.format == OutputFormat::Json {
                print!(
                    "{}",
                    formatter.format_patch_report(&report, patcher.features(), patcher.archive())
                );
            }
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            if e.is_patch_failure() || e.is_io_kind(std::io::ErrorKind::NotFound) {
                eprintln!(
                    "The working directory {} may be partially patched",
                    patcher.dir().display()
                );
            }
            error_to_exit_code(&e)
        }
    }
}

/// Locate command implementation
pub fn locate(format: OutputFormat) -> ExitCode {
    let formatter = create_formatter(format);

    let Some(platform) = Platform::current() else {
        eprintln!("Error: unsupported platform");
        return ExitCode::NotFound;
    };
    let found = locate_archive(platform, home_dir().as_deref(), &RealFs);
    print!("{}", formatter.format_locate(found.as_deref()));

    if found.is_some() {
        ExitCode::Success
    } else {
        ExitCode::NotFound
    }
}

/// Backup command implementation
pub fn backup(asar: Option<PathBuf>, format: OutputFormat, quiet: bool) -> ExitCode {
    let formatter = create_formatter(format);

    let mut options = PatcherOptions::new();
    if let Some(asar) = asar {
        options = options.archive(asar);
    }
    let result = Patcher::new(options).and_then(|patcher| patcher.backup_archive());

    match result {
        Ok(path) => {
            if !quiet || format == OutputFormat::Json {
                print!("{}", formatter.format_backup(&path));
            }
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            error_to_exit_code(&e)
        }
    }
}

/// Unpack command implementation
pub fn unpack(archive: &Path, output: Option<PathBuf>, format: OutputFormat, quiet: bool) -> ExitCode {
    let formatter = create_formatter(format);
    let dest = output.unwrap_or_else(|| find_dir(archive));

    match extract_all(archive, &dest) {
        Ok(result) => {
            if !quiet || format == OutputFormat::Json {
                print!("{}", formatter.format_extract_result(&result, &dest));
            }
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            error_to_exit_code(&e)
        }
    }
}

/// Pack command implementation
pub fn pack(
    dir: &Path,
    output: Option<PathBuf>,
    integrity: bool,
    format: OutputFormat,
    quiet: bool,
) -> ExitCode {
    let formatter = create_formatter(format);
    let archive = output.unwrap_or_else(|| archive_for_dir(dir));
    let options = PackOptions::new().integrity(integrity);

    match create_package_with_options(dir, &archive, &options) {
        Ok(result) => {
            if !quiet || format == OutputFormat::Json {
                print!("{}", formatter.format_pack_result(&result, &archive));
            }
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            error_to_exit_code(&e)
        }
    }
}

/// List command implementation
pub fn list(archive_path: &Path, format: OutputFormat) -> ExitCode {
    let formatter = create_formatter(format);

    let archive = match Archive::open_path(archive_path) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error opening archive: {}", e);
            return error_to_exit_code(&e);
        }
    };

    print!("{}", formatter.format_list(archive.entries()));
    ExitCode::Success
}
