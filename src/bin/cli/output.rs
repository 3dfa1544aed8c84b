//! Output formatting for CLI operations.

use serde_json::json;
use std::path::Path;

use asarpatch::{Entry, EntryKind, ExtractResult, PackResult, RunReport};

/// Trait for output formatting
pub trait OutputFormatter {
    /// Formats a list of entries
    fn format_list(&self, entries: &[Entry]) -> String;

    /// Formats extraction results
    fn format_extract_result(&self, result: &ExtractResult, dest: &Path) -> String;

    /// Formats packing results
    fn format_pack_result(&self, result: &PackResult, archive: &Path) -> String;

    /// Formats a backup location
    fn format_backup(&self, backup: &Path) -> String;

    /// Formats a discovered archive path
    fn format_locate(&self, archive: Option<&Path>) -> String;

    /// Formats the outcome of a full patch run
    fn format_patch_report(&self, report: &RunReport, features: &[String], archive: &Path) -> String;
}

/// Human-readable output formatter
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn format_list(&self, entries: &[Entry]) -> String {
        let mut output = String::new();

        output.push_str(&format!("{:>12} {:>4} {}\n", "Size", "Kind", "Name"));
        output.push_str(&"-".repeat(70));
        output.push('\n');

        let mut total_size: u64 = 0;
        let mut file_count = 0;
        let mut dir_count = 0;

        for entry in entries {
            let (kind, size_str, suffix) = match &entry.kind {
                EntryKind::Directory => {
                    dir_count += 1;
                    ("D", String::new(), String::new())
                }
                EntryKind::File { unpacked, executable, .. } => {
                    file_count += 1;
                    total_size += entry.size;
                    let kind = match (*unpacked, *executable) {
                        (true, _) => "U",
                        (false, true) => "X",
                        (false, false) => "",
                    };
                    (kind, humanize_bytes(entry.size), String::new())
                }
                EntryKind::Link { target } => ("L", String::new(), format!(" -> {}", target)),
            };
            output.push_str(&format!("{:>12} {:>4} {}{}\n", size_str, kind, entry.path, suffix));
        }

        output.push_str(&"-".repeat(70));
        output.push('\n');
        output.push_str(&format!(
            "{} files, {} directories, {} total\n",
            file_count,
            dir_count,
            humanize_bytes(total_size)
        ));

        output
    }

    fn format_extract_result(&self, result: &ExtractResult, dest: &Path) -> String {
        let mut output = format!(
            "Extracted {} files ({}) to {}\n",
            result.files_extracted,
            humanize_bytes(result.bytes_extracted),
            dest.display()
        );
        if result.links_skipped > 0 {
            output.push_str(&format!("Skipped {} links\n", result.links_skipped));
        }
        output
    }

    fn format_pack_result(&self, result: &PackResult, archive: &Path) -> String {
        format!(
            "Packed {} files ({}) into {}\n",
            result.files_packed,
            humanize_bytes(result.data_size),
            archive.display()
        )
    }

    fn format_backup(&self, backup: &Path) -> String {
        format!("Backup written to {}\n", backup.display())
    }

    fn format_locate(&self, archive: Option<&Path>) -> String {
        match archive {
            Some(path) => format!("{}\n", path.display()),
            None => "No archive found\n".to_string(),
        }
    }

    fn format_patch_report(&self, report: &RunReport, features: &[String], archive: &Path) -> String {
        let mut output = String::new();
        if let Some(backup) = &report.backup {
            output.push_str(&self.format_backup(backup));
        }
        output.push_str(&format!("Applied features: {}\n", features.join(", ")));
        output.push_str(&self.format_pack_result(&report.packed, archive));
        output
    }
}

/// JSON output formatter
pub struct JsonFormatter;

impl JsonFormatter {
    fn entry_json(entry: &Entry) -> serde_json::Value {
        let (kind, link) = match &entry.kind {
            EntryKind::Directory => ("directory", None),
            EntryKind::File { .. } => ("file", None),
            EntryKind::Link { target } => ("link", Some(target.as_str())),
        };
        let (executable, unpacked) = match entry.kind {
            EntryKind::File { executable, unpacked, .. } => (executable, unpacked),
            _ => (false, false),
        };
        json!({
            "path": entry.path.as_str(),
            "kind": kind,
            "size": entry.size,
            "executable": executable,
            "unpacked": unpacked,
            "link": link,
        })
    }

    fn pack_json(result: &PackResult, archive: &Path) -> serde_json::Value {
        json!({
            "archive": archive.display().to_string(),
            "files_packed": result.files_packed,
            "directories": result.directories,
            "links": result.links,
            "data_size": result.data_size,
            "header_size": result.header_size,
        })
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_list(&self, entries: &[Entry]) -> String {
        let items: Vec<_> = entries.iter().map(Self::entry_json).collect();
        serde_json::to_string_pretty(&items).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_extract_result(&self, result: &ExtractResult, dest: &Path) -> String {
        let obj = json!({
            "destination": dest.display().to_string(),
            "files_extracted": result.files_extracted,
            "directories_created": result.directories_created,
            "links_created": result.links_created,
            "links_skipped": result.links_skipped,
            "bytes_extracted": result.bytes_extracted,
        });
        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_pack_result(&self, result: &PackResult, archive: &Path) -> String {
        serde_json::to_string_pretty(&Self::pack_json(result, archive))
            .unwrap_or_else(|_| "{}".to_string())
    }

    fn format_backup(&self, backup: &Path) -> String {
        let obj = json!({ "backup": backup.display().to_string() });
        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_locate(&self, archive: Option<&Path>) -> String {
        let obj = json!({ "archive": archive.map(|p| p.display().to_string()) });
        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_patch_report(&self, report: &RunReport, features: &[String], archive: &Path) -> String {
        let obj = json!({
            "success": true,
            "features": features,
            "backup": report.backup.as_ref().map(|p| p.display().to_string()),
            "files_extracted": report.unpacked.files_extracted,
            "packed": Self::pack_json(&report.packed, archive),
            "cleaned_up": report.cleaned_up,
        });
        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Creates the appropriate formatter based on output format
pub fn create_formatter(format: super::OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        super::OutputFormat::Human => Box::new(HumanFormatter),
        super::OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Converts bytes to a human-readable string
pub fn humanize_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
