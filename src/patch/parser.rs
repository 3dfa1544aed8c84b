//! Unified-diff parser.

use std::sync::LazyLock;

use regex::Regex;

use super::{FilePatch, Hunk, HunkLine};
use crate::{ArchivePath, Error, Result};

static HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").expect("hunk header pattern")
});

const DEV_NULL: &str = "/dev/null";

/// Parses a unified-diff document into per-file patches.
///
/// Lines outside file sections (`Index:`, `===`, `diff --git`, `index ..`,
/// mode lines, commentary) are skipped. Git-style `a/` and `b/` prefixes are
/// stripped when the section starts with `diff --git`. Pure git renames
/// without content changes produce a patch with no hunks.
///
/// # Errors
///
/// Returns [`Error::PatchParse`] for hunks outside a file section, malformed
/// hunk headers, line counts that disagree with their header, and file
/// names that are not safe relative paths.
pub fn parse_patch(text: &str) -> Result<Vec<FilePatch>> {
    let mut parser = Parser::new(text);
    let mut patches = Vec::new();
    while let Some(patch) = parser.next_file_patch()? {
        patches.push(patch);
    }
    Ok(patches)
}

/// Metadata collected from a `diff --git` preamble.
#[derive(Default)]
struct GitPreamble<'a> {
    started: bool,
    rename_from: Option<&'a str>,
    rename_to: Option<&'a str>,
}

struct Parser<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        let lines = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();
        Self { lines, pos: 0 }
    }

    fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<&'a str> {
        self.lines.get(self.pos + ahead).copied()
    }

    fn error(&self, line: usize, reason: impl Into<String>) -> Error {
        Error::PatchParse {
            line: line + 1,
            reason: reason.into(),
        }
    }

    fn next_file_patch(&mut self) -> Result<Option<FilePatch>> {
        let mut git = GitPreamble::default();
        let (old_header, new_header) = loop {
            let Some(line) = self.peek() else {
                return self.pure_rename(&git);
            };
            if line.starts_with("diff --git ") {
                if git.started {
                    if let Some(patch) = self.pure_rename(&git)? {
                        return Ok(Some(patch));
                    }
                    git = GitPreamble::default();
                }
                git.started = true;
            } else if let Some(from) = line.strip_prefix("rename from ").filter(|_| git.started) {
                git.rename_from = Some(from);
            } else if let Some(to) = line.strip_prefix("rename to ").filter(|_| git.started) {
                git.rename_to = Some(to);
            } else if let (Some(old), Some(new)) = (
                line.strip_prefix("--- "),
                self.peek_at(1).and_then(|next| next.strip_prefix("+++ ")),
            ) {
                break (old, new);
            } else if line.starts_with("@@ ") {
                return Err(self.error(self.pos, "hunk without file header"));
            }
            self.pos += 1;
        };

        let header_line = self.pos;
        let old_path = self.header_path(header_line, old_header, git.started.then_some("a/"))?;
        let new_path = self.header_path(header_line + 1, new_header, git.started.then_some("b/"))?;
        if old_path.is_none() && new_path.is_none() {
            return Err(self.error(header_line, "both file names are /dev/null"));
        }
        self.pos += 2;

        let mut hunks = Vec::new();
        while self.peek().is_some_and(|line| line.starts_with("@@")) {
            hunks.push(self.parse_hunk()?);
        }
        if hunks.is_empty() {
            return Err(self.error(header_line, "file header without hunks"));
        }

        Ok(Some(FilePatch {
            old_path,
            new_path,
            hunks,
        }))
    }

    fn pure_rename(&self, git: &GitPreamble<'a>) -> Result<Option<FilePatch>> {
        match (git.rename_from, git.rename_to) {
            (Some(from), Some(to)) => Ok(Some(FilePatch {
                old_path: self.header_path(self.pos, from, None)?,
                new_path: self.header_path(self.pos, to, None)?,
                hunks: Vec::new(),
            })),
            _ => Ok(None),
        }
    }

    fn header_path(
        &self,
        line: usize,
        header: &str,
        git_prefix: Option<&str>,
    ) -> Result<Option<ArchivePath>> {
        let name = file_name(header);
        if name == DEV_NULL {
            return Ok(None);
        }
        let name = match git_prefix {
            Some(prefix) => name.strip_prefix(prefix).unwrap_or(&name).to_string(),
            None => name,
        };
        ArchivePath::normalize(&name)
            .map(Some)
            .map_err(|e| self.error(line, format!("invalid file name '{}': {}", name, e)))
    }

    fn parse_hunk(&mut self) -> Result<Hunk> {
        let header_line = self.pos;
        let header = self.peek().unwrap_or_default();
        let caps = HUNK_HEADER
            .captures(header)
            .ok_or_else(|| self.error(header_line, format!("malformed hunk header '{}'", header)))?;
        let number = |index: usize| -> Result<usize> {
            match caps.get(index) {
                Some(m) => m
                    .as_str()
                    .parse()
                    .map_err(|_| self.error(header_line, "hunk range out of bounds")),
                None => Ok(1),
            }
        };
        let old_start = number(1)?;
        let old_lines = number(2)?;
        let new_start = number(3)?;
        let new_lines = number(4)?;
        self.pos += 1;

        let mut lines = Vec::new();
        let (mut removed, mut added) = (0usize, 0usize);
        let (mut old_missing_newline, mut new_missing_newline) = (false, false);

        while let Some(line) = self.peek() {
            let complete = removed >= old_lines && added >= new_lines;
            let is_last = self.pos + 1 == self.lines.len();
            let op = if line.is_empty() && !is_last && !complete {
                Some(' ')
            } else {
                line.chars().next()
            };
            let text = line.get(1..).unwrap_or_default().to_string();
            match op {
                Some('\\') => match lines.last() {
                    Some(HunkLine::Context(_)) => {
                        old_missing_newline = true;
                        new_missing_newline = true;
                    }
                    Some(HunkLine::Remove(_)) => old_missing_newline = true,
                    Some(HunkLine::Add(_)) => new_missing_newline = true,
                    None => {}
                },
                _ if complete => break,
                Some(' ') => {
                    lines.push(HunkLine::Context(text));
                    removed += 1;
                    added += 1;
                }
                Some('-') => {
                    lines.push(HunkLine::Remove(text));
                    removed += 1;
                }
                Some('+') => {
                    lines.push(HunkLine::Add(text));
                    added += 1;
                }
                _ => break,
            }
            self.pos += 1;
        }

        if removed != old_lines || added != new_lines {
            return Err(self.error(
                header_line,
                format!(
                    "hunk expects -{} +{} lines, found -{} +{}",
                    old_lines, new_lines, removed, added
                ),
            ));
        }

        Ok(Hunk {
            old_start,
            old_lines,
            new_start,
            new_lines,
            lines,
            old_missing_newline,
            new_missing_newline,
        })
    }
}

/// Extracts the file name from the remainder of a `---`/`+++` line.
fn file_name(header: &str) -> String {
    let name = header.trim_start().split('\t').next().unwrap_or_default();
    let name = name.trim_end();
    let name = name
        .strip_prefix('"')
        .and_then(|n| n.strip_suffix('"'))
        .unwrap_or(name);
    name.replace("\\\\", "\\")
}
