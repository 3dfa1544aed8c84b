//! Hunk application.

use super::{FilePatch, Hunk, HunkLine};
use crate::{Error, Result};

/// One source line and the line ending it carried.
#[derive(Debug, Clone)]
struct Line {
    text: String,
    eol: &'static str,
}

/// Source text split into lines, each keeping its own ending.
struct Lines {
    lines: Vec<Line>,
    /// Ending given to lines whose neighbours carry none.
    default_eol: &'static str,
    trailing_newline: bool,
}

impl Lines {
    fn split(text: &str) -> Self {
        let mut lines = Vec::new();
        let mut rest = text;
        while let Some(idx) = rest.find('\n') {
            let (line, eol) = match rest[..idx].strip_suffix('\r') {
                Some(line) => (line, "\r\n"),
                None => (&rest[..idx], "\n"),
            };
            lines.push(Line {
                text: line.to_string(),
                eol,
            });
            rest = &rest[idx + 1..];
        }
        let trailing_newline = rest.is_empty() && !lines.is_empty();
        if !rest.is_empty() {
            lines.push(Line {
                text: rest.to_string(),
                eol: "",
            });
        }
        let default_eol = lines.first().map_or("\n", |line| line.eol);
        Self {
            lines,
            default_eol: if default_eol.is_empty() { "\n" } else { default_eol },
            trailing_newline,
        }
    }

    fn join(self) -> String {
        let last = self.lines.len().saturating_sub(1);
        let mut out = String::new();
        for (index, line) in self.lines.iter().enumerate() {
            out.push_str(&line.text);
            if index < last || self.trailing_newline {
                out.push_str(if line.eol.is_empty() { self.default_eol } else { line.eol });
            }
        }
        out
    }

    fn matches_at(&self, pos: usize, expected: &[&str]) -> bool {
        self.lines
            .get(pos..pos + expected.len())
            .is_some_and(|window| window.iter().zip(expected).all(|(a, b)| a.text == *b))
    }

    /// Builds the replacement for the `old_len` lines at `pos`.
    ///
    /// Context lines keep their source ending. An added line takes the
    /// ending of the line it replaces, else the line before it, else the
    /// line after it.
    fn replacement(&self, pos: usize, hunk: &Hunk) -> Vec<Line> {
        let mut out: Vec<Line> = Vec::new();
        let mut cursor = pos;
        let mut removed_eol: Option<&'static str> = None;
        for line in &hunk.lines {
            match line {
                HunkLine::Context(_) => {
                    out.push(self.lines[cursor].clone());
                    cursor += 1;
                    removed_eol = None;
                }
                HunkLine::Remove(_) => {
                    removed_eol = Some(self.lines[cursor].eol);
                    cursor += 1;
                }
                HunkLine::Add(text) => {
                    let eol = removed_eol
                        .into_iter()
                        .chain(out.last().map(|line| line.eol))
                        .chain(pos.checked_sub(1).and_then(|i| self.lines.get(i)).map(|line| line.eol))
                        .chain(self.lines.get(cursor).map(|line| line.eol))
                        .find(|eol| !eol.is_empty())
                        .unwrap_or(self.default_eol);
                    out.push(Line {
                        text: text.clone(),
                        eol,
                    });
                }
            }
        }
        out
    }
}

/// Applies the hunks of `patch` to `source`, returning the patched text.
///
/// Each hunk is looked up at the line its header names, adjusted by the net
/// line shift of the preceding hunks. If its source lines are not found
/// there, the search moves outward one line at a time, alternating below
/// and above, without crossing the previous hunk. Context must match
/// exactly.
///
/// Lines outside the hunks keep their own line endings. When the last hunk
/// reaches the end of the file, the result ends with a newline unless the
/// hunk carries a `\ No newline at end of file` marker on its new side, so
/// a source without a trailing newline gains one if the diff does not say
/// otherwise.
///
/// # Errors
///
/// Returns [`Error::PatchConflict`] naming the first hunk that does not
/// apply.
pub fn apply_patch(source: &str, patch: &FilePatch) -> Result<String> {
    let mut text = Lines::split(source);
    let mut shift: isize = 0;
    let mut floor = 0usize;

    for (index, hunk) in patch.hunks.iter().enumerate() {
        let old: Vec<&str> = hunk.old_side().collect();

        let nominal = if hunk.old_lines == 0 {
            hunk.old_start
        } else {
            hunk.old_start.saturating_sub(1)
        };
        let expected = (nominal as isize + shift).max(floor as isize) as usize;

        let pos = find_hunk(&text, &old, expected, floor).ok_or_else(|| Error::PatchConflict {
            file: patch.display_path().to_string(),
            hunk: index + 1,
        })?;

        let new = text.replacement(pos, hunk);
        let new_len = new.len();
        text.lines.splice(pos..pos + old.len(), new);
        shift += new_len as isize - old.len() as isize + (pos as isize - expected as isize);
        floor = pos + new_len;

        if floor == text.lines.len() && (old.len() + new_len > 0) {
            text.trailing_newline = !hunk.new_missing_newline && !text.lines.is_empty();
        }
    }

    Ok(text.join())
}
