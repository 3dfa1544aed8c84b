//! Version parsing and ordering for installed application directories.
//!
//! Windows installs keep one `app-<major>.<minor>.<patch>` directory per
//! version side by side. Selecting the newest needs semantic-version
//! ordering (`1.10.0` > `1.9.9`), which plain string ordering gets wrong.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

static APP_DIR_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"app-(\d+\.\d+\.\d+)").expect("app directory pattern"));

/// A `major.minor.patch` version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AppVersion {
    /// Major version.
    pub major: u64,
    /// Minor version.
    pub minor: u64,
    /// Patch version.
    pub patch: u64,
}

/// Error returned when a string is not a `major.minor.patch` version.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid version '{0}'")]
pub struct ParseVersionError(String);

impl FromStr for AppVersion {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseVersionError(s.to_string());
        let mut parts = s.split('.');
        let mut next = || -> Result<u64, ParseVersionError> {
            let part = parts.next().ok_or_else(invalid)?;
            let valid = !part.is_empty()
                && part.bytes().all(|b| b.is_ascii_digit())
                && (part == "0" || !part.starts_with('0'));
            if !valid {
                return Err(invalid());
            }
            part.parse().map_err(|_| invalid())
        };
        let version = Self {
            major: next()?,
            minor: next()?,
            patch: next()?,
        };
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(version)
    }
}

impl fmt::Display for AppVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Extracts the version embedded in an install directory name.
///
/// ```
/// use asarpatch::version::extract_app_version;
///
/// assert_eq!(extract_app_version("app-7.4.1"), Some("7.4.1"));
/// assert_eq!(extract_app_version("packages"), None);
/// ```
pub fn extract_app_version(name: &str) -> Option<&str> {
    APP_DIR_VERSION
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Returns the greatest version string under semantic-version ordering.
///
/// On ties the earliest occurrence wins. Strings that are not valid
/// versions are skipped with a warning. Returns `None` if no string parses.
///
/// ```
/// use asarpatch::version::find_last_app_version;
///
/// assert_eq!(find_last_app_version(&["1.2.0", "1.10.0", "1.9.9"]), Some("1.10.0"));
/// ```
pub fn find_last_app_version<S: AsRef<str>>(versions: &[S]) -> Option<&str> {
    let mut best: Option<(AppVersion, &str)> = None;
    for raw in versions {
        let raw = raw.as_ref();
        let version = match raw.parse::<AppVersion>() {
            Ok(version) => version,
            Err(e) => {
                log::warn!("Skipping install directory: {}", e);
                continue;
            }
        };
        if best.is_none_or(|(max, _)| version > max) {
            best = Some((version, raw));
        }
    }
    best.map(|(_, raw)| raw)
}

/// Compares two names in natural order: digit runs compare numerically,
/// everything else byte by byte.
///
/// ```
/// use asarpatch::version::natural_cmp;
/// use std::cmp::Ordering;
///
/// assert_eq!(natural_cmp("app-1.9.0", "app-1.10.0"), Ordering::Less);
/// ```
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (mut a, mut b) = (a.as_bytes(), b.as_bytes());
    loop {
        match (a.first(), b.first()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let (run_a, rest_a) = split_digits(a);
                let (run_b, rest_b) = split_digits(b);
                let ordering = compare_digit_runs(run_a, run_b);
                if ordering != Ordering::Equal {
                    return ordering;
                }
                (a, b) = (rest_a, rest_b);
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(y);
                }
                (a, b) = (&a[1..], &b[1..]);
            }
        }
    }
}

fn split_digits(s: &[u8]) -> (&[u8], &[u8]) {
    let end = s.iter().position(|b| !b.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

fn compare_digit_runs(a: &[u8], b: &[u8]) -> Ordering {
    let trim = |s: &[u8]| -> usize { s.iter().take_while(|&&d| d == b'0').count() };
    let (a_sig, b_sig) = (&a[trim(a)..], &b[trim(b)..]);
    a_sig
        .len()
        .cmp(&b_sig.len())
        .then_with(|| a_sig.cmp(b_sig))
        .then_with(|| a.len().cmp(&b.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_versions() {
        let v: AppVersion = "7.4.12".parse().unwrap();
        assert_eq!((v.major, v.minor, v.patch), (7, 4, 12));
        assert_eq!(v.to_string(), "7.4.12");
        for bad in ["", "1.2", "1.2.3.4", "1.x.3", "01.2.3", "-1.2.3", "1..3"] {
            assert!(bad.parse::<AppVersion>().is_err(), "{bad}");
        }
    }

    #[test]
    fn test_semver_beats_lexical() {
        assert_eq!(
            find_last_app_version(&["1.2.0", "1.10.0", "1.9.9"]),
            Some("1.10.0")
        );
        assert_eq!(find_last_app_version(&["2.0.0", "10.0.0"]), Some("10.0.0"));
    }

    #[test]
    fn test_empty_and_invalid() {
        let none: [&str; 0] = [];
        assert_eq!(find_last_app_version(&none), None);
        assert_eq!(find_last_app_version(&["junk"]), None);
        assert_eq!(find_last_app_version(&["junk", "0.0.1"]), Some("0.0.1"));
    }

    #[test]
    fn test_extract_app_version() {
        assert_eq!(extract_app_version("app-6.5.3"), Some("6.5.3"));
        assert_eq!(extract_app_version("app-6.5"), None);
        assert_eq!(extract_app_version("app-6.5.3-beta"), Some("6.5.3"));
    }

    #[test]
    fn test_natural_cmp() {
        let mut names = vec!["app-1.10.0", "app-1.9.0", "app-1.2.0", "app"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["app", "app-1.2.0", "app-1.9.0", "app-1.10.0"]);
        assert_eq!(natural_cmp("a01", "a1"), Ordering::Greater);
        assert_eq!(natural_cmp("x", "x"), Ordering::Equal);
    }
}
