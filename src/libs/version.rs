// Dotted numeric version strings (`5.0.8`, `2.34`) and their ordering.
//
// Missing trailing components count as zero, so `5.0` and `5.0.0` are equal.
// Anything that is not a plain integer component is rejected; the probe turns
// that rejection into `Indeterminate` instead of trusting a half-parsed number.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::schemas::errors::VersionError;

// First `major.minor[.patch]` in a blob of `--version` output.
static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+(\.\d+)?").expect("version pattern is a valid regex"));

/// A parsed version: its integer components in order.
#[derive(Debug, Clone)]
pub struct ToolVersion {
    components: Vec<u64>,
}

impl FromStr for ToolVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(VersionError::Empty);
        }
        let components = trimmed
            .split('.')
            .map(|component| {
                component
                    .parse::<u64>()
                    .map_err(|_| VersionError::MalformedVersion {
                        version: trimmed.to_string(),
                        component: component.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ToolVersion { components })
    }
}

impl Ord for ToolVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        (0..len)
            .map(|i| {
                let a = self.components.get(i).copied().unwrap_or(0);
                let b = other.components.get(i).copied().unwrap_or(0);
                a.cmp(&b)
            })
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for ToolVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Equality follows the ordering so that `5.0 == 5.0.0`.
impl PartialEq for ToolVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ToolVersion {}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.components.iter().map(u64::to_string).collect();
        f.write_str(&parts.join("."))
    }
}

/// Orders two dotted version strings.
///
/// # Errors
/// `VersionError` if either side is empty or has a non-integer component.
pub fn compare_versions(a: &str, b: &str) -> Result<Ordering, VersionError> {
    let a: ToolVersion = a.parse()?;
    let b: ToolVersion = b.parse()?;
    Ok(a.cmp(&b))
}

/// `a < b`, with the same error conditions as `compare_versions`.
pub fn is_less_than(a: &str, b: &str) -> Result<bool, VersionError> {
    Ok(compare_versions(a, b)? == Ordering::Less)
}

/// Pulls the first `\d+\.\d+(\.\d+)?` match out of free-form command output.
pub fn extract_version(output: &str) -> Option<String> {
    VERSION_PATTERN
        .find(output)
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_equal() {
        assert_eq!(compare_versions("5.0.8", "5.0.8").unwrap(), Ordering::Equal);
    }

    #[test]
    fn test_compare_less() {
        assert_eq!(compare_versions("5.0.7", "5.0.8").unwrap(), Ordering::Less);
        assert!(is_less_than("4.3.11", "5.0.8").unwrap());
    }

    #[test]
    fn test_compare_numeric_not_lexical() {
        assert_eq!(compare_versions("5.1", "5.0.99").unwrap(), Ordering::Greater);
        assert_eq!(compare_versions("5.10", "5.9").unwrap(), Ordering::Greater);
    }

    #[test]
    fn test_missing_components_are_zero() {
        assert_eq!(compare_versions("5.0", "5.0.0").unwrap(), Ordering::Equal);
        assert_eq!(compare_versions("5", "5.0.1").unwrap(), Ordering::Less);
        assert_eq!("5.0".parse::<ToolVersion>().unwrap(), "5.0.0".parse().unwrap());
    }

    #[test]
    fn test_malformed_version() {
        let err = compare_versions("5.0-beta", "5.0").unwrap_err();
        assert_eq!(
            err,
            VersionError::MalformedVersion {
                version: "5.0-beta".to_string(),
                component: "0-beta".to_string(),
            }
        );
        assert_eq!(compare_versions("", "1.0").unwrap_err(), VersionError::Empty);
        assert!(is_less_than("1..2", "1.3").is_err());
    }

    #[test]
    fn test_extract_version_from_noisy_output() {
        assert_eq!(
            extract_version("zsh 4.3.11 (x86_64-unknown-linux-gnu)").as_deref(),
            Some("4.3.11")
        );
        assert_eq!(extract_version("git version 2.34.1\n").as_deref(), Some("2.34.1"));
        assert_eq!(extract_version("tmux 3.2a").as_deref(), Some("3.2"));
        assert_eq!(extract_version("usage: ag [options]"), None);
    }

    #[test]
    fn test_display_round_trips_components() {
        let v: ToolVersion = " 1.2.3 ".parse().unwrap();
        assert_eq!(v.to_string(), "1.2.3");
        assert_eq!(v.components, vec![1, 2, 3]);
    }
}
