//! Dotted-triplet version parsing and comparison.
//!
//! Release tags arrive as loosely formatted strings (`"1.8.0"`, `"v1.8"`,
//! `"2"`). Parsing is total: missing or non-numeric components coerce to 0
//! so a malformed tag compares as an old version instead of aborting the
//! update check.

use std::fmt;

/// A `(major, minor, patch)` version parsed from a dot-separated string.
///
/// Ordering is lexicographic on the three components, so `derive(Ord)` gives
/// exactly the comparison the update gate needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct VersionTriple {
    /// Major component.
    pub major: u64,
    /// Minor component.
    pub minor: u64,
    /// Patch component.
    pub patch: u64,
}

impl VersionTriple {
    /// Creates a version triple from explicit components.
    #[must_use]
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parses a dotted version string.
    ///
    /// A leading `v` (as found in release tags) is stripped. Each of the
    /// first three dot-separated components parses as `u64`; anything
    /// missing or non-numeric coerces to 0. Components beyond the third are
    /// ignored. Never fails.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        let trimmed = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);

        let mut components = trimmed
            .split('.')
            .map(|component| component.trim().parse::<u64>().unwrap_or(0));

        Self {
            major: components.next().unwrap_or(0),
            minor: components.next().unwrap_or(0),
            patch: components.next().unwrap_or(0),
        }
    }
}

impl fmt::Display for VersionTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Returns true when `candidate` is a strictly newer version than `baseline`.
///
/// Component-wise comparison with short-circuit: the first unequal component
/// decides; all-equal is not newer.
#[must_use]
pub fn is_newer(candidate: &str, baseline: &str) -> bool {
    VersionTriple::parse(candidate) > VersionTriple::parse(baseline)
}
