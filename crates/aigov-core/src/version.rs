//! # Dotted Version Comparison
//!
//! Policy rules compare tool versions with the `semver_less_than` operator:
//! dotted numeric segments, compared left to right, missing segments
//! zero-padded (`"6" < "6.0.1"`, `"5.2" == "5.2.0"`).
//!
//! Malformed versions never raise: [`VersionString::parse`] returns `None`
//! and the comparison helpers treat an unparseable side as *not less than*,
//! which degrades the clause to a conservative `false` at the evaluation
//! layer.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A parsed dotted numeric version, e.g. `5.2.0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionString {
    segments: Vec<u64>,
}

impl VersionString {
    /// Parse a dotted numeric version string.
    ///
    /// Returns `None` if the string is empty or any segment is not a
    /// non-negative integer. Leading/trailing whitespace is tolerated; a
    /// leading `v` (as in `v6.0.0`) is stripped.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return None;
        }
        let segments = trimmed
            .split('.')
            .map(|s| s.parse::<u64>().ok())
            .collect::<Option<Vec<_>>>()?;
        Some(Self { segments })
    }

    /// Compare with another version, zero-padding the shorter one.
    pub fn compare(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        for i in 0..len {
            let a = self.segments.get(i).copied().unwrap_or(0);
            let b = other.segments.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

/// Whether `lhs` is a strictly lower version than `rhs`.
///
/// Either side failing to parse yields `false` (not-less-than) and a warning
/// — malformed version data must degrade, never abort an evaluation.
pub fn semver_less_than(lhs: &str, rhs: &str) -> bool {
    match (VersionString::parse(lhs), VersionString::parse(rhs)) {
        (Some(a), Some(b)) => a.compare(&b) == Ordering::Less,
        _ => {
            tracing::warn!(lhs, rhs, "malformed version in comparison — treating as not-less-than");
            false
        }
    }
}
