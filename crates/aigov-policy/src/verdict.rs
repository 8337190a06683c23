//! # Verdicts
//!
//! The outcome of evaluating one [`crate::ToolUsageEvent`] against a rule
//! set. The status enum is closed: there is no fourth state, and the
//! fallback path (no matching rule) always produces
//! [`VerdictStatus::RequiresReview`].

use serde::{Deserialize, Serialize};

/// Terminal classification of a tool-usage event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerdictStatus {
    /// The usage is permitted under the matched rule.
    Approved,
    /// The usage is forbidden under the matched rule.
    Prohibited,
    /// The usage needs a human decision. Also the fail-closed fallback.
    RequiresReview,
}

impl VerdictStatus {
    /// Return the wire string for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "Approved",
            Self::Prohibited => "Prohibited",
            Self::RequiresReview => "RequiresReview",
        }
    }
}

impl std::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The result of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Terminal classification.
    pub status: VerdictStatus,
    /// Human-readable reason, taken from the matched rule's decision or the
    /// fallback text.
    pub reason: String,
    /// The rule that decided. `None` means the fallback path was taken.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    /// The snapshot the rules came from, when evaluation ran against a
    /// stored snapshot rather than an ad-hoc rule list.
    #[serde(rename = "policySnapshotId", skip_serializing_if = "Option::is_none")]
    pub policy_snapshot_id: Option<String>,
}

impl Verdict {
    /// The fail-closed fallback verdict: no rule matched.
    pub fn fallback() -> Self {
        Self {
            status: VerdictStatus::RequiresReview,
            reason: "No policy rule matched this event; manual review is required.".to_string(),
            rule_id: None,
            policy_snapshot_id: None,
        }
    }

    /// Whether this verdict came from the fallback path.
    pub fn is_fallback(&self) -> bool {
        self.rule_id.is_none()
    }
}
