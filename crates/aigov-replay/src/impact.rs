//! # Impact Classification
//!
//! The ordered ladder that classifies how much a policy change moved a
//! decision. First matching rung wins; the ordering is part of the
//! contract, not an implementation detail.

use serde::{Deserialize, Serialize};

/// How severely a replayed decision diverged from the original.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactAssessment {
    /// Nothing moved: same outcome, negligible confidence shift, no
    /// structural changes.
    None,
    /// Residual bucket — something shifted but nothing decision-relevant.
    Low,
    /// Outcome changed without a confidence collapse, or a large confidence
    /// or structural shift without an outcome change.
    Medium,
    /// Outcome changed with a notable confidence drop.
    High,
    /// Outcome changed with a severe confidence drop.
    Critical,
}

impl ImpactAssessment {
    /// Return the wire string for this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for ImpactAssessment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify impact. Ordered ladder — first matching rung wins:
///
/// 1. unchanged outcome, `|Δ| < 0.1`, no structural changes → `none`
/// 2. changed outcome, `Δ < −0.3` → `critical`
/// 3. changed outcome, `Δ < −0.1` → `high`
/// 4. changed outcome (otherwise) → `medium`
/// 5. unchanged outcome, `|Δ| > 0.2` → `medium`
/// 6. unchanged outcome, more than 3 structural changes → `medium`
/// 7. otherwise → `low`
pub fn assess_impact(
    outcome_changed: bool,
    confidence_delta: f64,
    structural_changes: usize,
) -> ImpactAssessment {
    if !outcome_changed && confidence_delta.abs() < 0.1 && structural_changes == 0 {
        return ImpactAssessment::None;
    }

    if outcome_changed {
        if confidence_delta < -0.3 {
            return ImpactAssessment::Critical;
        }
        if confidence_delta < -0.1 {
            return ImpactAssessment::High;
        }
        return ImpactAssessment::Medium;
    }

    if confidence_delta.abs() > 0.2 {
        return ImpactAssessment::Medium;
    }
    if structural_changes > 3 {
        return ImpactAssessment::Medium;
    }

    ImpactAssessment::Low
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_and_quiet_is_none() {
        assert_eq!(assess_impact(false, 0.05, 0), ImpactAssessment::None);
        assert_eq!(assess_impact(false, -0.05, 0), ImpactAssessment::None);
    }

    #[test]
    fn changed_with_severe_confidence_drop_is_critical() {
        assert_eq!(assess_impact(true, -0.35, 0), ImpactAssessment::Critical);
    }

    #[test]
    fn changed_with_notable_drop_is_high() {
        assert_eq!(assess_impact(true, -0.2, 0), ImpactAssessment::High);
    }

    #[test]
    fn changed_otherwise_is_medium() {
        assert_eq!(assess_impact(true, 0.0, 0), ImpactAssessment::Medium);
        assert_eq!(assess_impact(true, 0.4, 0), ImpactAssessment::Medium);
        assert_eq!(assess_impact(true, -0.05, 0), ImpactAssessment::Medium);
    }

    #[test]
    fn unchanged_large_confidence_shift_is_medium() {
        assert_eq!(assess_impact(false, 0.25, 0), ImpactAssessment::Medium);
        assert_eq!(assess_impact(false, -0.25, 0), ImpactAssessment::Medium);
    }

    #[test]
    fn unchanged_many_structural_changes_is_medium() {
        assert_eq!(assess_impact(false, 0.0, 4), ImpactAssessment::Medium);
    }

    #[test]
    fn residual_cases_are_low() {
        // Quiet confidence but some structural change.
        assert_eq!(assess_impact(false, 0.05, 1), ImpactAssessment::Low);
        // Moderate confidence shift below the medium threshold.
        assert_eq!(assess_impact(false, 0.15, 0), ImpactAssessment::Low);
        assert_eq!(assess_impact(false, 0.0, 3), ImpactAssessment::Low);
    }

    #[test]
    fn ladder_boundaries_are_exact() {
        // |Δ| = 0.1 is not "< 0.1": falls out of `none`.
        assert_eq!(assess_impact(false, 0.1, 0), ImpactAssessment::Low);
        // Δ = −0.3 is not "< −0.3": high, not critical.
        assert_eq!(assess_impact(true, -0.3, 0), ImpactAssessment::High);
        // Δ = −0.1 is not "< −0.1": medium, not high.
        assert_eq!(assess_impact(true, -0.1, 0), ImpactAssessment::Medium);
        // |Δ| = 0.2 is not "> 0.2": low.
        assert_eq!(assess_impact(false, 0.2, 0), ImpactAssessment::Low);
    }

    #[test]
    fn wire_strings_are_lowercase() {
        assert_eq!(ImpactAssessment::Critical.to_string(), "critical");
        assert_eq!(
            serde_json::to_string(&ImpactAssessment::None).unwrap(),
            "\"none\""
        );
    }
}
