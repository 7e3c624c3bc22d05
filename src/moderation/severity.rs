// Severity analysis: which categories crossed the configured threshold.

use super::category::CategoryScore;

/// Outcome of comparing a set of category scores to a threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityAnalysis {
    pub has_high_risk: bool,
    /// Names of the offending categories in the order they were scored,
    /// joined by ", ". Empty when nothing crossed the threshold.
    pub reason: String,
}

/// Flag every category whose severity is at or above `threshold`.
///
/// The boundary is inclusive: a severity equal to the threshold counts.
pub fn analyze(scores: &[CategoryScore], threshold: u8) -> SeverityAnalysis {
    let offending: Vec<&str> = scores
        .iter()
        .filter(|s| s.severity >= threshold)
        .map(|s| s.category.as_str())
        .collect();

    SeverityAnalysis {
        has_high_risk: !offending.is_empty(),
        reason: offending.join(", "),
    }
}
