// Verdicts: the value returned by every moderation call.
//
// The outcome is a sum type so a flag can't exist without its reason.
// `FailedOpen` covers the one case where content is let through but the
// caller still needs to know why (a batch item that couldn't be processed).

use std::fmt;

use serde::{Deserialize, Serialize};

use super::category::CategoryScore;

/// Text rating was under the configured minimum.
pub const REASON_LOW_RATING: &str = "low_rating";
/// A host-managed blocklist term matched.
pub const REASON_BLOCKLIST_MATCH: &str = "blocklist_match";
/// The batch item could not be moderated and was let through.
pub const REASON_BATCH_ERROR: &str = "batch_error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModerationStatus {
    Approved,
    Flagged,
}

impl ModerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationStatus::Approved => "approved",
            ModerationStatus::Flagged => "flagged",
        }
    }
}

impl fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Approved,
    Flagged { reason: String },
    FailedOpen { reason: String },
}

/// One blocklist hit reported for a text analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlocklistMatch {
    pub blocklist_name: String,
    pub blocklist_item_id: String,
    pub blocklist_item_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    #[serde(flatten)]
    pub outcome: Outcome,
    /// Remote correlation id, for audit trails.
    pub tracking_id: Option<String>,
    /// Scores in the order the remote returned them. Empty when the
    /// verdict was synthesized instead of computed.
    pub category_scores: Vec<CategoryScore>,
    /// Present only for text analyses that asked for blocklists.
    pub blocklist_matches: Option<Vec<BlocklistMatch>>,
    /// Set when the remote call failed and this is a fallback decision.
    pub degraded: bool,
}

impl Verdict {
    fn with_outcome(outcome: Outcome) -> Self {
        Self {
            outcome,
            tracking_id: None,
            category_scores: Vec::new(),
            blocklist_matches: None,
            degraded: false,
        }
    }

    pub fn approved() -> Self {
        Self::with_outcome(Outcome::Approved)
    }

    pub fn flagged(reason: impl Into<String>) -> Self {
        Self::with_outcome(Outcome::Flagged {
            reason: reason.into(),
        })
    }

    pub fn failed_open(reason: impl Into<String>) -> Self {
        Self::with_outcome(Outcome::FailedOpen {
            reason: reason.into(),
        })
    }

    /// Approve when `reasons` is empty, otherwise flag with them joined.
    pub fn from_reasons(reasons: &[&str]) -> Self {
        let reasons: Vec<&str> = reasons.iter().copied().filter(|r| !r.is_empty()).collect();
        if reasons.is_empty() {
            Self::approved()
        } else {
            Self::flagged(reasons.join(", "))
        }
    }

    pub fn with_tracking_id(mut self, tracking_id: Option<String>) -> Self {
        self.tracking_id = tracking_id;
        self
    }

    pub fn with_scores(mut self, scores: Vec<CategoryScore>) -> Self {
        self.category_scores = scores;
        self
    }

    pub fn with_blocklist_matches(mut self, matches: Option<Vec<BlocklistMatch>>) -> Self {
        self.blocklist_matches = matches;
        self
    }

    pub fn into_degraded(mut self) -> Self {
        self.degraded = true;
        self
    }

    pub fn status(&self) -> ModerationStatus {
        match self.outcome {
            Outcome::Flagged { .. } => ModerationStatus::Flagged,
            Outcome::Approved | Outcome::FailedOpen { .. } => ModerationStatus::Approved,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Approved => None,
            Outcome::Flagged { reason } | Outcome::FailedOpen { reason } => Some(reason),
        }
    }

    pub fn is_flagged(&self) -> bool {
        self.status() == ModerationStatus::Flagged
    }

    pub fn is_approved(&self) -> bool {
        self.status() == ModerationStatus::Approved
    }
}
