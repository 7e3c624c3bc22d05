// Upload-safety policy on top of a moderator.
//
// Moderation calls degrade gracefully when the remote is down. An upload
// check may want the opposite: `fail_on_error` makes a fallback verdict
// count as a rejection instead of a pass.

use tracing::warn;

use super::request::{ImageModeration, TextModeration};
use super::traits::ContentModerator;
use super::verdict::Verdict;
use crate::config::{ContentSafetyConfig, MAX_RATING};
use crate::error::Result;

/// Reason given when content is rejected only because the remote was
/// unavailable.
pub const REASON_MODERATION_UNAVAILABLE: &str = "moderation_unavailable";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Pass,
    Reject { reason: String },
}

impl GuardDecision {
    pub fn is_pass(&self) -> bool {
        matches!(self, GuardDecision::Pass)
    }
}

pub struct ContentGuard<'a, M: ContentModerator + ?Sized> {
    moderator: &'a M,
    fail_on_error: bool,
}

impl<'a, M: ContentModerator + ?Sized> ContentGuard<'a, M> {
    pub fn new(moderator: &'a M, fail_on_error: bool) -> Self {
        Self {
            moderator,
            fail_on_error,
        }
    }

    pub fn from_config(moderator: &'a M, config: &ContentSafetyConfig) -> Self {
        Self::new(moderator, config.fail_on_error)
    }

    /// Check text content only. The rating is pinned to the maximum so
    /// a low rating can't reject an upload.
    pub async fn check_text(&self, text: &str) -> Result<GuardDecision> {
        let request = TextModeration::new(text, MAX_RATING);
        let verdict = self.moderator.moderate_text(&request).await?;
        Ok(self.decide(&verdict))
    }

    pub async fn check_image(&self, request: &ImageModeration) -> Result<GuardDecision> {
        let verdict = self.moderator.moderate_image(request).await?;
        Ok(self.decide(&verdict))
    }

    fn decide(&self, verdict: &Verdict) -> GuardDecision {
        if verdict.is_flagged() {
            return GuardDecision::Reject {
                reason: verdict.reason().unwrap_or_default().to_string(),
            };
        }
        if verdict.degraded && self.fail_on_error {
            warn!("Moderation unavailable and fail_on_error is set, rejecting upload");
            return GuardDecision::Reject {
                reason: REASON_MODERATION_UNAVAILABLE.to_string(),
            };
        }
        GuardDecision::Pass
    }
}
