// Turning analysis results into verdicts.
//
// These are the pure halves of the moderation calls: the client fetches
// scores, then hands them here. The fallbacks are asymmetric on purpose.
// Text still has its rating to go on when the remote is down; images have
// nothing and are approved.

use super::category::CategoryScore;
use super::severity::analyze;
use super::verdict::{Verdict, REASON_BLOCKLIST_MATCH, REASON_LOW_RATING};
use crate::config::ContentSafetyConfig;

/// The two numbers a decision depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub low_rating: f64,
    pub high_severity: u8,
}

impl From<&ContentSafetyConfig> for Thresholds {
    fn from(config: &ContentSafetyConfig) -> Self {
        Self {
            low_rating: config.low_rating_threshold,
            high_severity: config.high_severity_threshold,
        }
    }
}

/// Approve text only if no category is high-risk, no blocklist matched
/// and the rating meets the minimum.
///
/// The reason lists offending categories, then `blocklist_match`. When
/// only the rating is at fault the reason is `low_rating`.
pub fn decide_text(
    scores: &[CategoryScore],
    blocklist_hit: bool,
    rating: f64,
    thresholds: &Thresholds,
) -> Verdict {
    let analysis = analyze(scores, thresholds.high_severity);

    let mut reasons = vec![analysis.reason.as_str()];
    if blocklist_hit {
        reasons.push(REASON_BLOCKLIST_MATCH);
    }

    let verdict = Verdict::from_reasons(&reasons);
    if verdict.is_approved() && rating < thresholds.low_rating {
        return Verdict::flagged(REASON_LOW_RATING);
    }
    verdict
}

/// Approve an image (or image with text) unless a category is high-risk.
pub fn decide_image(scores: &[CategoryScore], thresholds: &Thresholds) -> Verdict {
    let analysis = analyze(scores, thresholds.high_severity);
    Verdict::from_reasons(&[analysis.reason.as_str()])
}

/// Text verdict when the remote could not be consulted.
pub fn text_fallback(rating: f64, thresholds: &Thresholds) -> Verdict {
    let verdict = if rating >= thresholds.low_rating {
        Verdict::approved()
    } else {
        Verdict::flagged(REASON_LOW_RATING)
    };
    verdict.into_degraded()
}

/// Image verdict when the remote could not be consulted.
pub fn image_fallback() -> Verdict {
    Verdict::approved().into_degraded()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moderation::category::Category;

    const THRESHOLDS: Thresholds = Thresholds {
        low_rating: 2.0,
        high_severity: 4,
    };

    fn zeros() -> Vec<CategoryScore> {
        Category::ALL
            .iter()
            .map(|&c| CategoryScore::new(c, 0))
            .collect()
    }

    fn with_severity(category: Category, severity: u8) -> Vec<CategoryScore> {
        zeros()
            .into_iter()
            .map(|s| {
                if s.category == category {
                    CategoryScore::new(category, severity)
                } else {
                    s
                }
            })
            .collect()
    }

    #[test]
    fn clean_text_with_good_rating_is_approved() {
        let v = decide_text(&zeros(), false, 4.5, &THRESHOLDS);
        assert!(v.is_approved());
        assert_eq!(v.reason(), None);
    }

    #[test]
    fn rating_exactly_at_threshold_is_approved() {
        assert!(decide_text(&zeros(), false, 2.0, &THRESHOLDS).is_approved());
    }

    #[test]
    fn low_rating_alone_flags() {
        let v = decide_text(&zeros(), false, 1.5, &THRESHOLDS);
        assert!(v.is_flagged());
        assert_eq!(v.reason(), Some("low_rating"));
    }

    #[test]
    fn category_reason_wins_over_low_rating() {
        let v = decide_text(&with_severity(Category::Hate, 6), false, 1.0, &THRESHOLDS);
        assert_eq!(v.reason(), Some("Hate"));
    }

    #[test]
    fn blocklist_match_alone_flags() {
        let v = decide_text(&zeros(), true, 5.0, &THRESHOLDS);
        assert_eq!(v.reason(), Some("blocklist_match"));
    }

    #[test]
    fn blocklist_is_appended_after_categories() {
        let v = decide_text(&with_severity(Category::Violence, 4), true, 5.0, &THRESHOLDS);
        assert_eq!(v.reason(), Some("Violence, blocklist_match"));
    }

    #[test]
    fn image_flags_only_on_severity() {
        assert!(decide_image(&zeros(), &THRESHOLDS).is_approved());
        assert!(decide_image(&[], &THRESHOLDS).is_approved());

        let v = decide_image(&with_severity(Category::Sexual, 4), &THRESHOLDS);
        assert_eq!(v.reason(), Some("Sexual"));
    }

    #[test]
    fn text_fallback_uses_rating_and_is_degraded() {
        let ok = text_fallback(3.0, &THRESHOLDS);
        assert!(ok.is_approved() && ok.degraded);
        assert!(ok.category_scores.is_empty());

        let low = text_fallback(1.0, &THRESHOLDS);
        assert_eq!(low.reason(), Some("low_rating"));
        assert!(low.degraded);
    }

    #[test]
    fn image_fallback_always_approves() {
        let v = image_fallback();
        assert!(v.is_approved());
        assert!(v.degraded);
    }

    #[test]
    fn thresholds_follow_config() {
        let config = ContentSafetyConfig::new("https://example.test", "key")
            .with_low_rating_threshold(3.5)
            .with_high_severity_threshold(2);
        assert_eq!(
            Thresholds::from(&config),
            Thresholds {
                low_rating: 3.5,
                high_severity: 2
            }
        );
    }
}
