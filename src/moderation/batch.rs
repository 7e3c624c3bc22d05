// Batch and context aggregation.
//
// A batch never fails as a whole: an item that errors is let through with
// a `batch_error` reason so one bad entry can't block the rest. Context
// moderation folds a text verdict and an optional image verdict into one.

use std::future::Future;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::request::{ImageModeration, TextModeration};
use super::traits::ContentModerator;
use super::verdict::{Verdict, REASON_BATCH_ERROR};
use crate::error::Result;

/// One entry of a mixed batch, tagged by `type` when read from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BatchItem {
    Text(TextModeration),
    Image(ImageModeration),
}

/// Per-part and combined results of moderating text with its image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextVerdict {
    pub text: Verdict,
    pub image: Option<Verdict>,
    pub combined: Verdict,
}

/// Moderate every item with at most `concurrency` in flight.
///
/// Output order and length always match `items`.
pub async fn moderate_batch<M>(
    moderator: &M,
    items: &[BatchItem],
    concurrency: usize,
) -> Vec<Verdict>
where
    M: ContentModerator + ?Sized,
{
    // Futures are built up front so the stream holds no borrowing closure
    let pending: Vec<_> = items
        .iter()
        .enumerate()
        .map(|(index, item)| moderate_item(moderator, index, item))
        .collect();

    run_ordered(pending, concurrency).await
}

/// Like [`moderate_batch`], for items still in their JSON form.
///
/// Each item is read on its own, so an entry with an unknown `type`, a bad
/// `encoding` or a missing field takes a `batch_error` slot instead of
/// rejecting the whole batch.
pub async fn moderate_json_batch<M>(
    moderator: &M,
    items: &[Value],
    concurrency: usize,
) -> Vec<Verdict>
where
    M: ContentModerator + ?Sized,
{
    let pending: Vec<_> = items
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let parsed = BatchItem::deserialize(raw);
            async move {
                match parsed {
                    Ok(item) => moderate_item(moderator, index, &item).await,
                    Err(e) => {
                        warn!(
                            index = index,
                            error = %e,
                            "Batch item unreadable, letting it through"
                        );
                        Verdict::failed_open(REASON_BATCH_ERROR)
                    }
                }
            }
        })
        .collect();

    run_ordered(pending, concurrency).await
}

async fn run_ordered<F>(pending: Vec<F>, concurrency: usize) -> Vec<Verdict>
where
    F: Future<Output = Verdict>,
{
    let verdicts: Vec<Verdict> = stream::iter(pending)
        .buffered(concurrency.max(1))
        .collect()
        .await;

    debug!(
        items = verdicts.len(),
        flagged = verdicts.iter().filter(|v| v.is_flagged()).count(),
        "Batch moderation complete"
    );

    verdicts
}

async fn moderate_item<M>(moderator: &M, index: usize, item: &BatchItem) -> Verdict
where
    M: ContentModerator + ?Sized,
{
    let result = match item {
        BatchItem::Text(request) => moderator.moderate_text(request).await,
        BatchItem::Image(request) => moderator.moderate_image(request).await,
    };

    result.unwrap_or_else(|e| {
        warn!(index = index, error = %e, "Batch item failed, letting it through");
        Verdict::failed_open(REASON_BATCH_ERROR)
    })
}

/// Moderate text, and the image at `image_url` if there is one, using the
/// same categories for both.
pub async fn moderate_with_context<M>(
    moderator: &M,
    text: &TextModeration,
    image_url: Option<&str>,
) -> Result<ContextVerdict>
where
    M: ContentModerator + ?Sized,
{
    let text_verdict = moderator.moderate_text(text).await?;

    let image_verdict = match image_url {
        Some(url) => {
            let mut request = ImageModeration::url(url);
            request.categories = text.categories.clone();
            Some(moderator.moderate_image(&request).await?)
        }
        None => None,
    };

    let combined = combine(&text_verdict, image_verdict.as_ref());

    Ok(ContextVerdict {
        text: text_verdict,
        image: image_verdict,
        combined,
    })
}

/// Flag if either part is flagged, labelling each part's reason.
pub fn combine(text: &Verdict, image: Option<&Verdict>) -> Verdict {
    let parts = [("Text", Some(text)), ("Image", image)];

    let reasons: Vec<String> = parts
        .iter()
        .filter_map(|(label, verdict)| {
            let verdict = (*verdict)?;
            if !verdict.is_flagged() {
                return None;
            }
            verdict.reason().map(|r| format!("{label}: {r}"))
        })
        .collect();

    let flagged = text.is_flagged() || image.is_some_and(Verdict::is_flagged);
    let mut combined = if flagged {
        Verdict::flagged(reasons.join(", "))
    } else {
        Verdict::approved()
    };
    combined.degraded = text.degraded || image.is_some_and(|v| v.degraded);
    combined
}
