// Content moderator trait, the seam between decision logic and the backend.
//
// `ContentSafetyClient` implements it against Azure. Batch and context
// aggregation are provided methods, so anything that can moderate a single
// text and a single image gets them for free.

use async_trait::async_trait;
use serde_json::Value;

use super::batch::{self, BatchItem, ContextVerdict};
use super::request::{ImageModeration, TextModeration};
use super::verdict::Verdict;
use crate::error::Result;

#[async_trait]
pub trait ContentModerator: Send + Sync {
    /// Moderate one piece of text. Fails only on invalid input; remote
    /// failures come back as a degraded verdict.
    async fn moderate_text(&self, request: &TextModeration) -> Result<Verdict>;

    /// Moderate one image. Fails only on invalid input.
    async fn moderate_image(&self, request: &ImageModeration) -> Result<Verdict>;

    /// Moderate every item, returning verdicts in the same order.
    /// Default implementation runs items one at a time; implementations
    /// can override to run several concurrently.
    async fn moderate_batch(&self, items: &[BatchItem]) -> Vec<Verdict> {
        batch::moderate_batch(self, items, 1).await
    }

    /// Same as `moderate_batch` for items given as JSON objects. Items
    /// that don't parse get a `batch_error` verdict in their slot.
    async fn moderate_json_batch(&self, items: &[Value]) -> Vec<Verdict> {
        batch::moderate_json_batch(self, items, 1).await
    }

    /// Moderate text together with an optional image URL and combine the
    /// two verdicts.
    async fn moderate_with_context(
        &self,
        text: &TextModeration,
        image_url: Option<&str>,
    ) -> Result<ContextVerdict> {
        batch::moderate_with_context(self, text, image_url).await
    }
}
