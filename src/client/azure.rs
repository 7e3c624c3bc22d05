// Azure Content Safety implementation of the moderation calls.
//
// Each call validates its input, posts one analysis request through the
// retrying transport, and hands the scores to the decision functions.
// Remote failures never reach the caller of a moderation call: text falls
// back to its rating, images are approved. Protected-material detection
// has no sensible default, so its errors propagate.
//
// API docs: https://learn.microsoft.com/azure/ai-services/content-safety/

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::http::{HttpResponse, RetryingHttpClient};
use super::wire::{
    AnalyzeResponse, ImageAnalyzeRequest, ImageSource, MultimodalAnalyzeRequest,
    ProtectedMaterialRequest, ProtectedMaterialResponse, TextAnalyzeRequest,
};
use crate::config::ContentSafetyConfig;
use crate::error::{ContentSafetyError, Result};
use crate::moderation::batch::{self, BatchItem, ContextVerdict};
use crate::moderation::category::Category;
use crate::moderation::decision::{self, Thresholds};
use crate::moderation::request::{ImageModeration, MultimodalModeration, TextModeration};
use crate::moderation::traits::ContentModerator;
use crate::moderation::verdict::Verdict;

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Result of a protected-material check, passed through from the API.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtectedMaterial {
    pub detected: bool,
    /// The full `protectedMaterialAnalysis` object.
    pub details: Map<String, Value>,
}

/// Client for one Content Safety resource.
///
/// Holds only read-only configuration and a connection pool, so it can be
/// shared across tasks behind an `Arc`.
pub struct ContentSafetyClient {
    http: RetryingHttpClient,
    headers: HeaderMap,
    config: ContentSafetyConfig,
    thresholds: Thresholds,
}

impl ContentSafetyClient {
    /// Create a client for the resource described by `config`.
    ///
    /// Fails with `ContentSafetyError::Config` when a setting is out of
    /// range or the credentials are missing.
    pub fn new(config: ContentSafetyConfig) -> Result<Self> {
        config
            .validate()
            .and_then(|()| config.require_credentials())
            .map_err(|e| ContentSafetyError::Config(e.to_string()))?;

        let client = Client::builder()
            .user_agent(concat!("content-safety/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ContentSafetyError::Config(format!("failed to build HTTP client: {e}")))?;

        let mut key = HeaderValue::from_str(&config.api_key).map_err(|_| {
            ContentSafetyError::Config(
                "AZURE_CONTENT_SAFETY_KEY contains characters not allowed in a header".to_string(),
            )
        })?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(SUBSCRIPTION_KEY_HEADER, key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self {
            http: RetryingHttpClient::new(client, config.max_attempts, config.retry_delay),
            headers,
            thresholds: Thresholds::from(&config),
            config,
        })
    }

    pub fn config(&self) -> &ContentSafetyConfig {
        &self.config
    }

    pub(crate) fn url(&self, path: &str, api_version: &str) -> String {
        format!(
            "{}{}?api-version={}",
            self.config.endpoint, path, api_version
        )
    }

    /// Send a request to an absolute URL with the resource's headers.
    pub(crate) async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<HttpResponse> {
        self.http.send(method, url, &self.headers, body).await
    }

    /// Send a request to `path` on the stable API version.
    pub(crate) async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<HttpResponse> {
        let url = self.url(path, &self.config.api_version);
        self.send(method, &url, body).await
    }

    async fn post_json<B, T>(&self, path: &str, api_version: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = to_body(body)?;
        let url = self.url(path, api_version);
        self.send(Method::POST, &url, Some(&body)).await?.json()
    }

    /// Moderate text against categories, blocklists and its rating.
    pub async fn moderate_text(&self, request: &TextModeration) -> Result<Verdict> {
        request.validate()?;

        let blocklists = request.active_blocklists();
        let body = TextAnalyzeRequest {
            text: &request.text,
            categories: categories_or_default(request.categories.as_deref()),
            blocklist_names: blocklists,
            halt_on_blocklist_hit: blocklists.map(|_| request.halt_on_blocklist_hit),
        };

        let response = match self
            .post_json::<_, AnalyzeResponse>("/text:analyze", &self.config.api_version, &body)
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_remote_failure() => {
                warn!(error = %e, "Text analysis failed, falling back to rating");
                return Ok(decision::text_fallback(request.rating, &self.thresholds));
            }
            Err(e) => return Err(e),
        };

        let scores = response.category_scores();
        let matches = blocklists.map(|_| response.blocklists_match.unwrap_or_default());
        let blocklist_hit = matches.as_ref().is_some_and(|m| !m.is_empty());

        debug!(
            categories = scores.len(),
            blocklist_hit = blocklist_hit,
            tracking_id = ?response.tracking_id,
            text_preview = %preview(&request.text),
            "Analyzed text"
        );

        Ok(
            decision::decide_text(&scores, blocklist_hit, request.rating, &self.thresholds)
                .with_scores(scores)
                .with_blocklist_matches(matches)
                .with_tracking_id(response.tracking_id),
        )
    }

    /// Moderate an image by URL or base64 content.
    pub async fn moderate_image(&self, request: &ImageModeration) -> Result<Verdict> {
        request.validate()?;

        let body = ImageAnalyzeRequest {
            image: ImageSource::new(&request.image, request.encoding),
            categories: categories_or_default(request.categories.as_deref()),
        };

        match self
            .post_json::<_, AnalyzeResponse>("/image:analyze", &self.config.api_version, &body)
            .await
        {
            Ok(response) => Ok(self.image_verdict(response, "Analyzed image")),
            Err(e) if e.is_remote_failure() => {
                warn!(error = %e, encoding = %request.encoding, "Image analysis failed, approving");
                Ok(decision::image_fallback())
            }
            Err(e) => Err(e),
        }
    }

    /// Analyze an image together with its text (preview API).
    pub async fn analyze_multimodal(&self, request: &MultimodalModeration) -> Result<Verdict> {
        request.validate()?;

        let body = MultimodalAnalyzeRequest {
            image: ImageSource::new(&request.image, request.encoding),
            text: request.text.as_deref(),
            enable_ocr: request.enable_ocr,
            categories: categories_or_default(request.categories.as_deref()),
        };

        match self
            .post_json::<_, AnalyzeResponse>(
                "/imageWithText:analyze",
                &self.config.preview_api_version(),
                &body,
            )
            .await
        {
            Ok(response) => Ok(self.image_verdict(response, "Analyzed image with text")),
            Err(e) if e.is_remote_failure() => {
                warn!(error = %e, "Multimodal analysis failed, approving");
                Ok(decision::image_fallback())
            }
            Err(e) => Err(e),
        }
    }

    /// Ask whether text reproduces known protected material (lyrics,
    /// articles, recipes...). Remote errors propagate.
    pub async fn detect_protected_material(&self, text: &str) -> Result<ProtectedMaterial> {
        if text.is_empty() {
            return Err(ContentSafetyError::invalid("text must not be empty"));
        }

        let response: ProtectedMaterialResponse = self
            .post_json(
                "/text:detectProtectedMaterial",
                &self.config.api_version,
                &ProtectedMaterialRequest { text },
            )
            .await?;

        let details = response.protected_material_analysis;
        let detected = details
            .get("detected")
            .and_then(Value::as_bool)
            .ok_or_else(|| {
                ContentSafetyError::Decode(
                    "protectedMaterialAnalysis.detected missing or not a boolean".to_string(),
                )
            })?;

        Ok(ProtectedMaterial { detected, details })
    }

    /// Moderate a batch with up to `batch_concurrency` items in flight.
    pub async fn moderate_batch(&self, items: &[BatchItem]) -> Vec<Verdict> {
        batch::moderate_batch(self, items, self.config.batch_concurrency).await
    }

    /// Moderate a batch of JSON items with up to `batch_concurrency` in
    /// flight. Unreadable items get a `batch_error` verdict.
    pub async fn moderate_json_batch(&self, items: &[Value]) -> Vec<Verdict> {
        batch::moderate_json_batch(self, items, self.config.batch_concurrency).await
    }

    pub async fn moderate_with_context(
        &self,
        text: &TextModeration,
        image_url: Option<&str>,
    ) -> Result<ContextVerdict> {
        batch::moderate_with_context(self, text, image_url).await
    }

    fn image_verdict(&self, response: AnalyzeResponse, message: &'static str) -> Verdict {
        let scores = response.category_scores();
        debug!(
            categories = scores.len(),
            tracking_id = ?response.tracking_id,
            "{}",
            message
        );
        decision::decide_image(&scores, &self.thresholds)
            .with_scores(scores)
            .with_tracking_id(response.tracking_id)
    }
}

#[async_trait]
impl ContentModerator for ContentSafetyClient {
    async fn moderate_text(&self, request: &TextModeration) -> Result<Verdict> {
        ContentSafetyClient::moderate_text(self, request).await
    }

    async fn moderate_image(&self, request: &ImageModeration) -> Result<Verdict> {
        ContentSafetyClient::moderate_image(self, request).await
    }

    async fn moderate_batch(&self, items: &[BatchItem]) -> Vec<Verdict> {
        ContentSafetyClient::moderate_batch(self, items).await
    }

    async fn moderate_json_batch(&self, items: &[Value]) -> Vec<Verdict> {
        ContentSafetyClient::moderate_json_batch(self, items).await
    }
}

pub(crate) fn to_body<B: Serialize + ?Sized>(body: &B) -> Result<Value> {
    serde_json::to_value(body)
        .map_err(|e| ContentSafetyError::InvalidInput(format!("request could not be encoded: {e}")))
}

fn categories_or_default(categories: Option<&[Category]>) -> Vec<Category> {
    match categories {
        Some(categories) if !categories.is_empty() => categories.to_vec(),
        _ => Category::default_set(),
    }
}

/// First 50 characters, for log lines.
fn preview(text: &str) -> String {
    text.chars().take(50).collect()
}
