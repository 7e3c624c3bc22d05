// Azure Content Safety request/response bodies.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::moderation::category::{Category, CategoryScore};
use crate::moderation::request::ImageEncoding;
use crate::moderation::verdict::BlocklistMatch;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TextAnalyzeRequest<'a> {
    pub text: &'a str,
    pub categories: Vec<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocklist_names: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub halt_on_blocklist_hit: Option<bool>,
}

/// `{"url": ...}` or `{"content": ...}` depending on encoding.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ImageSource<'a> {
    Url(&'a str),
    Content(&'a str),
}

impl<'a> ImageSource<'a> {
    pub fn new(image: &'a str, encoding: ImageEncoding) -> Self {
        match encoding {
            ImageEncoding::Url => ImageSource::Url(image),
            ImageEncoding::Base64 => ImageSource::Content(image),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ImageAnalyzeRequest<'a> {
    pub image: ImageSource<'a>,
    pub categories: Vec<Category>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MultimodalAnalyzeRequest<'a> {
    pub image: ImageSource<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'a str>,
    pub enable_ocr: bool,
    pub categories: Vec<Category>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProtectedMaterialRequest<'a> {
    pub text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnalyzeResponse {
    #[serde(default)]
    pub categories_analysis: Vec<CategoryAnalysis>,
    #[serde(default)]
    pub blocklists_match: Option<Vec<BlocklistMatch>>,
    #[serde(default)]
    pub tracking_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoryAnalysis {
    pub category: String,
    #[serde(default)]
    pub severity: Option<u8>,
}

impl AnalyzeResponse {
    /// Scores in response order. Categories this crate doesn't know are
    /// skipped; a missing severity reads as 0.
    pub fn category_scores(&self) -> Vec<CategoryScore> {
        self.categories_analysis
            .iter()
            .filter_map(|analysis| match analysis.category.parse::<Category>() {
                Ok(category) => Some(CategoryScore::new(
                    category,
                    analysis.severity.unwrap_or(0),
                )),
                Err(_) => {
                    debug!(category = %analysis.category, "Skipping unknown category");
                    None
                }
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProtectedMaterialResponse {
    pub protected_material_analysis: Map<String, Value>,
}

/// One page of a list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Page<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(default)]
    pub next_link: Option<String>,
}
