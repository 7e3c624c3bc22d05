// Moderation requests and their preconditions.
//
// Validation happens here, before anything touches the network, so a bad
// request fails the same way whether or not the remote is reachable.

use std::fmt;
use std::str::FromStr;

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::category::Category;
use crate::config::MAX_RATING;
use crate::error::{ContentSafetyError, Result};

/// Largest base64 payload accepted for an image (4 MB of encoded text,
/// about 3 MB of original bytes).
pub const MAX_BASE64_IMAGE_LEN: usize = 4_194_304;

/// How an image is handed to the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageEncoding {
    #[default]
    Url,
    Base64,
}

impl ImageEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageEncoding::Url => "url",
            ImageEncoding::Base64 => "base64",
        }
    }
}

impl fmt::Display for ImageEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ImageEncoding {
    type Err = ContentSafetyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "url" => Ok(ImageEncoding::Url),
            "base64" => Ok(ImageEncoding::Base64),
            other => Err(ContentSafetyError::invalid(format!(
                "image encoding must be \"url\" or \"base64\", got {other:?}"
            ))),
        }
    }
}

/// A piece of user text plus the rating that came with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextModeration {
    pub text: String,
    /// User-supplied rating, 0 to 5.
    pub rating: f64,
    #[serde(default)]
    pub categories: Option<Vec<Category>>,
    #[serde(default)]
    pub blocklist_names: Option<Vec<String>>,
    #[serde(default)]
    pub halt_on_blocklist_hit: bool,
}

impl TextModeration {
    pub fn new(text: impl Into<String>, rating: f64) -> Self {
        Self {
            text: text.into(),
            rating,
            categories: None,
            blocklist_names: None,
            halt_on_blocklist_hit: false,
        }
    }

    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = Some(categories);
        self
    }

    pub fn with_blocklists(mut self, names: Vec<String>, halt_on_hit: bool) -> Self {
        self.blocklist_names = Some(names);
        self.halt_on_blocklist_hit = halt_on_hit;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.text.is_empty() {
            return Err(ContentSafetyError::invalid("text must not be empty"));
        }
        if !self.rating.is_finite() || !(0.0..=MAX_RATING).contains(&self.rating) {
            return Err(ContentSafetyError::invalid(format!(
                "rating must be between 0 and {MAX_RATING}, got {}",
                self.rating
            )));
        }
        Ok(())
    }

    /// Blocklists to send, if any were named.
    pub(crate) fn active_blocklists(&self) -> Option<&[String]> {
        self.blocklist_names
            .as_deref()
            .filter(|names| !names.is_empty())
    }
}

/// An image given either by URL or as base64 content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageModeration {
    pub image: String,
    #[serde(default)]
    pub encoding: ImageEncoding,
    #[serde(default)]
    pub categories: Option<Vec<Category>>,
}

impl ImageModeration {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            image: url.into(),
            encoding: ImageEncoding::Url,
            categories: None,
        }
    }

    pub fn base64(content: impl Into<String>) -> Self {
        Self {
            image: content.into(),
            encoding: ImageEncoding::Base64,
            categories: None,
        }
    }

    /// Encode raw image bytes for upload.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::base64(base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = Some(categories);
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_image(&self.image, self.encoding)
    }
}

/// An image analyzed together with accompanying text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultimodalModeration {
    pub image: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub encoding: ImageEncoding,
    #[serde(default)]
    pub categories: Option<Vec<Category>>,
    #[serde(default = "default_enable_ocr")]
    pub enable_ocr: bool,
}

fn default_enable_ocr() -> bool {
    true
}

impl MultimodalModeration {
    pub fn new(image: impl Into<String>, encoding: ImageEncoding) -> Self {
        Self {
            image: image.into(),
            text: None,
            encoding,
            categories: None,
            enable_ocr: true,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = Some(categories);
        self
    }

    pub fn with_ocr(mut self, enable_ocr: bool) -> Self {
        self.enable_ocr = enable_ocr;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_image(&self.image, self.encoding)
    }
}

fn validate_image(image: &str, encoding: ImageEncoding) -> Result<()> {
    if image.is_empty() {
        return Err(ContentSafetyError::invalid("image must not be empty"));
    }
    match encoding {
        ImageEncoding::Url => {
            url::Url::parse(image).map_err(|e| {
                ContentSafetyError::invalid(format!("image URL is malformed: {e}"))
            })?;
        }
        ImageEncoding::Base64 => {
            if image.len() > MAX_BASE64_IMAGE_LEN {
                return Err(ContentSafetyError::invalid(format!(
                    "base64 image is {} bytes, limit is {MAX_BASE64_IMAGE_LEN}",
                    image.len()
                )));
            }
        }
    }
    Ok(())
}
