// Text blocklist management.
//
// Blocklists are named lists of exact-match terms that flag text no matter
// what the classifier thinks. None of these calls has a fallback: a failure
// to create or edit a list is always reported to the caller.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};
use url::Url;

use super::azure::{to_body, ContentSafetyClient};
use super::wire::Page;
use crate::error::{ContentSafetyError, Result};

/// Longest blocklist name the API accepts.
pub const MAX_BLOCKLIST_NAME_LEN: usize = 64;
/// Longest text of a single blocklist item.
pub const MAX_ITEM_TEXT_LEN: usize = 128;
/// Most items accepted by one add/update call.
pub const MAX_ITEMS_PER_REQUEST: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blocklist {
    pub blocklist_name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlocklistItem {
    pub blocklist_item_id: String,
    pub text: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_regex: bool,
}

/// An item to add; the API assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBlocklistItem {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_regex: bool,
}

impl NewBlocklistItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            description: None,
            is_regex: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn regex(mut self) -> Self {
        self.is_regex = true;
        self
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddItemsRequest<'a> {
    blocklist_items: &'a [NewBlocklistItem],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RemoveItemsRequest<'a> {
    blocklist_item_ids: &'a [String],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddItemsResponse {
    #[serde(default)]
    blocklist_items: Vec<BlocklistItem>,
}

impl ContentSafetyClient {
    /// Create a blocklist, or update its description if it exists.
    pub async fn create_or_update_blocklist(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Blocklist> {
        validate_name(name)?;

        let body = match description {
            Some(description) => json!({ "description": description }),
            None => json!({}),
        };
        let blocklist: Blocklist = self
            .call(Method::PATCH, &blocklist_path(name), Some(&body))
            .await?
            .json()?;

        info!(blocklist = name, "Blocklist created or updated");
        Ok(blocklist)
    }

    pub async fn get_blocklist(&self, name: &str) -> Result<Blocklist> {
        validate_name(name)?;
        self.call(Method::GET, &blocklist_path(name), None)
            .await?
            .json()
    }

    /// List every blocklist on the resource, following pagination.
    pub async fn list_blocklists(&self) -> Result<Vec<Blocklist>> {
        self.list_all("/text/blocklists").await
    }

    pub async fn delete_blocklist(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        self.call(Method::DELETE, &blocklist_path(name), None)
            .await?;
        info!(blocklist = name, "Blocklist deleted");
        Ok(())
    }

    /// Add items to a blocklist (or update items with the same text).
    pub async fn add_or_update_blocklist_items(
        &self,
        name: &str,
        items: &[NewBlocklistItem],
    ) -> Result<Vec<BlocklistItem>> {
        validate_name(name)?;
        validate_items(items)?;

        let body = to_body(&AddItemsRequest {
            blocklist_items: items,
        })?;
        let response: AddItemsResponse = self
            .call(
                Method::POST,
                &format!("{}:addOrUpdateBlocklistItems", blocklist_path(name)),
                Some(&body),
            )
            .await?
            .json()?;

        info!(
            blocklist = name,
            items = response.blocklist_items.len(),
            "Blocklist items added or updated"
        );
        Ok(response.blocklist_items)
    }

    pub async fn remove_blocklist_items(&self, name: &str, item_ids: &[String]) -> Result<()> {
        validate_name(name)?;
        if item_ids.is_empty() {
            return Err(ContentSafetyError::invalid(
                "at least one blocklist item id is required",
            ));
        }
        if item_ids.iter().any(|id| id.is_empty()) {
            return Err(ContentSafetyError::invalid(
                "blocklist item ids must not be empty",
            ));
        }

        let body = to_body(&RemoveItemsRequest {
            blocklist_item_ids: item_ids,
        })?;
        self.call(
            Method::POST,
            &format!("{}:removeBlocklistItems", blocklist_path(name)),
            Some(&body),
        )
        .await?;

        info!(blocklist = name, items = item_ids.len(), "Blocklist items removed");
        Ok(())
    }

    pub async fn list_blocklist_items(&self, name: &str) -> Result<Vec<BlocklistItem>> {
        validate_name(name)?;
        self.list_all(&format!("{}/blocklistItems", blocklist_path(name)))
            .await
    }

    pub async fn get_blocklist_item(&self, name: &str, item_id: &str) -> Result<BlocklistItem> {
        validate_name(name)?;
        if item_id.is_empty() || item_id.contains('/') {
            return Err(ContentSafetyError::invalid(format!(
                "invalid blocklist item id {item_id:?}"
            )));
        }
        self.call(
            Method::GET,
            &format!("{}/blocklistItems/{}", blocklist_path(name), item_id),
            None,
        )
        .await?
        .json()
    }

    async fn list_all<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let mut page: Page<T> = self.call(Method::GET, path, None).await?.json()?;
        let mut results = std::mem::take(&mut page.value);

        while let Some(next) = page.next_link.take() {
            let url = resolve_next_link(&self.config().endpoint, &next)?;
            page = self.send(Method::GET, &url, None).await?.json()?;
            results.append(&mut page.value);
        }

        debug!(path = path, count = results.len(), "Listed resources");
        Ok(results)
    }
}

/// Turn a `nextLink` into the URL to fetch.
///
/// Relative links sit under the endpoint's path (`/contentsafety` included)
/// unless they already start with it. Absolute links must keep the
/// endpoint's origin, since the subscription key is sent with them.
fn resolve_next_link(endpoint: &str, next: &str) -> Result<String> {
    let base = Url::parse(endpoint)
        .map_err(|e| ContentSafetyError::Config(format!("invalid endpoint {endpoint:?}: {e}")))?;

    match Url::parse(next) {
        Ok(absolute) if absolute.origin() == base.origin() => Ok(absolute.into()),
        Ok(_) => Err(ContentSafetyError::Decode(format!(
            "nextLink {next:?} leaves the configured endpoint"
        ))),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let prefix = base.path().trim_end_matches('/');
            let rooted = !prefix.is_empty()
                && next
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with(['/', '?']));
            if rooted {
                let url = base.join(next).map_err(|e| {
                    ContentSafetyError::Decode(format!("invalid nextLink {next:?}: {e}"))
                })?;
                Ok(url.into())
            } else {
                Ok(format!(
                    "{}/{}",
                    endpoint.trim_end_matches('/'),
                    next.trim_start_matches('/')
                ))
            }
        }
        Err(e) => Err(ContentSafetyError::Decode(format!(
            "invalid nextLink {next:?}: {e}"
        ))),
    }
}

fn blocklist_path(name: &str) -> String {
    format!("/text/blocklists/{name}")
}

/// Names go straight into the URL path, so only the characters the API
/// allows are accepted.
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ContentSafetyError::invalid("blocklist name must not be empty"));
    }
    if name.len() > MAX_BLOCKLIST_NAME_LEN {
        return Err(ContentSafetyError::invalid(format!(
            "blocklist name is longer than {MAX_BLOCKLIST_NAME_LEN} characters"
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' || c == '~')
    {
        return Err(ContentSafetyError::invalid(format!(
            "blocklist name {name:?} may only contain letters, digits, '-', '_', '.' and '~'"
        )));
    }
    Ok(())
}

fn validate_items(items: &[NewBlocklistItem]) -> Result<()> {
    if items.is_empty() {
        return Err(ContentSafetyError::invalid(
            "at least one blocklist item is required",
        ));
    }
    if items.len() > MAX_ITEMS_PER_REQUEST {
        return Err(ContentSafetyError::invalid(format!(
            "at most {MAX_ITEMS_PER_REQUEST} blocklist items per request, got {}",
            items.len()
        )));
    }
    for item in items {
        if item.text.is_empty() {
            return Err(ContentSafetyError::invalid("blocklist item text must not be empty"));
        }
        if item.text.chars().count() > MAX_ITEM_TEXT_LEN {
            return Err(ContentSafetyError::invalid(format!(
                "blocklist item text is longer than {MAX_ITEM_TEXT_LEN} characters"
            )));
        }
    }
    Ok(())
}
