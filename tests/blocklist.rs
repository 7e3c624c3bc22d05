// Blocklist management calls. Unlike moderation, failures here propagate.

mod common;

use common::{client, request_count, API_KEY, API_VERSION};
use content_safety::client::NewBlocklistItem;
use content_safety::{ContentSafetyClient, ContentSafetyConfig, ContentSafetyError};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn create_or_update_patches_the_named_list() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/text/blocklists/brands"))
        .and(query_param("api-version", API_VERSION))
        .and(header("Ocp-Apim-Subscription-Key", API_KEY))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({"description": "competitor names"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "blocklistName": "brands",
            "description": "competitor names"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let blocklist = client(&server)
        .create_or_update_blocklist("brands", Some("competitor names"))
        .await
        .unwrap();
    assert_eq!(blocklist.blocklist_name, "brands");
    assert_eq!(blocklist.description.as_deref(), Some("competitor names"));
}

#[tokio::test]
async fn get_blocklist_reads_one_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/text/blocklists/brands"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"blocklistName": "brands"})),
        )
        .mount(&server)
        .await;

    let blocklist = client(&server).get_blocklist("brands").await.unwrap();
    assert_eq!(blocklist.blocklist_name, "brands");
    assert!(blocklist.description.is_none());
}

#[tokio::test]
async fn list_blocklists_follows_next_link() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/text/blocklists"))
        .and(query_param("skip", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"blocklistName": "second"}]
        })))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/text/blocklists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"blocklistName": "first"}],
            "nextLink": "/text/blocklists?api-version=2024-09-01&skip=1"
        })))
        .with_priority(2)
        .mount(&server)
        .await;

    let lists = client(&server).list_blocklists().await.unwrap();
    let names: Vec<&str> = lists.iter().map(|b| b.blocklist_name.as_str()).collect();
    assert_eq!(names, vec!["first", "second"]);
    assert_eq!(request_count(&server).await, 2);
}

#[tokio::test]
async fn relative_next_link_keeps_the_endpoint_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/contentsafety/text/blocklists"))
        .and(query_param("skip", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"blocklistName": "second"}]
        })))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/contentsafety/text/blocklists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"blocklistName": "first"}],
            "nextLink": "/text/blocklists?api-version=2024-09-01&skip=1"
        })))
        .with_priority(2)
        .mount(&server)
        .await;

    let config = ContentSafetyConfig::new(format!("{}/contentsafety", server.uri()), API_KEY);
    let client = ContentSafetyClient::new(config).unwrap();

    let lists = client.list_blocklists().await.unwrap();
    let names: Vec<&str> = lists.iter().map(|b| b.blocklist_name.as_str()).collect();
    assert_eq!(names, vec!["first", "second"]);
}

#[tokio::test]
async fn next_link_to_another_host_is_not_followed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/text/blocklists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"blocklistName": "first"}],
            "nextLink": "https://elsewhere.example/text/blocklists?skip=1"
        })))
        .mount(&server)
        .await;

    let err = client(&server).list_blocklists().await.unwrap_err();
    assert!(matches!(err, ContentSafetyError::Decode(_)));
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn delete_blocklist_accepts_no_content() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/text/blocklists/brands"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).delete_blocklist("brands").await.unwrap();
}

#[tokio::test]
async fn add_items_posts_and_returns_assigned_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/text/blocklists/brands:addOrUpdateBlocklistItems"))
        .and(body_json(json!({
            "blocklistItems": [
                {"text": "acme"},
                {"text": "globex", "description": "rival"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "blocklistItems": [
                {"blocklistItemId": "id-1", "text": "acme"},
                {"blocklistItemId": "id-2", "text": "globex", "description": "rival"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let items = client(&server)
        .add_or_update_blocklist_items(
            "brands",
            &[
                NewBlocklistItem::new("acme"),
                NewBlocklistItem::new("globex").with_description("rival"),
            ],
        )
        .await
        .unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].blocklist_item_id, "id-1");
    assert_eq!(items[1].description.as_deref(), Some("rival"));
    assert!(!items[1].is_regex);
}

#[tokio::test]
async fn remove_items_posts_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/text/blocklists/brands:removeBlocklistItems"))
        .and(body_json(json!({"blocklistItemIds": ["id-1", "id-2"]})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .remove_blocklist_items("brands", &["id-1".to_string(), "id-2".to_string()])
        .await
        .unwrap();
}

#[tokio::test]
async fn list_and_get_items() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/text/blocklists/brands/blocklistItems"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"blocklistItemId": "id-1", "text": "acme"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/text/blocklists/brands/blocklistItems/id-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "blocklistItemId": "id-1", "text": "acme", "isRegex": false
        })))
        .mount(&server)
        .await;
    let client = client(&server);

    let items = client.list_blocklist_items("brands").await.unwrap();
    assert_eq!(items.len(), 1);

    let item = client.get_blocklist_item("brands", "id-1").await.unwrap();
    assert_eq!(item.text, "acme");
}

#[tokio::test]
async fn management_errors_propagate() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/text/blocklists/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": "NotFound", "message": "Blocklist missing not found"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server).get_blocklist("missing").await.unwrap_err();
    assert!(matches!(err, ContentSafetyError::RemoteApi { status: 404, .. }));
}

#[tokio::test]
async fn invalid_arguments_never_reach_the_remote() {
    let server = MockServer::start().await;
    let client = client(&server);

    assert!(matches!(
        client.create_or_update_blocklist("", None).await,
        Err(ContentSafetyError::InvalidInput(_))
    ));
    assert!(matches!(
        client.delete_blocklist("../etc").await,
        Err(ContentSafetyError::InvalidInput(_))
    ));
    assert!(matches!(
        client.add_or_update_blocklist_items("brands", &[]).await,
        Err(ContentSafetyError::InvalidInput(_))
    ));
    assert!(matches!(
        client.remove_blocklist_items("brands", &[]).await,
        Err(ContentSafetyError::InvalidInput(_))
    ));
    assert_eq!(request_count(&server).await, 0);
}
