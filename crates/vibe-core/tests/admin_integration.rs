//! Integration tests for the admin API, raw requests and caller-side retries


use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use test_support::{client_with, direct_client, proxy_client, RecordingTransport};
use vibe_core::http::request::{HEADER_CLIENT_ID, HEADER_SIGNATURE};
use vibe_core::http::TransportError;
use vibe_core::{
    retry_with_backoff, ClientOptions, ErrorKind, Method, RequestOptions, RetryPolicy, StaticToken,
};

#[tokio::test]
async fn test_list_roles_accepts_bare_arrays() {
    let transport = RecordingTransport::new();
    transport.respond(200, r#"[{"id": "admin"}, {"id": "viewer"}]"#);
    let client = direct_client(transport.clone());

    let roles: Vec<Value> = client.admin().list_roles().await.unwrap();
    assert_eq!(roles, vec![json!({"id": "admin"}), json!({"id": "viewer"})]);
    assert_eq!(transport.last_request().url, "http://api.test/v1/admin/roles");
}

#[tokio::test]
async fn test_role_mutations() {
    let transport = RecordingTransport::new();
    transport
        .respond(201, r#"{"data": {"id": "editor"}}"#)
        .respond(200, r#"{"data": {"id": "editor", "permissions": ["write"]}}"#)
        .respond(204, "");
    let client = direct_client(transport.clone());
    let admin = client.admin();

    let created: Option<Value> = admin.create_role(&json!({"id": "editor"})).await.unwrap();
    assert_eq!(created, Some(json!({"id": "editor"})));
    let updated: Option<Value> = admin
        .update_role("editor", &json!({"permissions": ["write"]}))
        .await
        .unwrap();
    assert_eq!(updated.unwrap()["permissions"], json!(["write"]));
    admin.delete_role("editor").await.unwrap();

    let methods: Vec<Method> = transport.requests().into_iter().map(|r| r.method).collect();
    assert_eq!(methods, vec![Method::POST, Method::PATCH, Method::DELETE]);
    assert_eq!(transport.last_request().url, "http://api.test/v1/admin/roles/editor");
}

#[tokio::test]
async fn test_users_through_proxy() {
    let transport = RecordingTransport::new();
    transport
        .respond(200, r#"{"items": [{"id": "u1"}]}"#)
        .respond(404, "")
        .respond(204, "");
    let client = proxy_client(transport.clone());
    let admin = client.admin();

    let users: Vec<Value> = admin.list_users().await.unwrap();
    assert_eq!(users, vec![json!({"id": "u1"})]);

    let missing: Option<Value> = admin.get_user("ghost").await.unwrap();
    assert_eq!(missing, None);

    admin.remove_user("u1").await.unwrap();

    let requests = transport.requests();
    assert!(requests.iter().all(|r| r.method == Method::POST));
    assert!(requests.iter().all(|r| r.header(HEADER_SIGNATURE).is_some()));
    assert_eq!(
        requests[2].body,
        Some(json!({"endpoint": "/v1/admin/users/u1", "method": "DELETE", "data": null}))
    );
}

#[tokio::test]
async fn test_tenant_round_trip() {
    let transport = RecordingTransport::new();
    transport
        .respond(200, r#"{"data": {"name": "Acme"}}"#)
        .respond(200, r#"{"data": {"name": "Acme Inc"}}"#);
    let client = direct_client(transport.clone());

    let tenant: Value = client.admin().get_tenant().await.unwrap();
    assert_eq!(tenant, json!({"name": "Acme"}));

    let renamed: Option<Value> = client
        .admin()
        .update_tenant(&json!({"name": "Acme Inc"}))
        .await
        .unwrap();
    assert_eq!(renamed.unwrap()["name"], json!("Acme Inc"));
    assert_eq!(transport.last_request().method, Method::PATCH);
    assert_eq!(transport.last_request().url, "http://api.test/v1/admin/tenant");
}

#[tokio::test]
async fn test_tenant_update_without_body() {
    let transport = RecordingTransport::new();
    transport.respond(204, "");
    let client = direct_client(transport.clone());

    let tenant: Option<Value> = client
        .admin()
        .update_tenant(&json!({"name": "Acme Inc"}))
        .await
        .unwrap();
    assert_eq!(tenant, None);
}

#[tokio::test]
async fn test_unsigned_proxy_mode() {
    let transport = RecordingTransport::new();
    transport.respond(200, "{}");
    let client = client_with(
        ClientOptions::new()
            .idp_url("http://idp.test")
            .client_id("legacy")
            .token_supplier(StaticToken::new("tok")),
        transport.clone(),
    );
    assert!(!client.config().signing().is_signed());

    client.request("/v1/ping", RequestOptions::get()).await.unwrap();

    let request = transport.last_request();
    assert_eq!(request.header(HEADER_CLIENT_ID), Some("legacy"));
    assert_eq!(request.header(HEADER_SIGNATURE), None);
    assert_eq!(request.header("Authorization"), Some("Bearer tok"));
}

#[tokio::test]
async fn test_skip_auth_omits_bearer() {
    let transport = RecordingTransport::new();
    transport.respond(200, "{}");
    let client = client_with(
        ClientOptions::new()
            .api_url("http://api.test")
            .idp_url("")
            .token_supplier(StaticToken::new("tok")),
        transport.clone(),
    );

    client
        .request("/v1/public", RequestOptions::get().skip_auth())
        .await
        .unwrap();
    assert_eq!(transport.last_request().header("Authorization"), None);
}

#[tokio::test]
async fn test_caller_retry_recovers_from_server_errors() {
    let transport = RecordingTransport::new();
    transport
        .respond(503, "")
        .fail(TransportError::Network("reset".to_string()))
        .respond(200, r#"{"data": {"name": "Acme"}}"#);
    let client = direct_client(transport.clone());
    let admin = client.admin();

    let policy = RetryPolicy::new(3)
        .with_base_delay(Duration::from_millis(1))
        .with_jitter(false);
    let tenant: Value = retry_with_backoff(policy, || admin.get_tenant()).await.unwrap();

    assert_eq!(tenant, json!({"name": "Acme"}));
    assert_eq!(transport.requests().len(), 3);
}

#[tokio::test]
async fn test_core_never_retries_on_its_own() {
    let transport = RecordingTransport::new();
    transport.respond(500, r#"{"error": {"message": "boom"}}"#);
    let client = direct_client(transport.clone());

    let err = client.admin().get_tenant::<Value>().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServerError);
    assert_eq!(err.message(), "boom");
    assert_eq!(transport.requests().len(), 1);
}
