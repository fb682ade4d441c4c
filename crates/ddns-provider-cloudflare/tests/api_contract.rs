//! Contract Test: Cloudflare v4 API Client
//!
//! Constraints verified:
//! - Every request carries the JSON content type, the user agent and exactly
//!   one credential's headers
//! - Endpoints resolve beneath the base URL, including a path prefix
//! - Envelopes map to found / absent / failed outcomes
//! - Non-2xx answers are `UpstreamStatus`, malformed bodies are `Decode`
//! - Argument checks fail before any request is sent
//! - A done context never reaches the API
//! - A body cut short by the server is a transport error

use ddns_core::error::Error;
use ddns_core::{Context, DnsProvider, DnsRecord};
use ddns_provider_cloudflare::{CloudflareClient, DEFAULT_USER_AGENT};
use serde_json::json;
use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ctx() -> Context {
    Context::background().with_timeout(Duration::from_secs(2))
}

fn token_client(server: &MockServer) -> CloudflareClient {
    CloudflareClient::builder()
        .api_token("test-token")
        .base_url(server.uri())
        .build()
        .expect("client builds")
}

fn ok(result: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "success": true,
        "errors": [],
        "messages": [],
        "result": result,
    }))
}

fn failed(code: i64, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "success": false,
        "errors": [{"code": code, "message": message}],
        "messages": [],
        "result": null,
    }))
}

fn record_json(id: &str, name: &str, content: &str) -> serde_json::Value {
    json!({
        "id": id,
        "type": "A",
        "name": name,
        "content": content,
        "ttl": 1,
        "proxied": false,
    })
}

#[tokio::test]
async fn find_zone_sends_token_headers_and_returns_first_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones"))
        .and(query_param("name", "example.com"))
        .and(header("authorization", "Bearer test-token"))
        .and(header("content-type", "application/json"))
        .and(header("user-agent", DEFAULT_USER_AGENT))
        .respond_with(ok(json!([
            {"id": "zone-1", "name": "example.com"},
            {"id": "zone-2", "name": "example.com"},
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let zone_id = token_client(&server)
        .find_zone_id(&ctx(), "example.com")
        .await
        .unwrap();

    assert_eq!(zone_id, "zone-1");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("x-auth-email").is_none());
    assert!(requests[0].headers.get("x-auth-key").is_none());
    assert_eq!(requests[0].headers.get_all("content-type").iter().count(), 1);
}

#[tokio::test]
async fn global_key_sends_email_and_key_only() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones"))
        .and(header("x-auth-email", "ops@example.com"))
        .and(header("x-auth-key", "global-123"))
        .respond_with(ok(json!([{"id": "zone-1", "name": "example.com"}])))
        .expect(1)
        .mount(&server)
        .await;

    let client = CloudflareClient::builder()
        .global_key("ops@example.com", "global-123")
        .base_url(server.uri())
        .build()
        .unwrap();

    let zone_id = client.find_zone_id(&ctx(), "example.com").await.unwrap();
    assert_eq!(zone_id, "zone-1");

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn zone_lookup_not_found_cases() {
    for response in [ok(json!([])), failed(9109, "Invalid access token"), ok(json!(null))] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/zones"))
            .respond_with(response)
            .expect(1)
            .mount(&server)
            .await;

        let err = token_client(&server)
            .find_zone_id(&ctx(), "example.com")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NotFound(_)), "got {:?}", err);
    }
}

#[tokio::test]
async fn non_2xx_is_upstream_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "success": false,
            "errors": [{"code": 10000, "message": "Authentication error"}],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = token_client(&server)
        .find_zone_id(&ctx(), "example.com")
        .await
        .unwrap_err();

    match err {
        Error::UpstreamStatus { ref operation, status, ref reason } => {
            assert_eq!(operation, "zones lookup");
            assert_eq!(status, 403);
            assert_eq!(reason, "Forbidden");
        }
        other => panic!("expected UpstreamStatus, got {:?}", other),
    }
}

#[tokio::test]
async fn malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones/zid/dns_records"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let err = token_client(&server)
        .get_a_record(&ctx(), "zid", "home.example.com")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Decode { .. }), "got {:?}", err);
}

#[tokio::test]
async fn get_record_queries_type_and_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones/zid/dns_records"))
        .and(query_param("type", "A"))
        .and(query_param("name", "home.example.com"))
        .respond_with(ok(json!([record_json("rid", "home.example.com", "203.0.113.1")])))
        .expect(1)
        .mount(&server)
        .await;

    let record = token_client(&server)
        .get_a_record(&ctx(), "zid", "home.example.com")
        .await
        .unwrap()
        .expect("record present");

    assert_eq!(record.id, "rid");
    assert_eq!(record.name, "home.example.com");
    assert_eq!(record.content, "203.0.113.1");
}

#[tokio::test]
async fn get_record_absent_cases_return_none() {
    for response in [ok(json!([])), failed(1001, "Invalid zone identifier")] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/zones/zid/dns_records"))
            .respond_with(response)
            .expect(1)
            .mount(&server)
            .await;

        let record = token_client(&server)
            .get_a_record(&ctx(), "zid", "home.example.com")
            .await
            .unwrap();

        assert!(record.is_none());
    }
}

#[tokio::test]
async fn create_posts_label_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/zones/zid/dns_records"))
        .and(body_json(json!({
            "type": "A",
            "name": "home",
            "content": "203.0.113.7",
            "ttl": 1,
            "proxied": false,
        })))
        .respond_with(ok(record_json("new-rid", "home.example.com", "203.0.113.7")))
        .expect(1)
        .mount(&server)
        .await;

    let payload = DnsRecord::a("home", Ipv4Addr::new(203, 0, 113, 7), 1, false);
    let created = token_client(&server)
        .create_a_record(&ctx(), "zid", &payload)
        .await
        .unwrap();

    assert_eq!(created.id, "new-rid");
    assert_eq!(created.content, "203.0.113.7");
}

#[tokio::test]
async fn update_puts_by_record_id() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/zones/zid/dns_records/rid"))
        .and(body_json(json!({
            "type": "A",
            "name": "home",
            "content": "203.0.113.7",
            "ttl": 300,
            "proxied": true,
        })))
        .respond_with(ok(json!({
            "id": "rid",
            "type": "A",
            "name": "home.example.com",
            "content": "203.0.113.7",
            "ttl": 300,
            "proxied": true,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let payload = DnsRecord::a("home", Ipv4Addr::new(203, 0, 113, 7), 300, true);
    let updated = token_client(&server)
        .update_a_record(&ctx(), "zid", "rid", &payload)
        .await
        .unwrap();

    assert_eq!(updated.id, "rid");
    assert!(updated.proxied);
}

#[tokio::test]
async fn unsuccessful_write_reports_provider_errors() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/zones/zid/dns_records/rid"))
        .respond_with(failed(9005, "Content for A record is invalid."))
        .expect(1)
        .mount(&server)
        .await;

    let payload = DnsRecord::a("home", Ipv4Addr::new(203, 0, 113, 7), 1, false);
    let err = token_client(&server)
        .update_a_record(&ctx(), "zid", "rid", &payload)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::OperationFailed { .. }), "got {:?}", err);
    assert!(err.to_string().contains("9005: Content for A record is invalid."));
}

#[tokio::test]
async fn empty_arguments_fail_without_a_request() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ok(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let client = token_client(&server);
    let payload = DnsRecord::a("home", Ipv4Addr::new(203, 0, 113, 7), 1, false);

    let results = [
        client.find_zone_id(&ctx(), "").await.map(|_| ()),
        client.get_a_record(&ctx(), "", "home.example.com").await.map(|_| ()),
        client.get_a_record(&ctx(), "zid", "").await.map(|_| ()),
        client.create_a_record(&ctx(), "", &payload).await.map(|_| ()),
        client.update_a_record(&ctx(), "", "rid", &payload).await.map(|_| ()),
        client.update_a_record(&ctx(), "zid", "", &payload).await.map(|_| ()),
    ];

    for result in results {
        assert!(matches!(result, Err(Error::InvalidArgument(_))), "got {:?}", result);
    }
}

#[tokio::test]
async fn base_url_path_prefix_is_preserved() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/client/v4/zones"))
        .respond_with(ok(json!([{"id": "zone-1", "name": "example.com"}])))
        .expect(2)
        .mount(&server)
        .await;

    for base in [format!("{}/client/v4", server.uri()), format!("{}/client/v4/", server.uri())] {
        let client = CloudflareClient::builder()
            .api_token("test-token")
            .base_url(base)
            .build()
            .unwrap();

        assert_eq!(client.find_zone_id(&ctx(), "example.com").await.unwrap(), "zone-1");
    }
}

#[tokio::test]
async fn custom_user_agent_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones"))
        .and(header("user-agent", "home-ddns/2.0"))
        .respond_with(ok(json!([{"id": "zone-1", "name": "example.com"}])))
        .expect(1)
        .mount(&server)
        .await;

    let client = CloudflareClient::builder()
        .api_token("test-token")
        .base_url(server.uri())
        .user_agent("home-ddns/2.0")
        .build()
        .unwrap();

    client.find_zone_id(&ctx(), "example.com").await.unwrap();
}

#[tokio::test]
async fn done_context_never_reaches_the_api() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ok(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let client = token_client(&server);

    let cancelled = Context::background();
    cancelled.cancel();
    let err = client.find_zone_id(&cancelled, "example.com").await.unwrap_err();
    assert!(err.is_cancelled(), "got {:?}", err);

    let expired = Context::background().with_timeout(Duration::ZERO);
    let err = client
        .get_a_record(&expired, "zid", "home.example.com")
        .await
        .unwrap_err();
    assert!(err.is_timeout(), "got {:?}", err);
}

#[tokio::test]
async fn slow_api_is_bounded_by_the_deadline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zones"))
        .respond_with(
            ok(json!([{"id": "zone-1", "name": "example.com"}])).set_delay(Duration::from_millis(500)),
        )
        .expect(0..=1)
        .mount(&server)
        .await;

    let ctx = Context::background().with_timeout(Duration::from_millis(20));
    let err = token_client(&server)
        .find_zone_id(&ctx, "example.com")
        .await
        .unwrap_err();

    assert!(err.is_timeout(), "got {:?}", err);
}

#[tokio::test]
async fn truncated_envelope_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await;
        let _ = socket
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 64\r\n\r\n{\"success\":tr")
            .await;
        let _ = socket.shutdown().await;
    });

    let client = CloudflareClient::builder()
        .api_token("test-token")
        .base_url(format!("http://{}", addr))
        .build()
        .unwrap();

    let err = client.find_zone_id(&ctx(), "example.com").await.unwrap_err();

    assert!(matches!(err, Error::Transport { .. }), "got {:?}", err);
    assert!(!err.is_timeout());
}

#[test]
fn builder_rejects_bad_configuration() {
    let cases = [
        CloudflareClient::builder().build(),
        CloudflareClient::builder()
            .api_token("tok")
            .global_key("ops@example.com", "key")
            .build(),
        CloudflareClient::builder().global_key("", "key").build(),
        CloudflareClient::builder().api_token("tok").base_url("not a url").build(),
        CloudflareClient::builder().api_token("tok").base_url("ftp://example.com").build(),
    ];

    for result in cases {
        assert!(matches!(result, Err(Error::InvalidArgument(_))), "got {:?}", result);
    }
}
