use pressroom_core::config::{PublishConfig, PublishEncoding};
use pressroom_core::contract::{AssetRole, PublishOutcome, PublishRequest, Publisher, StoredAsset};
use pressroom_core::publisher::HttpPublisher;
use std::fs;
use tempfile::tempdir;
use wiremock::matchers::{body_string_contains, header, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request() -> PublishRequest {
    PublishRequest {
        keyword: "trail running".into(),
        title: "Trail running for beginners".into(),
        body: "<p>Start slow.</p>".into(),
        classification_id: Some(7),
        assets: vec![],
    }
}

fn publisher(server: &MockServer, tweak: impl FnOnce(&mut PublishConfig)) -> HttpPublisher {
    let mut config = PublishConfig {
        endpoint: format!("{}/api/articles", server.uri()),
        ..PublishConfig::default()
    };
    tweak(&mut config);
    HttpPublisher::new(config).expect("client builds")
}

#[tokio::test]
async fn accepted_item_yields_remote_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/articles"))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(201).set_body_string(r#"{"id": 4711}"#))
        .expect(1)
        .mount(&server)
        .await;

    let publisher = publisher(&server, |c| c.api_token = Some("s3cret".into()));
    let outcome = publisher.publish(&request()).await;
    assert_eq!(
        outcome,
        PublishOutcome::Published {
            remote_id: "4711".into()
        }
    );
}

#[tokio::test]
async fn nested_identifier_path_is_followed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"data": {"article": {"slug": "trail-running"}}}"#),
        )
        .mount(&server)
        .await;

    let publisher = publisher(&server, |c| c.id_field = "data.article.slug".into());
    let outcome = publisher.publish(&request()).await;
    assert_eq!(outcome.remote_id(), Some("trail-running"));
}

#[tokio::test]
async fn server_error_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database is down"))
        .mount(&server)
        .await;

    let outcome = publisher(&server, |_| {}).publish(&request()).await;
    assert_eq!(
        outcome,
        PublishOutcome::Rejected {
            status: 500,
            reason: "database is down".into()
        }
    );
}

#[tokio::test]
async fn success_status_without_json_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>saved!</html>"))
        .mount(&server)
        .await;

    let outcome = publisher(&server, |_| {}).publish(&request()).await;
    assert!(matches!(outcome, PublishOutcome::Rejected { status: 200, .. }));
    assert!(!outcome.is_success());
}

#[tokio::test]
async fn acknowledgement_without_identifier_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status": "ok"}"#))
        .mount(&server)
        .await;

    let outcome = publisher(&server, |_| {}).publish(&request()).await;
    assert!(matches!(outcome, PublishOutcome::Rejected { status: 200, .. }));
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_failure() {
    let config = PublishConfig {
        endpoint: "http://127.0.0.1:1/api/articles".into(),
        timeout_secs: 5,
        ..PublishConfig::default()
    };
    let outcome = HttpPublisher::new(config)
        .unwrap()
        .publish(&request())
        .await;
    assert!(matches!(outcome, PublishOutcome::TransportFailure { .. }));
}

#[tokio::test]
async fn form_encoding_sends_fields_and_asset_placeholders() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("title=Trail+running+for+beginners"))
        .and(body_string_contains("keywords=trail+running"))
        .and(body_string_contains("category_id=7"))
        .and(body_string_contains("cover_image=images%2Fdefault_cover.jpg"))
        .and(body_string_contains("thumbnail_image=images%2Fdefault_thumb.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id": "a1"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let publisher = publisher(&server, |c| c.encoding = PublishEncoding::Form);
    assert!(publisher.publish(&request()).await.is_success());
}

#[tokio::test]
async fn multipart_encoding_carries_asset_files() {
    let dir = tempdir().unwrap();
    let cover = dir.path().join("trail_running_cover.jpg");
    let thumb = dir.path().join("trail_running_thumb.jpg");
    fs::write(&cover, "COVER-BYTES").unwrap();
    fs::write(&thumb, "THUMB-BYTES").unwrap();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .and(body_string_contains("name=\"article_title\""))
        .and(body_string_contains("Trail running for beginners"))
        .and(body_string_contains(
            "name=\"cover_image\"; filename=\"trail_running_cover.jpg\"",
        ))
        .and(body_string_contains("COVER-BYTES"))
        .and(body_string_contains("name=\"thumbnail_image\""))
        .and(body_string_contains("THUMB-BYTES"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id": 3}"#))
        .expect(1)
        .mount(&server)
        .await;

    let publisher = publisher(&server, |c| c.fields.title = "article_title".into());
    let mut req = request();
    req.assets = vec![
        StoredAsset {
            role: AssetRole::Cover,
            path: cover,
        },
        StoredAsset {
            role: AssetRole::Thumbnail,
            path: thumb,
        },
    ];
    assert_eq!(publisher.publish(&req).await.remote_id(), Some("3"));
}

#[tokio::test]
async fn missing_asset_file_fails_before_sending() {
    let dir = tempdir().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut req = request();
    req.assets = vec![StoredAsset {
        role: AssetRole::Cover,
        path: dir.path().join("vanished.jpg"),
    }];
    let outcome = publisher(&server, |_| {}).publish(&req).await;
    match outcome {
        PublishOutcome::TransportFailure { reason } => assert!(reason.contains("vanished.jpg")),
        other => panic!("unexpected outcome {other:?}"),
    }
}
