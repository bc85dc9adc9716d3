use std::time::Duration;

use planwise::ai::{AiError, ChatClient, CompletionClient, CompletionRequest};
use planwise::config::{AiConfig, Config};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> AiConfig {
    AiConfig {
        api_key: Some("test-key".into()),
        base_url: server.uri(),
        ..AiConfig::default()
    }
}

fn request() -> CompletionRequest {
    CompletionRequest {
        system: "You plan days.".into(),
        prompt: "Plan my Monday".into(),
        max_tokens: 100,
        timeout: Duration::from_secs(5),
    }
}

/// Runs the blocking client off the async runtime.
async fn complete(config: AiConfig) -> Result<String, AiError> {
    tokio::task::spawn_blocking(move || ChatClient::new(&config)?.complete(&request()))
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_returns_message_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "deepseek-chat",
            "max_tokens": 100,
            "messages": [
                { "role": "system", "content": "You plan days." },
                { "role": "user", "content": "Plan my Monday" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "10:00-11:00 Write" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = complete(config_for(&server)).await.unwrap();
    assert_eq!(reply, "10:00-11:00 Write");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_trailing_slash_in_base_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "ok" } }]
        })))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.base_url = format!("{}/", server.uri());
    assert_eq!(complete(config).await.unwrap(), "ok");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
        .mount(&server)
        .await;

    let err = complete(config_for(&server)).await.unwrap_err();
    assert!(matches!(err, AiError::Authentication(401)));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Rate limit exceeded"))
        .mount(&server)
        .await;

    let err = complete(config_for(&server)).await.unwrap_err();
    assert!(matches!(err, AiError::RateLimit));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_error_keeps_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    match complete(config_for(&server)).await.unwrap_err() {
        AiError::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "upstream exploded");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_or_malformed_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": null } }]
        })))
        .mount(&server)
        .await;
    let err = complete(config_for(&server)).await.unwrap_err();
    assert!(matches!(err, AiError::InvalidResponse(_)));

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;
    let err = complete(config_for(&server)).await.unwrap_err();
    assert!(matches!(err, AiError::InvalidResponse(_)));

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;
    let err = complete(config_for(&server)).await.unwrap_err();
    assert!(matches!(err, AiError::InvalidResponse(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "choices": [{ "message": { "content": "late" } }] }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = config_for(&server);
    let err = tokio::task::spawn_blocking(move || {
        let req = CompletionRequest { timeout: Duration::from_millis(200), ..request() };
        ChatClient::new(&config)?.complete(&req)
    })
    .await
    .unwrap()
    .unwrap_err();
    assert!(matches!(err, AiError::Timeout(_)));
}

#[test]
fn test_missing_key_is_not_configured() {
    let config = AiConfig::default();
    assert!(!config.is_configured());
    assert!(matches!(ChatClient::new(&config), Err(AiError::NotConfigured)));

    let blank = AiConfig { api_key: Some("   ".into()), ..AiConfig::default() };
    assert!(!blank.is_configured());
    assert!(matches!(ChatClient::new(&blank), Err(AiError::NotConfigured)));
}

#[test]
fn test_config_file_parsing() {
    let config = Config::parse(
        r#"
        [database]
        path = "/tmp/plans.db"

        [ai]
        api_key = "sk-123"
        model = "gpt-4o-mini"
        day_timeout_secs = 30
        "#,
    )
    .unwrap();

    assert_eq!(config.database.path.as_deref(), Some(std::path::Path::new("/tmp/plans.db")));
    assert!(config.ai.is_configured());
    assert_eq!(config.ai.model, "gpt-4o-mini");
    assert_eq!(config.ai.day_timeout_secs, 30);
    // untouched keys keep their defaults
    assert_eq!(config.ai.week_max_tokens, 8000);
    assert_eq!(config.ai.base_url, "https://api.deepseek.com");

    assert!(Config::parse("[ai]\nmodel = 3").is_err());
    assert!(Config::parse("").unwrap().database.path.is_none());
}
