//! HTTP-level tests for the completion client against a stub server

use storyboard_llm::{
    ChatProvider, ChatRequest, LlmError, OpenAiCompatibleProvider, Provider, ProviderConfig,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn relay_provider(server: &MockServer) -> OpenAiCompatibleProvider {
    let config = ProviderConfig::new(
        Provider::Custom {
            base_url: format!("{}/v1/", server.uri()),
        },
        "test-key",
    )
    .with_model("deepseek-chat")
    .with_timeout_secs(10);
    OpenAiCompatibleProvider::new(config).unwrap()
}

#[tokio::test]
async fn test_success_returns_content_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({
            "model": "deepseek-chat",
            "messages": [
                {"role": "system", "content": "split"},
                {"role": "user", "content": "他走进屋子。"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"choices":[{"message":{"role":"assistant","content":"1. 他走进屋子。\n"}}]}"#,
            "application/json",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let provider = relay_provider(&server);
    let reply = provider
        .complete(&ChatRequest::new("split", "他走进屋子。", 0.7))
        .await
        .unwrap();
    assert_eq!(reply, "1. 他走进屋子。\n");
}

#[tokio::test]
async fn test_non_success_status_is_protocol_error_with_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_raw(r#"{"error":{"message":"invalid api key"}}"#, "application/json"),
        )
        .mount(&server)
        .await;

    let provider = relay_provider(&server);
    let err = provider
        .complete(&ChatRequest::new("s", "u", 0.7))
        .await
        .unwrap_err();

    match err {
        LlmError::Protocol { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("invalid api key"));
        }
        other => panic!("Expected Protocol error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_success_without_choices_is_schema_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"object":"error"}"#, "application/json"),
        )
        .mount(&server)
        .await;

    let provider = relay_provider(&server);
    let err = provider
        .complete(&ChatRequest::new("s", "u", 0.7))
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::Schema { ref body, .. } if body == r#"{"object":"error"}"#));
}

#[tokio::test]
async fn test_slow_server_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(std::time::Duration::from_secs(3))
                .set_body_raw(r#"{"choices":[]}"#, "application/json"),
        )
        .mount(&server)
        .await;

    let config = ProviderConfig::new(
        Provider::Custom {
            base_url: server.uri(),
        },
        "k",
    )
    .with_timeout_secs(1);
    let provider = OpenAiCompatibleProvider::new(config).unwrap();
    let err = provider
        .complete(&ChatRequest::new("s", "u", 0.7))
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::Transport(_)));
}

#[tokio::test]
async fn test_empty_system_prompt_sends_user_message_only() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({
            "messages": [{"role": "user", "content": "only user"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"choices":[{"message":{"content":"ok"}}]}"#,
            "application/json",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let provider = relay_provider(&server);
    let reply = provider
        .complete(&ChatRequest::new("", "only user", 0.2))
        .await
        .unwrap();
    assert_eq!(reply, "ok");
}

#[tokio::test]
async fn test_missing_api_key_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = ProviderConfig::new(
        Provider::Custom {
            base_url: server.uri(),
        },
        "",
    );
    let provider = OpenAiCompatibleProvider::new(config).unwrap();
    let err = provider
        .complete(&ChatRequest::new("s", "u", 0.7))
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::Config(_)));
}
