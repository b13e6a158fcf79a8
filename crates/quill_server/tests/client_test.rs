//! HTTP client tests against local mock servers.

use futures::StreamExt;
use quill_core::{ClientType, Settings};
use quill_error::ServerErrorKind;
use quill_server::{
    COMPLETIONS_PATH, GenerationBackend, GenerationRequest, GenerationRequestBuilder,
    KOBOLD_STREAM_PATH, KoboldClient, OpenAiCompatibleClient, SamplerSettings,
    backend_from_settings,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sse(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/event-stream")
}

#[tokio::test]
async fn test_kobold_streams_tokens_until_done() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(KOBOLD_STREAM_PATH))
        .and(body_partial_json(json!({
            "prompt": "p",
            "max_length": 50,
            "stop_sequence": ["\n# 設定:"],
        })))
        .respond_with(sse(concat!(
            "event: message\ndata: {\"token\": \"星\"}\n\n",
            "event: message\ndata: not json\n\n",
            "event: message\ndata: {\"token\": \"降る\"}\n\n",
            "data: [DONE]\n\n",
            "event: message\ndata: {\"token\": \"after\"}\n\n",
        )))
        .mount(&server)
        .await;

    let client = KoboldClient::new(server.uri(), SamplerSettings::default());
    let request = GenerationRequestBuilder::default()
        .prompt("p")
        .max_length(50u32)
        .stop_sequence(vec!["\n# 設定:".to_string()])
        .build()
        .unwrap();

    let tokens: Vec<String> = client
        .generate_stream(&request)
        .await
        .unwrap()
        .map(|token| token.unwrap())
        .collect()
        .await;
    assert_eq!(tokens, vec!["星", "降る"]);
}

#[tokio::test]
async fn test_kobold_sends_default_stop_sequences() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(KOBOLD_STREAM_PATH))
        .and(body_partial_json(json!({ "stop_sequence": ["[INST]", "[/INST]"] })))
        .respond_with(sse("data: {\"token\": \"ok\"}\n\n"))
        .mount(&server)
        .await;

    let client = KoboldClient::new(server.uri(), SamplerSettings::default());
    let text = client.generate(&GenerationRequest::new("p")).await.unwrap();
    assert_eq!(text, "ok");
}

#[tokio::test]
async fn test_non_success_status_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(KOBOLD_STREAM_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .mount(&server)
        .await;

    let client = KoboldClient::new(server.uri(), SamplerSettings::default());
    let err = match client.generate_stream(&GenerationRequest::new("p")).await {
        Ok(_) => panic!("expected an API error"),
        Err(e) => e,
    };
    assert_eq!(
        err.kind,
        ServerErrorKind::Api {
            status: 503,
            body: "busy".to_string()
        }
    );
}

#[tokio::test]
async fn test_openai_compatible_streams_choice_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .and(body_partial_json(json!({ "prompt": "p", "stream": true, "max_tokens": 8 })))
        .respond_with(sse(concat!(
            "data: {\"choices\":[{\"text\":\"夜\"}]}\n\n",
            "data: {\"choices\":[{\"text\":\"\"}]}\n\n",
            "data: {\"choices\":[{\"text\":\"空\"}]}\n\n",
            "data: [DONE]\n\n",
        )))
        .mount(&server)
        .await;

    let client = OpenAiCompatibleClient::new(server.uri(), SamplerSettings::default());
    let request = GenerationRequestBuilder::default()
        .prompt("p")
        .max_length(8u32)
        .build()
        .unwrap();
    assert_eq!(client.generate(&request).await.unwrap(), "夜空");
}

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = KoboldClient::new(format!("{}/", server.uri()), SamplerSettings::default());
    assert!(client.health_check().await.is_ok());

    let down = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&down)
        .await;
    let client = OpenAiCompatibleClient::new(down.uri(), SamplerSettings::default());
    let err = client.health_check().await.unwrap_err();
    assert!(matches!(err.kind, ServerErrorKind::Api { status: 500, .. }));
}

#[test]
fn test_backend_from_settings_selects_client() {
    let mut settings = Settings::default();
    assert_eq!(backend_from_settings(&settings).provider_name(), "kobold");

    settings.client_type = ClientType::OpenaiCompatible;
    assert_eq!(
        backend_from_settings(&settings).provider_name(),
        "openai_compatible"
    );
}
