//! HTTP-level tests for the OpenAI-compatible provider against a mock server.

use rag_mcp_embed::{EmbedConfig, EmbedError, EmbeddingProvider, RemoteEmbedProvider};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_embeddings_are_returned_in_input_order() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(body_json(json!({"model": "qwen", "input": ["first", "second"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [
                {"object": "embedding", "index": 1, "embedding": [0.0, 1.0]},
                {"object": "embedding", "index": 0, "embedding": [1.0, 0.0]}
            ],
            "model": "qwen"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = EmbedConfig::new(format!("{}/v1", server.uri()), "qwen");
    let provider = RemoteEmbedProvider::new(config)?;
    let result = provider.embed_texts(&texts(&["first", "second"])).await?;

    assert_eq!(result.len(), 2);
    assert_eq!(result.dimension, 2);
    assert_eq!(result.embeddings[0][0].to_f32(), 1.0);
    assert_eq!(result.embeddings[1][1].to_f32(), 1.0);
    Ok(())
}

#[tokio::test]
async fn test_bearer_token_is_sent_when_configured() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"index": 0, "embedding": [0.5, 0.5, 0.5]}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = EmbedConfig::new(server.uri(), "m").with_api_key("sk-test");
    let provider = RemoteEmbedProvider::new(config)?;
    let embedding = provider.embed_text("hello").await?;
    assert_eq!(embedding.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_no_authorization_header_without_key() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(|req: &Request| !req.headers.contains_key("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"index": 0, "embedding": [1.0]}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = RemoteEmbedProvider::new(EmbedConfig::new(server.uri(), "m"))?;
    provider.embed_texts(&texts(&["x"])).await?;
    Ok(())
}

#[tokio::test]
async fn test_error_status_is_reported_with_body() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("model not loaded"))
        .mount(&server)
        .await;

    let provider = RemoteEmbedProvider::new(EmbedConfig::new(server.uri(), "m"))?;
    let err = provider.embed_texts(&texts(&["x"])).await.unwrap_err();
    match err {
        EmbedError::Status { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "model not loaded");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_mismatched_count_is_invalid_response() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"index": 0, "embedding": [1.0]}]
        })))
        .mount(&server)
        .await;

    let provider = RemoteEmbedProvider::new(EmbedConfig::new(server.uri(), "m"))?;
    let err = provider.embed_texts(&texts(&["a", "b"])).await.unwrap_err();
    assert!(matches!(err, EmbedError::InvalidResponse { .. }));
    Ok(())
}

#[tokio::test]
async fn test_duplicate_or_out_of_range_indices_are_invalid() -> anyhow::Result<()> {
    for data in [
        json!([{"index": 0, "embedding": [1.0]}, {"index": 0, "embedding": [2.0]}]),
        json!([{"index": 1, "embedding": [1.0]}, {"index": 2, "embedding": [2.0]}]),
    ] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": data })))
            .mount(&server)
            .await;

        let provider = RemoteEmbedProvider::new(EmbedConfig::new(server.uri(), "m"))?;
        let err = provider.embed_texts(&texts(&["a", "b"])).await.unwrap_err();
        assert!(
            matches!(err, EmbedError::InvalidResponse { .. }),
            "unexpected error for {data}: {err:?}"
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_slow_service_times_out() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": [{"index": 0, "embedding": [1.0]}]}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let config =
        EmbedConfig::new(server.uri(), "m").with_timeout(Duration::from_millis(200));
    let provider = RemoteEmbedProvider::new(config)?;
    let err = provider.embed_texts(&texts(&["x"])).await.unwrap_err();
    assert!(matches!(err, EmbedError::Request { .. }));
    Ok(())
}
