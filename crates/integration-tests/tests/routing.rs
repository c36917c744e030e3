mod harness;

use std::time::Duration;

use futures_util::future::join_all;
use harness::config::{ConfigBuilder, STRONG, WEAK};
use harness::mock_backend::MockBackend;
use harness::server::TestServer;
use serde_json::{Value, json};

/// Server with a deterministic `oracle` predictor and a `coin` random strategy
async fn start() -> (MockBackend, TestServer) {
    let mock = MockBackend::start().await.unwrap();
    let config = ConfigBuilder::new(&mock.base_url())
        .with_external("oracle", &mock.predictor_url())
        .with_random("coin")
        .build();
    let server = TestServer::start(config).await.unwrap();
    (mock, server)
}

fn chat(model: &str, content: &str) -> Value {
    json!({
        "model": model,
        "messages": [{"role": "user", "content": content}]
    })
}

#[tokio::test]
async fn chat_completion_routed_by_score() {
    let (mock, server) = start().await;

    let (status, body) = server
        .post_json("/v1/chat/completions", &chat("router-oracle-0.5", "a hard proof"))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["object"], "chat.completion");
    assert_eq!(body["choices"][0]["message"]["content"], "Hello from mock backend");
    assert_eq!(mock.last_request().unwrap()["model"], STRONG);

    let (status, _) = server
        .post_json("/v1/chat/completions", &chat("router-oracle-0.5", "say hi"))
        .await;
    assert_eq!(status, 200);
    assert_eq!(mock.last_request().unwrap()["model"], WEAK);

    assert_eq!(mock.chat_count(), 2);
    assert_eq!(mock.predict_count(), 2);
}

#[tokio::test]
async fn explicit_fields_route_and_are_stripped() {
    let (mock, server) = start().await;

    let body = json!({
        "model": "anything",
        "messages": [{"role": "user", "content": "a hard question"}],
        "router": "oracle",
        "threshold": 0.5,
        "temperature": 0.7,
        "top_p": 0.9,
        "user": "integration"
    });
    let (status, _) = server.post_json("/v1/chat/completions", &body).await;

    assert_eq!(status, 200);
    let forwarded = mock.last_request().unwrap();
    assert_eq!(
        forwarded,
        json!({
            "model": STRONG,
            "messages": [{"role": "user", "content": "a hard question"}],
            "temperature": 0.7,
            "top_p": 0.9,
            "user": "integration"
        })
    );
}

#[tokio::test]
async fn model_identifier_wins_over_fields() {
    let (mock, server) = start().await;

    let mut body = chat("router-oracle-0.95", "a hard question");
    body["router"] = json!("coin");
    body["threshold"] = json!(0.0);
    let (status, _) = server.post_json("/v1/chat/completions", &body).await;

    assert_eq!(status, 200);
    // 0.9 is below the encoded 0.95
    assert_eq!(mock.last_request().unwrap()["model"], WEAK);

    let (_, usage) = server.get_json("/v1/routing/usage").await;
    assert_eq!(usage, json!({"oracle": {WEAK: 1}}));
}

#[tokio::test]
async fn legacy_completions_use_completions_api() {
    let (mock, server) = start().await;

    let body = json!({"model": "router-oracle-0.5", "prompt": "once upon a hard time", "max_tokens": 8});
    let (status, response) = server.post_json("/v1/completions", &body).await;

    assert_eq!(status, 200);
    assert_eq!(response["object"], "text_completion");
    assert_eq!(mock.completion_count(), 1);
    assert_eq!(mock.chat_count(), 0);
    assert_eq!(
        mock.last_request().unwrap(),
        json!({"model": STRONG, "prompt": "once upon a hard time", "max_tokens": 8})
    );
}

#[tokio::test]
async fn routing_input_errors_are_400() {
    let (mock, server) = start().await;

    let cases = [
        (chat("router-x", "hi"), "invalid_model"),
        // Not a router identifier, and no router field to fall back on
        (chat("foo-bar-0.5", "hi"), "invalid_router"),
        (json!({"model": "gpt-4o", "router": "oracle", "messages": [{"role": "user", "content": "hi"}]}), "invalid_threshold"),
        (chat("router-oracle-abc", "hi"), "invalid_threshold"),
        (chat("router-oracle-1.5", "hi"), "invalid_threshold"),
        (chat("router-nope-0.5", "hi"), "invalid_router"),
        (json!({"model": "gpt-4o", "router": "", "threshold": 0.5, "messages": []}), "invalid_router"),
        (json!({"model": "router-oracle-0.5", "messages": []}), "invalid_request_error"),
        (
            json!({"model": "router-oracle-0.5", "messages": [{"role": "user", "content": "hi"}], "stream": true}),
            "invalid_request_error",
        ),
    ];

    for (body, kind) in cases {
        let (status, response) = server.post_json("/v1/chat/completions", &body).await;

        assert_eq!(status, 400, "{body}");
        assert_eq!(response["type"], kind, "{body}");
        assert!(response["error"].as_str().is_some_and(|m| !m.is_empty()), "{body}");
    }

    assert_eq!(mock.chat_count(), 0);
    let (_, usage) = server.get_json("/v1/routing/usage").await;
    assert_eq!(usage, json!({}));
}

#[tokio::test]
async fn backend_failure_is_500_after_counting_the_decision() {
    let (mock, server) = start().await;
    mock.fail_completions();

    let (status, response) = server
        .post_json("/v1/chat/completions", &chat("router-oracle-0.5", "hard"))
        .await;

    assert_eq!(status, 500);
    assert_eq!(response["type"], "upstream_error");
    let (_, usage) = server.get_json("/v1/routing/usage").await;
    assert_eq!(usage, json!({"oracle": {STRONG: 1}}));
}

#[tokio::test]
async fn slow_backend_times_out() {
    let mock = MockBackend::start().await.unwrap();
    let config = ConfigBuilder::new(&mock.base_url())
        .with_random("coin")
        .with_timeout("200ms")
        .build();
    let server = TestServer::start(config).await.unwrap();
    mock.delay_completions(Duration::from_secs(3));

    let (status, response) = server
        .post_json("/v1/chat/completions", &chat("router-coin-0.5", "hi"))
        .await;

    assert_eq!(status, 500);
    assert_eq!(response["type"], "upstream_error");
}

#[tokio::test]
async fn extreme_thresholds_pin_the_model() {
    let (mock, server) = start().await;

    for _ in 0..5 {
        server
            .post_json("/v1/chat/completions", &chat("router-coin-0.0", "hi"))
            .await;
        assert_eq!(mock.last_request().unwrap()["model"], STRONG);

        server
            .post_json("/v1/chat/completions", &chat("router-coin-1.0", "hi"))
            .await;
        assert_eq!(mock.last_request().unwrap()["model"], WEAK);
    }
}

#[tokio::test]
async fn models_listed_and_retrieved() {
    let (_mock, server) = start().await;

    let (status, list) = server.get_json("/v1/models").await;
    assert_eq!(status, 200);
    assert_eq!(list["object"], "list");
    let ids: Vec<&str> = list["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["router-oracle", "router-coin"]);

    let (status, model) = server.get_json("/v1/models/router-oracle-0.3").await;
    assert_eq!(status, 200);
    assert_eq!(model["id"], "router-oracle-0.3");
    assert_eq!(model["object"], "model");
    assert_eq!(model["owned_by"], "tandem");

    let (status, error) = server.get_json("/v1/models/gpt-4o").await;
    assert_eq!(status, 404);
    assert_eq!(error["type"], "not_found_error");
}

#[tokio::test]
async fn batch_scores_keep_prompt_order() {
    let (mock, server) = start().await;

    let body = json!({"router": "oracle", "prompts": ["easy", "hard", "easy again"]});
    let (status, response) = server.post_json("/v1/routing/scores", &body).await;

    assert_eq!(status, 200);
    assert_eq!(response, json!({"router": "oracle", "scores": [0.1, 0.9, 0.1]}));
    assert_eq!(mock.predict_count(), 3);
    // Scoring is not routing
    let (_, usage) = server.get_json("/v1/routing/usage").await;
    assert_eq!(usage, json!({}));
}

#[tokio::test]
async fn empty_batch_scores_to_empty_list() {
    let (mock, server) = start().await;

    let (status, response) = server
        .post_json("/v1/routing/scores", &json!({"router": "oracle", "prompts": []}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(response, json!({"router": "oracle", "scores": []}));
    assert_eq!(mock.predict_count(), 0);

    let (status, response) = server
        .post_json("/v1/routing/scores", &json!({"router": "bert", "prompts": []}))
        .await;
    assert_eq!(status, 400);
    assert_eq!(response["type"], "invalid_router");
}

#[tokio::test]
async fn concurrent_requests_counted_exactly() {
    let (mock, server) = start().await;
    let requests = 200;
    let body = chat("router-coin-0.5", "hi");

    let responses = join_all((0..requests).map(|_| server.post_json("/v1/chat/completions", &body))).await;

    assert!(responses.iter().all(|(status, _)| *status == 200));
    assert_eq!(mock.chat_count(), requests);

    let (_, usage) = server.get_json("/v1/routing/usage").await;
    let counts = usage["coin"].as_object().unwrap();
    let total: u64 = counts.values().map(|v| v.as_u64().unwrap()).sum();
    assert_eq!(total, u64::from(requests));
    assert!(counts.keys().all(|model| model == STRONG || model == WEAK));
}
