use httpmock::prelude::*;
use membench_backend::{
    build_backend, BackendConfig, BackendError, BackendKind, MemoryBackend, SessionKey, Turn,
    MAX_TURN_CHARS,
};
use serde_json::json;

fn config_for(server: &MockServer) -> BackendConfig {
    BackendConfig::new(server.base_url()).with_api_key("test-key")
}

#[tokio::test]
async fn mem0_add_sends_messages_under_session_key() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/memories/")
            .header("authorization", "Token test-key")
            .header_exists("x-membench-request-id")
            .json_body_includes(
                json!({
                    "user_id": "s-1_mem0_v1",
                    "messages": [{"role": "user", "content": "hi"}],
                    "enable_graph": false
                })
                .to_string(),
            );
        then.status(200).json_body(json!([{"id": "m-1", "event": "ADD"}]));
    });

    let backend = build_backend(BackendKind::Mem0, &config_for(&server)).expect("backend");
    let session = SessionKey::derive("s-1", BackendKind::Mem0, "v1");
    backend
        .add(&[Turn::user("hi")], &session)
        .await
        .expect("add should succeed");

    mock.assert();
}

#[tokio::test]
async fn mem0_search_normalizes_results_array() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v2/memories/search/")
            .json_body_includes(
                json!({"query": "weather", "top_k": 5, "filters": {"user_id": "t_mem0_default_version"}})
                    .to_string(),
            );
        then.status(200).json_body(json!({
            "results": [
                {"id": "a", "memory": "likes sun", "created_at": "2025-01-01"},
                {"id": 2, "memory": "dislikes rain", "created_at": "2025-01-02"}
            ]
        }));
    });

    let backend = build_backend(BackendKind::Mem0, &config_for(&server)).expect("backend");
    let session = SessionKey::derive("t", BackendKind::Mem0, "default_version");
    let records = backend
        .search("weather", &session, 5)
        .await
        .expect("search should succeed");

    mock.assert();
    let ids = records.iter().filter_map(|record| record.id()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["a", "2"]);
}

#[tokio::test]
async fn memos_api_search_filters_tool_trajectories_from_wrapped_payload() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/product/search");
        then.status(200).json_body(json!({
            "code": 200,
            "data": {
                "text_mem": [],
                "tool_mem": [{
                    "cube_id": "c",
                    "memories": [
                        {"id": "t1", "memory": "ran grep", "metadata": {"memory_type": "ToolTrajectoryMemory"}},
                        {"id": "x1", "memory": "fact", "metadata": {"memory_type": "WorkingMemory"}}
                    ]
                }]
            }
        }));
    });

    let backend = build_backend(BackendKind::MemosApi, &config_for(&server)).expect("backend");
    let session = SessionKey::derive("t", BackendKind::MemosApi, "v");
    let records = backend.search("q", &session, 10).await.expect("search");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id(), Some("t1"));
}

#[tokio::test]
async fn non_success_status_surfaces_as_http_status_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v4/search");
        then.status(503).body("upstream unavailable");
    });

    let backend = build_backend(BackendKind::Supermemory, &config_for(&server)).expect("backend");
    let session = SessionKey::derive("t", BackendKind::Supermemory, "v");
    let error = backend
        .search("q", &session, 10)
        .await
        .expect_err("503 should fail");
    match error {
        BackendError::HttpStatus { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "upstream unavailable");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn search_without_expected_array_is_an_invalid_response() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/v1/memory/retrieve/related-memory-items");
        then.status(200).json_body(json!({"status": "ok"}));
    });

    let backend = build_backend(BackendKind::Memu, &config_for(&server)).expect("backend");
    let session = SessionKey::derive("t", BackendKind::Memu, "v");
    let error = backend
        .search("q", &session, 3)
        .await
        .expect_err("missing array should fail");
    assert!(matches!(error, BackendError::InvalidResponse(_)));
}

#[tokio::test]
async fn memobase_add_truncates_turns_and_flushes_buffer() {
    let server = MockServer::start();
    let capped = format!("\"{}\"", "y".repeat(MAX_TURN_CHARS));
    let insert = server.mock(|when, then| {
        when.method(POST)
            .path("/api/v1/blobs/insert")
            .header("authorization", "Bearer test-key")
            .json_body_includes(json!({"user_id": "s_memobase_v", "blob_type": "chat"}).to_string())
            .body_includes(capped.as_str())
            .body_includes("chat_time");
        then.status(200).json_body(json!({"data": {"id": "blob-1"}}));
    });
    let flush = server.mock(|when, then| {
        when.method(POST).path("/api/v1/users/buffer/flush");
        then.status(200);
    });

    let backend = build_backend(BackendKind::Memobase, &config_for(&server)).expect("backend");
    let session = SessionKey::derive("s", BackendKind::Memobase, "v");
    backend
        .add(&[Turn::user("y".repeat(MAX_TURN_CHARS + 1000))], &session)
        .await
        .expect("add should succeed");

    insert.assert();
    flush.assert();
}

#[tokio::test]
async fn memos_api_online_add_posts_messages_for_user() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/add/message")
            .header("authorization", "Token test-key")
            .json_body_includes(
                json!({
                    "user_id": "s-2_memos-api-online_v",
                    "messages": [{"role": "user", "content": "book a flight"}]
                })
                .to_string(),
            );
        then.status(200).json_body(json!({"code": 0, "data": {"success": true}}));
    });

    let backend =
        build_backend(BackendKind::MemosApiOnline, &config_for(&server)).expect("backend");
    let session = SessionKey::derive("s-2", BackendKind::MemosApiOnline, "v");
    backend
        .add(&[Turn::user("book a flight")], &session)
        .await
        .expect("add should succeed");

    mock.assert();
}

#[tokio::test]
async fn memos_api_online_search_reads_memory_detail_list() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/search/memory").json_body_includes(
            json!({
                "query": "flights",
                "user_id": "s-2_memos-api-online_v",
                "memory_limit_number": 4
            })
            .to_string(),
        );
        then.status(200).json_body(json!({
            "code": 0,
            "data": {"memory_detail_list": [
                {"id": "d1", "memory": "booked SFO"},
                {"id": "d2", "memory": "prefers aisle"}
            ]}
        }));
    });

    let backend =
        build_backend(BackendKind::MemosApiOnline, &config_for(&server)).expect("backend");
    let session = SessionKey::derive("s-2", BackendKind::MemosApiOnline, "v");
    let records = backend
        .search("flights", &session, 4)
        .await
        .expect("search should succeed");

    mock.assert();
    let ids = records.iter().filter_map(|record| record.id()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["d1", "d2"]);
}

#[tokio::test]
async fn supermemory_add_sends_transcript_tagged_with_session() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v3/documents")
            .header("authorization", "Bearer test-key")
            .json_body_includes(json!({"containerTags": ["s-3_supermemory_v"]}).to_string())
            .body_includes("remember the blue door")
            .body_includes("chat_time");
        then.status(200).json_body(json!({"id": "doc-1", "status": "queued"}));
    });

    let backend = build_backend(BackendKind::Supermemory, &config_for(&server)).expect("backend");
    let session = SessionKey::derive("s-3", BackendKind::Supermemory, "v");
    backend
        .add(&[Turn::user("remember the blue door")], &session)
        .await
        .expect("add should succeed");

    mock.assert();
}

#[tokio::test]
async fn memu_add_sends_conversation_with_session_date() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/v1/memory/memorize")
            .header("authorization", "Bearer test-key")
            .json_body_includes(
                json!({
                    "user_id": "s-4_memu_v",
                    "agent_id": "membench",
                    "conversation": [
                        {"role": "user", "content": "hi"},
                        {"role": "assistant", "content": "hello"}
                    ]
                })
                .to_string(),
            )
            .body_includes("session_date");
        then.status(200).json_body(json!({"task_id": "t-1"}));
    });

    let backend = build_backend(BackendKind::Memu, &config_for(&server)).expect("backend");
    let session = SessionKey::derive("s-4", BackendKind::Memu, "v");
    backend
        .add(&[Turn::user("hi"), Turn::assistant("hello")], &session)
        .await
        .expect("add should succeed");

    mock.assert();
}
