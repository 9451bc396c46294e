#[path = "common.rs"]
mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use simplebroker::api::handlers::{MessageDto, QueueInfo};
use simplebroker::api::{create_router, ApiState};

fn test_server(max_queue_num: usize, max_messages_per_queue: usize) -> (TestServer, ApiState) {
    common::init_logging();
    let state = ApiState {
        manager: Arc::new(common::manager(max_queue_num, max_messages_per_queue)),
        default_timeout: Duration::from_secs(1),
        shutdown: CancellationToken::new(),
    };
    let server = TestServer::new(create_router(state.clone())).unwrap();
    (server, state)
}

#[tokio::test]
async fn put_then_get_round_trips_in_order() {
    let (server, _) = test_server(10, 10);

    server
        .put("/queue/first")
        .json(&json!({ "message": "message 1" }))
        .await
        .assert_status_ok();
    server
        .put("/queue/first")
        .json(&json!({ "message": "message 2" }))
        .await
        .assert_status_ok();

    let first: MessageDto = server.get("/queue/first").await.json();
    assert_eq!(first.message, "message 1");
    let second: MessageDto = server
        .get("/queue/first")
        .add_query_param("timeout", 3)
        .await
        .json();
    assert_eq!(second.message, "message 2");
}

#[tokio::test]
async fn empty_queue_times_out_with_not_found() {
    let (server, _) = test_server(10, 10);

    server
        .get("/queue/nothing")
        .add_query_param("timeout", 1)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bad_timeouts_are_rejected() {
    let (server, _) = test_server(10, 10);

    for timeout in ["0", "-3", "abc"] {
        server
            .get("/queue/q")
            .add_query_param("timeout", timeout)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn oversized_timeout_does_not_bring_the_broker_down() {
    let (server, _) = test_server(10, 10);
    let forever = u64::MAX.to_string();

    server
        .get("/queue/nowhere")
        .add_query_param("timeout", &forever)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    server
        .put("/queue/q")
        .json(&json!({ "message": "still here" }))
        .await
        .assert_status_ok();
    let got: MessageDto = server
        .get("/queue/q")
        .add_query_param("timeout", &forever)
        .await
        .json();
    assert_eq!(got.message, "still here");
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let (server, state) = test_server(10, 10);

    server
        .put("/queue/q")
        .text("not json")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(state.manager.queue_count().await, 0);
}

#[tokio::test]
async fn body_without_message_enqueues_empty_string() {
    let (server, _) = test_server(10, 10);

    server
        .put("/queue/q")
        .json(&json!({}))
        .await
        .assert_status_ok();
    let got: MessageDto = server.get("/queue/q").await.json();
    assert_eq!(got.message, "");
}

#[tokio::test]
async fn capacity_limits_answer_too_many_requests() {
    let (server, _) = test_server(1, 1);

    server
        .put("/queue/a")
        .json(&json!({ "message": "1" }))
        .await
        .assert_status_ok();
    // Backlog of "a" is full.
    server
        .put("/queue/a")
        .json(&json!({ "message": "2" }))
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);
    // No room for a second queue.
    server
        .put("/queue/b")
        .json(&json!({ "message": "1" }))
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn unsupported_methods_and_paths_are_bad_requests() {
    let (server, _) = test_server(10, 10);

    server
        .delete("/queue/q")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .post("/queue/q")
        .json(&json!({ "message": "x" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .get("/queue/")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .get("/elsewhere")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn queues_listing_reports_backlog() {
    let (server, _) = test_server(10, 10);

    for (name, count) in [("b", 2), ("a", 1)] {
        for i in 0..count {
            server
                .put(&format!("/queue/{name}"))
                .json(&json!({ "message": i.to_string() }))
                .await
                .assert_status_ok();
        }
    }

    let queues: Vec<QueueInfo> = server.get("/queues").await.json();
    assert_eq!(
        queues,
        vec![
            QueueInfo {
                name: "a".into(),
                len: 1
            },
            QueueInfo {
                name: "b".into(),
                len: 2
            },
        ]
    );
}

#[tokio::test]
async fn broker_shutdown_releases_blocked_get() {
    let (server, state) = test_server(10, 10);
    server
        .put("/queue/q")
        .json(&json!({ "message": "seed" }))
        .await
        .assert_status_ok();
    server.get("/queue/q").await.assert_status_ok();

    let request = server.get("/queue/q").add_query_param("timeout", 30);
    let blocked = async { request.await };
    let cancel = async {
        tokio::time::sleep(common::SHORT).await;
        state.shutdown.cancel();
    };
    let (response, ()) = tokio::time::timeout(Duration::from_secs(5), async {
        tokio::join!(blocked, cancel)
    })
    .await
    .expect("blocked GET was not released");

    response.assert_status(StatusCode::NOT_FOUND);
}
