use calcwizard_channel::AuthScope;
use calcwizard_channel_integration::{auth_header, now_iso, test_config, TestChannel};
use calcwizard_common::arith::EVALUATION_ERROR_REPLY;
use calcwizard_common::Message;
use serde_json::json;

/// A fresh channel greets with a single System message, both over HTTP and on disk.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn fresh_channel_is_seeded_with_welcome() {
    let ch = TestChannel::start(AuthScope::WriteOnly).await;

    let history = ch.history(None).await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].sender, "System");
    assert!(history[0].content.starts_with("Welcome to CalcWizard!"));
    assert_eq!(ch.stored(), history);
}

/// Posting arithmetic stores the user message followed by the channel's answer.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn arithmetic_message_gets_answered() {
    let ch = TestChannel::start(AuthScope::WriteOnly).await;

    let (status, body) = ch.post_message("what is 2+2?", "alice", json!(now_iso())).await;
    assert_eq!((status, body.as_str()), (200, "OK"));

    let history = ch.history(None).await;
    assert_eq!(history.len(), 3);
    assert_eq!(history[1].content, "what is 2+2?");
    assert_eq!(history[1].sender, "alice");
    assert_eq!(history[2].content, "Result: 4");
    assert_eq!(history[2].sender, "CalcWizard");
    assert_eq!(ch.stored(), history);
}

/// Old client timestamps are kept when the age limit allows it; the reply follows.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn historic_timestamp_round_trip() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut config = test_config(dir.path().join("messages.json"));
    config.max_age_seconds = 10.0 * 365.0 * 86_400.0;
    let ch = TestChannel::start_with(config).await;

    let (status, _) = ch
        .post_message("5*3", "alice", json!("2024-01-01T00:00:00"))
        .await;
    assert_eq!(status, 200);

    let history = ch.history(None).await;
    let tail = &history[history.len() - 2..];
    assert_eq!(tail[0], Message::new("5*3", "alice", 1_704_067_200.0));
    assert_eq!(tail[1].content, "Result: 15");
    assert_eq!(tail[1].sender, "CalcWizard");
}

/// Without the secret nothing is written.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn post_without_authorization_is_rejected() {
    let ch = TestChannel::start(AuthScope::WriteOnly).await;
    let body = json!({"content": "1+1", "sender": "mallory", "timestamp": now_iso()}).to_string();

    let (status, text) = ch.post_raw(body.clone(), None).await;
    assert_eq!((status, text.as_str()), (400, "Invalid authorization"));

    let (status, _) = ch.post_raw(body, Some("authkey guess")).await;
    assert_eq!(status, 400);

    assert_eq!(ch.history(None).await.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn off_topic_and_broken_math() {
    let ch = TestChannel::start(AuthScope::WriteOnly).await;

    ch.post_message("hello there", "bob", json!(now_iso())).await;
    ch.post_message("10/0", "bob", json!(now_iso())).await;

    let contents: Vec<String> = ch
        .history(None)
        .await
        .into_iter()
        .skip(1)
        .map(|m| m.content)
        .collect();
    assert_eq!(
        contents,
        [
            "[Filtered] Off-topic message for CalcWizard.",
            "10/0",
            EVALUATION_ERROR_REPLY,
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_fields_are_reported_by_name() {
    let ch = TestChannel::start(AuthScope::WriteOnly).await;
    let auth = auth_header();

    let (status, text) = ch.post_raw(String::new(), Some(&auth)).await;
    assert_eq!((status, text.as_str()), (400, "No message"));

    let (_, text) = ch
        .post_raw(json!({"content": "1+1", "timestamp": 1}).to_string(), Some(&auth))
        .await;
    assert_eq!(text, "No sender");
}

/// The strict deployment gates health and history too.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn all_routes_scope_protects_reads() {
    let ch = TestChannel::start(AuthScope::AllRoutes).await;
    let auth = auth_header();

    assert_eq!(ch.get("/health", None).await.0, 400);
    assert_eq!(ch.get("/", None).await.0, 400);

    let (status, body) = ch.get("/health", Some(&auth)).await;
    assert_eq!(status, 200);
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&body).unwrap(),
        json!({"name": "CalcWizard"})
    );
    assert_eq!(ch.history(Some(&auth)).await.len(), 1);
}

/// History survives a restart, and documents with string timestamps still load.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn history_survives_restart() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("messages.json");
    let legacy = json!([
        {"content": "1+2", "sender": "zoe", "timestamp": now_iso(), "extra": {"client": "web"}},
        {"content": "Result: 3", "sender": "CalcWizard", "timestamp": now_iso(), "extra": null}
    ]);
    std::fs::write(&path, legacy.to_string()).unwrap();

    let first = TestChannel::start_with(test_config(path.clone())).await;
    let history = first.history(None).await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].extra, Some(json!({"client": "web"})));
    assert!(history[0].timestamp > 0.0);

    first.post_message("7/2", "zoe", json!(now_iso())).await;

    let second = TestChannel::start_with(test_config(path)).await;
    let contents: Vec<String> = second.history(None).await.into_iter().map(|m| m.content).collect();
    assert_eq!(contents, ["1+2", "Result: 3", "7/2", "Result: 3.5"]);
}
