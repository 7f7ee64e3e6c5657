//! Concurrent writers against one channel. Every POST runs the full
//! read-modify-write cycle, so lost updates would show up as missing messages.

use calcwizard_channel::AuthScope;
use calcwizard_channel_integration::{now_iso, TestChannel};
use futures::future::join_all;
use serde_json::json;

const WRITERS: usize = 40;

/// 40 simultaneous arithmetic posts: every question is stored, and each one is
/// immediately followed by its own answer.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_posts_lose_nothing() {
    let ch = TestChannel::start(AuthScope::WriteOnly).await;

    let posts = (0..WRITERS).map(|i| {
        let ch = &ch;
        async move {
            ch.post_message(&format!("{i}+1000"), &format!("writer-{i}"), json!(now_iso()))
                .await
        }
    });
    for (status, body) in join_all(posts).await {
        assert_eq!((status, body.as_str()), (200, "OK"));
    }

    let history = ch.history(None).await;
    assert_eq!(history.len(), 1 + 2 * WRITERS);

    for i in 0..WRITERS {
        let question = format!("{i}+1000");
        let pos = history
            .iter()
            .position(|m| m.content == question)
            .unwrap_or_else(|| panic!("lost message {question}"));
        let answer = &history[pos + 1];
        assert_eq!(answer.sender, "CalcWizard");
        assert_eq!(answer.content, format!("Result: {}", i + 1000));
    }

    assert_eq!(ch.stored(), history);
}

/// Flooding past the count limit leaves exactly the newest 100 messages.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn flood_is_capped_at_retention_limit() {
    let ch = TestChannel::start(AuthScope::WriteOnly).await;

    let posts = (0..150).map(|i| {
        let ch = &ch;
        async move {
            ch.post_message(&format!("note {i}"), "flooder", json!(now_iso()))
                .await
        }
    });
    join_all(posts).await;

    let history = ch.history(None).await;
    assert_eq!(history.len(), 100);
    assert!(history.iter().all(|m| m.sender == "flooder"));
    assert_eq!(ch.stored().len(), 100);
}
