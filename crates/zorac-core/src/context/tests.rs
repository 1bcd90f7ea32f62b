use super::*;
use crate::error::ZoracError;
use crate::llm::{Message, MessageRole, MockChatClient};
use crate::session::{FileSessionStore, MemorySessionStore, SessionStore};
use crate::streaming::StreamingResult;
use crate::tokens::{DEFAULT_ENCODING, TokenAccountant};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;

fn prompt() -> SystemPromptFn {
    Arc::new(|date: NaiveDate| format!("S {}", date))
}

fn settings(max_input_tokens: usize, keep_recent_messages: usize) -> ContextSettings {
    ContextSettings {
        max_input_tokens,
        keep_recent_messages,
    }
}

fn controller_with(store: Arc<dyn SessionStore>, settings: ContextSettings) -> ContextController {
    ContextController::new(
        TokenAccountant::new(DEFAULT_ENCODING).unwrap(),
        Summarizer::new("test-model"),
        store,
        settings,
        prompt(),
    )
}

/// Controller restored from a store holding `turns` question/answer pairs
async fn filled(
    settings: ContextSettings,
    turns: usize,
) -> (ContextController, Arc<MemorySessionStore>) {
    let mut stored = vec![Message::system("S stored")];
    for i in 0..turns {
        stored.push(Message::user(format!(
            "question number {} about something long enough",
            i
        )));
        stored.push(Message::assistant(format!(
            "answer number {} with a few more words",
            i
        )));
    }
    let store = Arc::new(MemorySessionStore::with_messages(stored));
    let (controller, _) = ContextController::bootstrap(
        TokenAccountant::new(DEFAULT_ENCODING).unwrap(),
        Summarizer::new("test-model"),
        store.clone(),
        settings,
        prompt(),
    )
    .await;
    (controller, store)
}

fn summarizing_client(summary: &'static str) -> MockChatClient {
    let mut client = MockChatClient::new();
    client
        .expect_complete()
        .returning(move |_| Ok(summary.to_string()));
    client
}

fn failing_client() -> MockChatClient {
    let mut client = MockChatClient::new();
    client
        .expect_complete()
        .returning(|_| Err(ZoracError::connection("connection refused")));
    client
}

fn finished(text: &str) -> StreamingResult {
    StreamingResult {
        text: text.to_string(),
        tokens: 3,
        duration: Duration::from_millis(300),
        tokens_per_second: 10.0,
        cancelled: false,
        error: None,
    }
}

#[test]
fn test_new_starts_with_primary_system_message() {
    let controller = controller_with(Arc::new(MemorySessionStore::new()), settings(100, 2));
    assert_eq!(controller.len(), 1);
    assert_eq!(controller.messages()[0].role, MessageRole::System);
    assert!(controller.messages()[0].content.starts_with("S "));
    assert_eq!(controller.current_summary(), None);
}

#[tokio::test]
async fn test_check_budget_within_limit_never_mutates() {
    let (mut controller, store) = filled(settings(100_000, 2), 3).await;
    let before = controller.snapshot();

    let mut client = MockChatClient::new();
    client.expect_complete().never();

    for _ in 0..5 {
        let result = controller.check_budget(&client).await;
        assert!(!result.was_compacted);
        assert_eq!(controller.messages(), before.as_slice());
    }
    assert_eq!(controller.stats().skipped_count, 5);
    assert_eq!(store.save_count(), 0);
}

#[tokio::test]
async fn test_over_budget_compacts_with_summary() {
    let (mut controller, store) = filled(settings(60, 2), 4).await;
    let before = controller.snapshot();
    let n = before.len();

    let result = controller
        .check_budget(&summarizing_client("user asked four questions"))
        .await;

    assert!(result.was_compacted);
    assert!(!result.used_fallback());
    assert_eq!(result.messages_compacted, n - 3);
    assert_eq!(controller.len(), 4);
    assert_eq!(controller.messages()[0], before[0]);
    assert_eq!(
        controller.messages()[1],
        Message::system("Previous conversation summary: user asked four questions")
    );
    assert_eq!(&controller.messages()[2..], &before[n - 2..]);
    assert_eq!(controller.current_summary(), Some("user asked four questions"));
    assert_eq!(result.summary_preview.as_deref(), Some("user asked four questions"));
    assert!(result.tokens_saved() > 0);
    // budget compaction does not persist on its own
    assert_eq!(store.save_count(), 0);
}

#[tokio::test]
async fn test_summaries_compound() {
    let (mut controller, _) = filled(settings(10, 2), 3).await;
    controller.force_summarize(&summarizing_client("first")).await;
    assert_eq!(controller.current_summary(), Some("first"));

    controller.append_user("another question");
    controller.append_assistant(&finished("another answer")).await;

    let mut client = MockChatClient::new();
    client
        .expect_complete()
        .withf(|req| req.messages[1].content.contains("SYSTEM: Previous conversation summary: first"))
        .times(1)
        .returning(|_| Ok("second".to_string()));
    controller.force_summarize(&client).await;

    let summaries = controller
        .messages()
        .iter()
        .filter(|m| is_summary(m))
        .count();
    assert_eq!(summaries, 1);
    assert_eq!(controller.current_summary(), Some("second"));
    assert_eq!(controller.stats().total_compactions, 2);
}

#[tokio::test]
async fn test_summarizer_failure_drops_old_messages() {
    let (mut controller, _) = filled(settings(10, 2), 3).await;
    let before = controller.snapshot();
    let n = before.len();

    let result = controller.force_summarize(&failing_client()).await;

    assert!(result.was_compacted);
    assert!(result.used_fallback());
    assert_eq!(result.summary_preview, None);
    let mut expected = vec![before[0].clone()];
    expected.extend_from_slice(&before[n - 2..]);
    assert_eq!(controller.messages(), expected.as_slice());
    assert_eq!(controller.stats().fallback_count, 1);
}

#[tokio::test]
async fn test_keep_recent_is_clamped() {
    let (mut controller, _) = filled(settings(1, 50), 2).await;
    let before = controller.snapshot();

    let mut client = MockChatClient::new();
    client.expect_complete().never();
    let result = controller.check_budget(&client).await;

    assert!(!result.was_compacted);
    assert_eq!(controller.messages(), before.as_slice());
    assert!(!controller.can_summarize());
}

#[tokio::test]
async fn test_keep_zero_leaves_system_and_summary() {
    let (mut controller, _) = filled(settings(1, 0), 2).await;
    controller.force_summarize(&summarizing_client("all of it")).await;
    assert_eq!(controller.len(), 2);
    assert_eq!(controller.current_summary(), Some("all of it"));
}

#[tokio::test]
async fn test_force_summarize_saves() {
    let (mut controller, store) = filled(settings(100_000, 2), 3).await;
    controller.force_summarize(&summarizing_client("s")).await;
    assert_eq!(store.save_count(), 1);
    assert_eq!(store.saved().unwrap(), controller.snapshot());
}

#[tokio::test]
async fn test_append_assistant_saves() {
    let store = Arc::new(MemorySessionStore::new());
    let mut controller = controller_with(store.clone(), settings(100, 2));
    controller.append_user("hi");

    let outcome = controller.append_assistant(&finished("Hello!")).await;

    assert_eq!(outcome, AppendOutcome::Saved);
    assert_eq!(controller.messages().last(), Some(&Message::assistant("Hello!")));
    assert_eq!(store.saved().unwrap(), controller.snapshot());
}

#[tokio::test]
async fn test_cancelled_result_is_discarded() {
    let store = Arc::new(MemorySessionStore::new());
    let mut controller = controller_with(store.clone(), settings(100, 2));
    controller.append_user("hi");
    let before = controller.snapshot();

    let cancelled = StreamingResult {
        cancelled: true,
        ..finished("partial text")
    };
    assert_eq!(controller.append_assistant(&cancelled).await, AppendOutcome::Discarded);

    let failed = StreamingResult {
        error: Some(ZoracError::request("bad")),
        ..finished("partial")
    };
    assert_eq!(controller.append_assistant(&failed).await, AppendOutcome::Discarded);
    assert_eq!(controller.append_assistant(&finished("")).await, AppendOutcome::Discarded);

    assert_eq!(controller.messages(), before.as_slice());
    assert_eq!(store.save_count(), 0);
}

#[tokio::test]
async fn test_append_with_failing_store_keeps_message() {
    let mut controller = controller_with(Arc::new(MemorySessionStore::failing()), settings(100, 2));
    controller.append_user("hi");

    let outcome = controller.append_assistant(&finished("Hello!")).await;

    assert!(matches!(outcome, AppendOutcome::Unsaved(ZoracError::Persistence { .. })));
    assert_eq!(controller.len(), 3);
}

#[tokio::test]
async fn test_reset_keeps_fresh_system_message() {
    let (mut controller, store) = filled(settings(100, 2), 3).await;
    controller.reset().await.unwrap();

    assert_eq!(controller.len(), 1);
    assert!(controller.messages()[0].is_system());
    assert_eq!(store.saved().unwrap().len(), 1);
}

#[tokio::test]
async fn test_bootstrap_fresh_when_nothing_stored() {
    let (controller, outcome) = ContextController::bootstrap(
        TokenAccountant::new(DEFAULT_ENCODING).unwrap(),
        Summarizer::new("m"),
        Arc::new(MemorySessionStore::new()),
        settings(100, 2),
        prompt(),
    )
    .await;
    assert_eq!(outcome, LoadOutcome::Fresh);
    assert_eq!(controller.len(), 1);
}

#[tokio::test]
async fn test_bootstrap_restores_and_rebuilds_primary() {
    let stored = vec![
        Message::system("S 2001-01-01"),
        Message::user("hello"),
        Message::assistant("hi"),
    ];
    let (controller, outcome) = ContextController::bootstrap(
        TokenAccountant::new(DEFAULT_ENCODING).unwrap(),
        Summarizer::new("m"),
        Arc::new(MemorySessionStore::with_messages(stored.clone())),
        settings(100, 2),
        prompt(),
    )
    .await;

    assert_eq!(outcome, LoadOutcome::Restored { messages: 3 });
    assert_eq!(controller.len(), 3);
    assert_ne!(controller.messages()[0], stored[0]);
    assert_eq!(&controller.messages()[1..], &stored[1..]);
}

#[tokio::test]
async fn test_bootstrap_corrupt_file_starts_fresh() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "not json at all").unwrap();

    let (controller, outcome) = ContextController::bootstrap(
        TokenAccountant::new(DEFAULT_ENCODING).unwrap(),
        Summarizer::new("m"),
        Arc::new(FileSessionStore::new(&path)),
        settings(100, 2),
        prompt(),
    )
    .await;

    assert!(matches!(outcome, LoadOutcome::Corrupt(_)));
    assert_eq!(controller.len(), 1);
}

#[tokio::test]
async fn test_reload_failure_leaves_state() {
    let mut controller = controller_with(Arc::new(MemorySessionStore::new()), settings(100, 2));
    controller.append_user("hi");
    let before = controller.snapshot();
    let err = controller.reload().await.unwrap_err();
    assert!(matches!(err, ZoracError::SessionNotFound { .. }));
    assert_eq!(controller.messages(), before.as_slice());
}

#[tokio::test]
async fn test_reload_without_primary_inserts_one() {
    let stored = vec![
        Message::user("a"),
        Message::assistant("b"),
        Message::user("c"),
    ];
    let store = Arc::new(MemorySessionStore::with_messages(stored.clone()));
    let mut controller = controller_with(store, settings(100, 1));

    assert_eq!(controller.reload().await.unwrap(), 4);
    let today = chrono::Local::now().date_naive();
    assert_eq!(controller.messages()[0], Message::system(format!("S {}", today)));
    assert_eq!(&controller.messages()[1..], stored.as_slice());

    controller.force_summarize(&summarizing_client("a then b")).await;
    assert_eq!(controller.len(), 3);
    assert_eq!(controller.messages()[0], Message::system(format!("S {}", today)));
    assert_eq!(controller.current_summary(), Some("a then b"));
    assert_eq!(controller.messages().last(), Some(&Message::user("c")));
}

#[tokio::test]
async fn test_reload_replaces_stale_primary() {
    let stored = vec![Message::system("S 2001-01-01"), Message::user("hello")];
    let store = Arc::new(MemorySessionStore::with_messages(stored));
    let mut controller = controller_with(store, settings(100, 2));

    assert_eq!(controller.reload().await.unwrap(), 2);
    let today = chrono::Local::now().date_naive();
    assert_eq!(controller.messages()[0], Message::system(format!("S {}", today)));
    assert!(!controller.refresh_system_message_on(today));
}

#[tokio::test]
async fn test_save_then_reload() {
    let (mut controller, store) = filled(settings(100, 2), 2).await;
    let saved = controller.snapshot();
    controller.save().await.unwrap();
    controller.append_user("unsaved");

    assert_eq!(controller.reload().await.unwrap(), saved.len());
    assert_eq!(controller.messages(), saved.as_slice());
}

#[test]
fn test_refresh_system_message_on_date_change() {
    let mut controller = controller_with(Arc::new(MemorySessionStore::new()), settings(100, 2));
    controller.append_user("hi");
    let today = chrono::Local::now().date_naive();

    assert!(!controller.refresh_system_message_on(today));

    let tomorrow = today.succ_opt().unwrap();
    assert!(controller.refresh_system_message_on(tomorrow));
    assert_eq!(controller.messages()[0], Message::system(format!("S {}", tomorrow)));
    assert_eq!(controller.len(), 2);
}

#[tokio::test]
async fn test_token_usage_saturates() {
    let (controller, _) = filled(settings(5, 2), 2).await;
    let usage = controller.token_usage();
    assert!(usage.current > 5);
    assert_eq!(usage.remaining, 0);
    assert_eq!(usage.limit, 5);
    assert_eq!(usage.messages, 5);
}

/// Primary system message followed by `body` alternating user/assistant
/// messages of uneven length
async fn restored(body: usize, keep: usize) -> ContextController {
    let mut stored = vec![Message::system("S stored")];
    for i in 0..body {
        let text = format!("message {} {}", i, "word ".repeat(i % 4));
        stored.push(if i % 2 == 0 {
            Message::user(text)
        } else {
            Message::assistant(text)
        });
    }
    let (controller, _) = ContextController::bootstrap(
        TokenAccountant::new(DEFAULT_ENCODING).unwrap(),
        Summarizer::new("test-model"),
        Arc::new(MemorySessionStore::with_messages(stored)),
        settings(1, keep),
        prompt(),
    )
    .await;
    controller
}

#[tokio::test]
async fn test_compaction_shape_across_sizes() {
    for body in 1..=8 {
        for keep in [0, 1, 2, body, body + 3] {
            for summarize_ok in [true, false] {
                let mut controller = restored(body, keep).await;
                let before = controller.snapshot();
                let client = if summarize_ok {
                    summarizing_client("folded")
                } else {
                    failing_client()
                };

                let result = controller.check_budget(&client).await;
                let case = format!("body={} keep={} ok={}", body, keep, summarize_ok);
                let after = controller.messages();

                if keep >= body {
                    assert!(!result.was_compacted, "{}", case);
                    assert_eq!(after, before.as_slice(), "{}", case);
                    continue;
                }

                assert!(result.was_compacted, "{}", case);
                assert_eq!(result.messages_compacted, body - keep, "{}", case);
                assert!(after.len() <= 2 + keep, "{}", case);
                assert_eq!(after[0], before[0], "{}", case);
                assert_eq!(
                    &after[after.len() - keep..],
                    &before[before.len() - keep..],
                    "{}",
                    case
                );

                if summarize_ok {
                    assert_eq!(after.len(), 2 + keep, "{}", case);
                    assert_eq!(controller.current_summary(), Some("folded"), "{}", case);
                } else {
                    assert_eq!(after.len(), 1 + keep, "{}", case);
                    assert_eq!(controller.current_summary(), None, "{}", case);
                }
                assert_eq!(result.messages_after, after.len(), "{}", case);
            }
        }
    }
}
