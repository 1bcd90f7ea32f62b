//! End-to-end conversation scenarios against a scripted endpoint

mod common;

use common::{ScriptedClient, SilentRenderer, accountant, controller, memory_store};
use std::sync::Arc;
use zorac_core::context::is_summary;
use zorac_core::llm::StreamChunk;
use zorac_core::tokens::{MESSAGE_OVERHEAD, REPLY_PRIMING};
use zorac_core::{AppendOutcome, GenerationSettings, Message, StreamCoordinator, ZoracError};

fn generation() -> GenerationSettings {
    GenerationSettings {
        model: "scripted".to_string(),
        temperature: 0.1,
        max_output_tokens: 128,
        stream_enabled: true,
    }
}

#[tokio::test]
async fn scenario_a_token_count_grows_with_each_turn() {
    let store = memory_store();
    let mut ctx = controller(store.clone(), 100_000, 6);
    let acc = accountant();

    let mut previous = ctx.token_count();
    assert_eq!(
        previous,
        MESSAGE_OVERHEAD + acc.count_text("system") + acc.count_text("S") + REPLY_PRIMING
    );

    let turns = [("hi", "hello"), ("how are you?", "fine, thanks"), ("bye", "goodbye!")];
    for (question, answer) in turns {
        ctx.append_user(question);
        let client = Arc::new(ScriptedClient::new().with_stream(vec![
            Ok(StreamChunk::content(answer)),
            Ok(StreamChunk::final_chunk(None)),
        ]));
        let coordinator = StreamCoordinator::new(client, accountant());
        let result = coordinator
            .run(ctx.snapshot(), &generation(), &SilentRenderer)
            .await;
        assert_eq!(ctx.append_assistant(&result).await, AppendOutcome::Saved);

        let now = ctx.token_count();
        assert!(now > previous);
        previous = now;
    }

    let expected: usize = ctx
        .messages()
        .iter()
        .map(|m| {
            MESSAGE_OVERHEAD + acc.count_text(m.role.as_str()) + acc.count_text(&m.content)
        })
        .sum::<usize>()
        + REPLY_PRIMING;
    assert_eq!(ctx.token_count(), expected);
    assert_eq!(ctx.len(), 7);
    assert_eq!(store.saved().unwrap(), ctx.snapshot());
}

#[tokio::test]
async fn scenario_b_over_budget_inserts_summary() {
    let mut ctx = controller(memory_store(), 100, 2);
    for i in 0..6 {
        ctx.append_user(format!("Tell me fact number {} about the solar system please", i));
        ctx.append_assistant(&zorac_core::StreamingResult {
            text: format!("Fact {}: the planets orbit the sun in ellipses.", i),
            tokens: 0,
            duration: std::time::Duration::ZERO,
            tokens_per_second: 0.0,
            cancelled: false,
            error: None,
        })
        .await;
    }
    ctx.append_user("And one more?");
    let before = ctx.snapshot();
    let n = before.len();
    assert!(ctx.token_count() > 100);

    let client = ScriptedClient::new().with_completion(Ok("Six solar system facts.".to_string()));
    let result = ctx.check_budget(&client).await;

    assert!(result.was_compacted);
    assert!(is_summary(&ctx.messages()[1]));
    assert_eq!(ctx.messages()[0], before[0]);
    assert_eq!(&ctx.messages()[2..], &before[n - 2..]);
    assert_eq!(ctx.len(), 4);

    let request = client.requests.lock()[0].clone();
    assert!(!request.stream);
    assert!(request.messages[1].content.contains("USER: Tell me fact number 0"));
}

#[tokio::test]
async fn scenario_c_summarizer_connection_failure_falls_back() {
    let mut ctx = controller(memory_store(), 100_000, 2);
    for i in 0..4 {
        ctx.append_user(format!("question {}", i));
        ctx.append_user(format!("follow-up {}", i));
    }
    let before = ctx.snapshot();
    let n = before.len();

    let client = ScriptedClient::new()
        .with_completion(Err(ZoracError::connection_to("refused", "http://localhost:8000/v1")));
    let result = ctx.force_summarize(&client).await;

    assert!(result.used_fallback());
    let mut expected = vec![before[0].clone()];
    expected.extend_from_slice(&before[n - 2..]);
    assert_eq!(ctx.messages(), expected.as_slice());
    assert_eq!(ctx.current_summary(), None);
}

#[tokio::test]
async fn cancelled_generation_leaves_conversation_untouched() {
    let store = memory_store();
    let mut ctx = controller(store.clone(), 100_000, 6);
    ctx.append_user("write a long story");
    let before = ctx.snapshot();

    let client = Arc::new(ScriptedClient::new().with_stream(vec![
        Ok(StreamChunk::content("Once upon")),
        Ok(StreamChunk::content(" a time")),
    ]));
    let coordinator = StreamCoordinator::new(client, accountant());
    let generation_handle = coordinator.begin();
    assert!(coordinator.cancel_active());

    let result = coordinator
        .run_registered(generation_handle, ctx.snapshot(), &generation(), &SilentRenderer)
        .await;
    assert!(result.cancelled);

    assert_eq!(ctx.append_assistant(&result).await, AppendOutcome::Discarded);
    assert_eq!(ctx.messages(), before.as_slice());
    assert_eq!(store.save_count(), 0);
}

#[tokio::test]
async fn failed_generation_is_not_appended() {
    let mut ctx = controller(memory_store(), 100_000, 6);
    ctx.append_user("hello?");

    let client = Arc::new(ScriptedClient::new());
    let coordinator = StreamCoordinator::new(client, accountant());
    let result = coordinator
        .run(ctx.snapshot(), &generation(), &SilentRenderer)
        .await;

    assert!(result.error.as_ref().is_some_and(ZoracError::is_connection));
    assert_eq!(ctx.append_assistant(&result).await, AppendOutcome::Discarded);
    assert_eq!(ctx.messages().last(), Some(&Message::user("hello?")));
}
