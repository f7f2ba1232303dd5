//! Integration tests for the streaming translator
//!
//! Every invocation must end with exactly one terminal marker: `Done` after
//! a clean upstream exhaustion, or a single user-safe `Error` for any
//! failure kind, with no fragments after it.

use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;

use termbridge_server::gateway::{ChatModel, GatewayError};
use termbridge_server::testing::MockChatModel;
use termbridge_server::translate::{
    StreamEvent, StreamTranslator, TranslationDirection, user_safe_message,
};

fn translator_with(mock: MockChatModel, timeout: Duration) -> StreamTranslator {
    let gateway: Arc<dyn ChatModel> = Arc::new(mock);
    StreamTranslator::new(gateway, timeout)
}

async fn collect(translator: &StreamTranslator) -> Vec<StreamEvent> {
    translator
        .translate(
            "we need a smart recommendation feature".to_string(),
            TranslationDirection::ProductToDev,
        )
        .collect()
        .await
}

fn terminal_count(events: &[StreamEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, StreamEvent::Done | StreamEvent::Error(_)))
        .count()
}

#[tokio::test]
async fn successful_stream_ends_with_single_done() {
    let translator = translator_with(
        MockChatModel::new().with_deltas(&["设计", "一个", "推荐系统"]),
        Duration::from_secs(5),
    );

    let events = collect(&translator).await;

    assert_eq!(
        events,
        vec![
            StreamEvent::Fragment("设计".to_string()),
            StreamEvent::Fragment("一个".to_string()),
            StreamEvent::Fragment("推荐系统".to_string()),
            StreamEvent::Done,
        ]
    );
    assert_eq!(terminal_count(&events), 1);
}

#[tokio::test]
async fn empty_stream_still_emits_done() {
    let translator = translator_with(MockChatModel::new(), Duration::from_secs(5));

    let events = collect(&translator).await;
    assert_eq!(events, vec![StreamEvent::Done]);
}

#[tokio::test]
async fn open_failure_yields_single_error_and_no_fragments() {
    for error in [
        GatewayError::Auth("401".to_string()),
        GatewayError::RateLimited("429".to_string()),
        GatewayError::Connection("refused".to_string()),
        GatewayError::Protocol("500".to_string()),
        GatewayError::Unknown("??".to_string()),
    ] {
        let expected = user_safe_message(&error).to_string();
        let translator = translator_with(
            MockChatModel::new().with_open_error(error),
            Duration::from_secs(5),
        );

        let events = collect(&translator).await;
        assert_eq!(events, vec![StreamEvent::Error(expected)]);
    }
}

#[tokio::test]
async fn mid_stream_failure_keeps_fragments_then_single_error() {
    let translator = translator_with(
        MockChatModel::new()
            .with_deltas(&["partial ", "output"])
            .with_stream_error(GatewayError::Connection("reset".to_string())),
        Duration::from_secs(5),
    );

    let events = collect(&translator).await;

    assert_eq!(events.len(), 3);
    assert_eq!(events[0], StreamEvent::Fragment("partial ".to_string()));
    assert_eq!(events[1], StreamEvent::Fragment("output".to_string()));
    assert!(matches!(events.last(), Some(StreamEvent::Error(_))));
    assert_eq!(terminal_count(&events), 1);
}

#[tokio::test]
async fn slow_stream_open_times_out_with_user_safe_message() {
    let translator = translator_with(
        MockChatModel::new()
            .with_open_delay(Duration::from_millis(300))
            .with_deltas(&["never seen"]),
        Duration::from_millis(50),
    );

    let events = collect(&translator).await;

    assert_eq!(
        events,
        vec![StreamEvent::Error(
            user_safe_message(&GatewayError::Timeout).to_string()
        )]
    );
}

#[tokio::test]
async fn error_marker_never_contains_vendor_text() {
    let translator = translator_with(
        MockChatModel::new().with_open_error(GatewayError::Protocol(
            "upstream returned 502: internal-vendor-diagnostics".to_string(),
        )),
        Duration::from_secs(5),
    );

    let events = collect(&translator).await;
    match &events[0] {
        StreamEvent::Error(message) => {
            assert!(!message.contains("internal-vendor-diagnostics"));
            assert!(!message.contains("502"));
        }
        other => panic!("expected error marker, got {other:?}"),
    }
}

#[tokio::test]
async fn dropping_the_stream_is_clean() {
    // Consume only the first event, then drop; the pump task must not panic
    // or wedge the runtime.
    let translator = translator_with(
        MockChatModel::new().with_deltas(&["a", "b", "c", "d"]),
        Duration::from_secs(5),
    );

    let mut stream = translator.translate(
        "we need a smart recommendation feature".to_string(),
        TranslationDirection::ProductToDev,
    );
    let first = stream.next().await;
    assert_eq!(first, Some(StreamEvent::Fragment("a".to_string())));
    drop(stream);

    tokio::time::sleep(Duration::from_millis(20)).await;
}
