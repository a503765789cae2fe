//! Tests for event sinks

use throttled_dispatch::core::{
    DispatchEvent, EventKind, EventSink, InMemoryEventSink, TracingEventSink,
};

#[tokio::test]
async fn test_in_memory_event_sink() {
    let sink = InMemoryEventSink::new(10);

    sink.record(DispatchEvent::now(1, EventKind::Queued, 0));
    sink.record(DispatchEvent::now(1, EventKind::Dispatched, 1));
    assert_eq!(sink.events().len(), 2);

    let events = sink.events();
    assert_eq!(events[0].task_id, 1);
    assert_eq!(events[0].kind, EventKind::Queued);
    assert_eq!(events[1].in_flight, 1);
    assert!(events[1].at >= events[0].at);
}

#[tokio::test]
async fn test_event_sink_overflow() {
    let sink = InMemoryEventSink::new(2);

    sink.record(DispatchEvent::now(1, EventKind::Queued, 0));
    sink.record(DispatchEvent::now(2, EventKind::Queued, 0));
    sink.record(DispatchEvent::now(3, EventKind::Queued, 0));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].task_id, 2); // First one popped
    assert_eq!(events[1].task_id, 3);
}

#[tokio::test]
async fn test_tracing_sink_accepts_events() {
    throttled_dispatch::util::init_tracing();
    TracingEventSink.record(DispatchEvent::now(5, EventKind::Cancelled, 0));
}
