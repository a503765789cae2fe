//! Tests for builder modules

use std::collections::HashMap;
use std::time::Duration;

use throttled_dispatch::builders::{build_dispatchers, DispatcherBuilder};
use throttled_dispatch::config::{DispatcherConfig, SchedulerConfig};
use throttled_dispatch::core::{DispatchLimits, EventKind, InMemoryEventSink};
use throttled_dispatch::runtime::TokioSpawner;

#[test]
fn test_builder_overrides() {
    let builder = DispatcherBuilder::new(DispatchLimits::new(1, 1))
        .with_max_concurrent(4)
        .with_requests_per_second(20)
        .with_window(Duration::from_millis(500));

    let limits = builder.limits();
    assert_eq!(limits.max_concurrent, 4);
    assert_eq!(limits.requests_per_second, 20);
    assert_eq!(limits.window, Duration::from_millis(500));
}

#[test]
fn test_builder_from_config() {
    let builder = DispatcherBuilder::from_config(&DispatcherConfig::default());
    assert_eq!(builder.limits(), DispatcherConfig::default().limits());
}

#[tokio::test]
async fn test_builder_rejects_zero_rate() {
    let result = DispatcherBuilder::new(DispatchLimits::new(2, 5))
        .with_requests_per_second(0)
        .build();
    assert!(result.is_err());
}

#[tokio::test]
async fn test_builder_attaches_event_sink() {
    let sink = InMemoryEventSink::new(16);
    let dispatcher = DispatcherBuilder::new(DispatchLimits::new(1, 10))
        .with_event_sink(sink.clone())
        .build()
        .unwrap();

    dispatcher
        .submit(|| async { Ok::<_, String>(()) })
        .await
        .unwrap();

    let kinds: Vec<_> = sink.events().into_iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![EventKind::Queued, EventKind::Dispatched, EventKind::Succeeded]
    );
}

#[tokio::test]
async fn test_build_dispatchers_by_name() {
    let mut dispatchers = HashMap::new();
    dispatchers.insert("fetch".to_string(), DispatcherConfig::default());
    dispatchers.insert(
        "persist".to_string(),
        DispatcherConfig {
            max_concurrent: 1,
            requests_per_second: 3,
            window_ms: 1000,
        },
    );
    let cfg = SchedulerConfig { dispatchers };

    let built = build_dispatchers(&cfg, &TokioSpawner::current().unwrap()).unwrap();
    assert_eq!(built.len(), 2);
    assert_eq!(built["persist"].limits().requests_per_second, 3);

    let value = built["fetch"]
        .submit(|| async { Ok::<_, String>(41 + 1) })
        .await
        .unwrap();
    assert_eq!(value, 42);
}

#[tokio::test]
async fn test_build_dispatchers_rejects_invalid() {
    let result = build_dispatchers(&SchedulerConfig::default(), &TokioSpawner::current().unwrap());
    assert!(result.is_err());
}
