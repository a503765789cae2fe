//! Tests for utility functions

use throttled_dispatch::util::{TaskId, TaskIdGenerator};

#[test]
fn test_task_ids_are_unique_across_threads() {
    let ids = std::sync::Arc::new(TaskIdGenerator::new());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let ids = std::sync::Arc::clone(&ids);
            std::thread::spawn(move || (0..250).map(|_| ids.next_id()).collect::<Vec<TaskId>>())
        })
        .collect();

    let mut all: Vec<TaskId> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    all.sort_unstable();
    all.dedup();
    assert_eq!(all.len(), 1000);
    assert_eq!(all.first(), Some(&1));
    assert_eq!(all.last(), Some(&1000));
}

#[test]
fn test_init_tracing_is_idempotent() {
    throttled_dispatch::util::init_tracing();
    throttled_dispatch::util::init_tracing();
}
