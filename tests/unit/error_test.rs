//! Tests for error types

use throttled_dispatch::core::{DispatchError, TaskError};

#[test]
fn test_invalid_config_error() {
    let err = DispatchError::InvalidConfig("max_concurrent must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: max_concurrent must be greater than 0"
    );
}

#[test]
fn test_no_runtime_error() {
    assert_eq!(format!("{}", DispatchError::NoRuntime), "no tokio runtime available");
}

#[test]
fn test_task_failure_display_wraps_original() {
    let err: TaskError<String> = TaskError::Failed("connection reset".to_string());
    assert_eq!(format!("{}", err), "task failed: connection reset");
    assert_eq!(err.into_failure(), Some("connection reset".to_string()));
}

#[test]
fn test_task_panic_and_cancel() {
    let panicked: TaskError<String> = TaskError::Panicked("index out of bounds".into());
    assert_eq!(format!("{}", panicked), "task panicked: index out of bounds");
    assert!(!panicked.is_cancelled());
    assert_eq!(panicked.into_failure(), None);

    let cancelled: TaskError<String> = TaskError::Cancelled;
    assert!(cancelled.is_cancelled());
}

#[test]
fn test_dispatch_error_converts_to_anyhow() {
    let result: throttled_dispatch::core::AppResult<()> =
        Err(DispatchError::NoRuntime.into());
    assert!(result.unwrap_err().to_string().contains("runtime"));
}
