//! Runtime adapters hosting the dispatch loop and task execution.

pub mod tokio_spawner;

pub use tokio_spawner::TokioSpawner;
