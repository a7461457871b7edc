//! Infrastructure layer - external concerns

pub mod repositories;
pub mod storage;

pub use repositories::{KvDirectory, KvSessionStore};
pub use storage::{FileStore, InMemoryStore, KeyValueStore};
