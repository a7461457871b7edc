//! Repository implementations over a [`KeyValueStore`](super::storage::KeyValueStore)

mod directory;
mod session;

pub use directory::{KvDirectory, CORRUPT_USERS_KEY, USERS_KEY};
pub use session::{KvSessionStore, SESSION_KEY};
