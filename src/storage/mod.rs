// Durable key-value storage
// Author: kelexine (https://github.com/kelexine)
//
// The governor mirrors its daily counter here so a restart inside the same
// rolling day keeps the quota. Callers treat every failure as "nothing stored".

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::Result;

/// String-valued key-value storage that outlives the process.
pub trait KeyValueStore: Send + Sync {
    /// Returns `Ok(None)` when the key has never been written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;
}
