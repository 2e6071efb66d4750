//! Key-value persistence for the cycle configuration and counter.
//!
//! Backends implement [`KeyValueStore`]; [`CyclePersistence`] layers the
//! cycle-specific keys and the never-fail semantics on top.

mod json_file;
mod memory;
mod persistence;

use anyhow::Result;
use async_trait::async_trait;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use persistence::CyclePersistence;

pub const PHASE_CONFIG_KEY: &str = "focuscycle.phaseConfig";
pub const COMPLETED_CYCLES_KEY: &str = "focuscycle.completedCycles";

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;
}
