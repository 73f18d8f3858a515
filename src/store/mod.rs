// src/store/mod.rs

//! Snapshot persistence surface.
//!
//! The scheduler writes its serialized state through a [`SnapshotStore`]
//! after every mutation and reads it back once at startup. Errors are
//! reported to the caller, but the scheduler itself treats them as
//! non-fatal (durability degrades, scheduling stays correct).
//!
//! - [`memory`] keeps values in process memory (tests, `backend = "memory"`).
//! - [`file`] keeps one file per key in a directory.
//! - [`lock`] marks a file store as owned by a running `forgeq run`.

use std::fmt::Debug;

use anyhow::Result;

use crate::config::StoreSection;
use crate::types::StoreBackend;

pub mod file;
pub mod lock;
pub mod memory;

pub use file::FileStore;
pub use lock::{ensure_unlocked, RunLock};
pub use memory::MemoryStore;

/// Abstract key-value persistence interface.
pub trait SnapshotStore: Send + Debug {
    /// Read the value stored under `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Build the store described by the `[store]` config section.
pub fn open_store(section: &StoreSection) -> Box<dyn SnapshotStore> {
    match section.backend {
        StoreBackend::File => Box::new(FileStore::new(section.dir.clone())),
        StoreBackend::Memory => Box::new(MemoryStore::new()),
    }
}
