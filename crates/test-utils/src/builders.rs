#![allow(dead_code)]

use std::path::PathBuf;

use forgeq::config::{ConfigFile, RawConfigFile};
use forgeq::scheduler::{Scheduler, SchedulerOptions};
use forgeq::events::{EventNotifier, NullNotifier};
use forgeq::store::{MemoryStore, SnapshotStore};
use forgeq::types::StoreBackend;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn max_concurrent(mut self, n: usize) -> Self {
        self.config.scheduler.max_concurrent = n;
        self
    }

    pub fn max_retained(mut self, n: usize) -> Self {
        self.config.scheduler.max_retained = n;
        self
    }

    pub fn memory_store(mut self) -> Self {
        self.config.store.backend = StoreBackend::Memory;
        self
    }

    pub fn file_store(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.store.backend = StoreBackend::File;
        self.config.store.dir = dir.into();
        self
    }

    pub fn worker_cmd(mut self, cmd: &str) -> Self {
        self.config.worker.cmd = Some(cmd.to_string());
        self
    }

    /// Raw form, for exercising validation failures.
    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Invalid config built in test")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for a `Scheduler` wired to test doubles.
///
/// Defaults: capacity 2, retention 10, fresh `MemoryStore`, `NullNotifier`.
pub struct SchedulerBuilder {
    options: SchedulerOptions,
    store: Box<dyn SnapshotStore>,
    notifier: Box<dyn EventNotifier>,
}

impl SchedulerBuilder {
    pub fn new() -> Self {
        Self {
            options: SchedulerOptions::default(),
            store: Box::new(MemoryStore::new()),
            notifier: Box::new(NullNotifier),
        }
    }

    pub fn max_concurrent(mut self, n: usize) -> Self {
        self.options.max_concurrent = n;
        self
    }

    pub fn max_retained(mut self, n: usize) -> Self {
        self.options.max_retained = n;
        self
    }

    pub fn store(mut self, store: impl SnapshotStore + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    pub fn notifier(mut self, notifier: impl EventNotifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    /// Empty scheduler; the store is not read.
    pub fn build(self) -> Scheduler {
        Scheduler::new(self.options, self.store, self.notifier)
    }

    /// Scheduler hydrated from whatever the store holds.
    pub fn restore(self) -> Scheduler {
        Scheduler::restore(self.options, self.store, self.notifier)
    }
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
