// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::types::StoreBackend;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [scheduler]
/// max_concurrent = 2
/// max_retained = 10
///
/// [store]
/// backend = "file"
/// dir = ".forgeq"
///
/// [worker]
/// cmd = "python optimize.py"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub scheduler: SchedulerSection,

    #[serde(default)]
    pub store: StoreSection,

    #[serde(default)]
    pub worker: WorkerSection,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub scheduler: SchedulerSection,
    pub store: StoreSection,
    pub worker: WorkerSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        scheduler: SchedulerSection,
        store: StoreSection,
        worker: WorkerSection,
    ) -> Self {
        Self {
            scheduler,
            store,
            worker,
        }
    }
}

/// `[scheduler]` section: capacity bounds.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSection {
    /// Cap on simultaneously running jobs.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Cap on retained job records of any status.
    #[serde(default = "default_max_retained")]
    pub max_retained: usize,
}

fn default_max_concurrent() -> usize {
    2
}

fn default_max_retained() -> usize {
    10
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            max_retained: default_max_retained(),
        }
    }
}

/// `[store]` section: where the scheduler snapshot lives.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Directory for the `file` backend. Relative paths resolve against the
    /// working directory.
    #[serde(default = "default_store_dir")]
    pub dir: PathBuf,

    /// Key holding the serialized job list.
    #[serde(default = "default_jobs_key")]
    pub jobs_key: String,

    /// Key holding the focused job's record id.
    #[serde(default = "default_active_key")]
    pub active_key: String,
}

fn default_store_dir() -> PathBuf {
    PathBuf::from(".forgeq")
}

fn default_jobs_key() -> String {
    "forgeq.jobs".to_string()
}

fn default_active_key() -> String {
    "forgeq.active".to_string()
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            dir: default_store_dir(),
            jobs_key: default_jobs_key(),
            active_key: default_active_key(),
        }
    }
}

/// `[worker]` section: the external command that performs a forge.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkerSection {
    /// Shell command run once per job that enters `running`.
    ///
    /// Only required by `forgeq run`.
    #[serde(default)]
    pub cmd: Option<String>,
}
