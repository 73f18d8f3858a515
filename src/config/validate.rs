// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{ForgeqError, Result};
use crate::types::StoreBackend;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::ForgeqError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.scheduler, raw.store, raw.worker))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_scheduler(cfg)?;
    validate_store(cfg)?;
    validate_worker(cfg)?;
    Ok(())
}

fn validate_scheduler(cfg: &RawConfigFile) -> Result<()> {
    if cfg.scheduler.max_concurrent == 0 {
        return Err(ForgeqError::ConfigError(
            "[scheduler].max_concurrent must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.scheduler.max_retained == 0 {
        return Err(ForgeqError::ConfigError(
            "[scheduler].max_retained must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_store(cfg: &RawConfigFile) -> Result<()> {
    let store = &cfg.store;

    if store.backend == StoreBackend::File && store.dir.as_os_str().is_empty() {
        return Err(ForgeqError::ConfigError(
            "[store].dir must not be empty when backend = \"file\"".to_string(),
        ));
    }

    for (field, key) in [("jobs_key", &store.jobs_key), ("active_key", &store.active_key)] {
        if key.trim().is_empty() {
            return Err(ForgeqError::ConfigError(format!(
                "[store].{field} must not be empty"
            )));
        }
        if key.contains(['/', '\\']) {
            return Err(ForgeqError::ConfigError(format!(
                "[store].{field} must not contain path separators (got '{key}')"
            )));
        }
    }

    if store.jobs_key == store.active_key {
        return Err(ForgeqError::ConfigError(format!(
            "[store].jobs_key and [store].active_key must differ (both '{}')",
            store.jobs_key
        )));
    }

    Ok(())
}

fn validate_worker(cfg: &RawConfigFile) -> Result<()> {
    if let Some(cmd) = &cfg.worker.cmd {
        if cmd.trim().is_empty() {
            return Err(ForgeqError::ConfigError(
                "[worker].cmd must not be blank when set".to_string(),
            ));
        }
    }
    Ok(())
}
