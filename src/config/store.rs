use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Key-value settings persisted to a TOML file.
///
/// Every `set` rewrites the file before returning, so a value read back by a
/// fresh store (or after a restart) is always the last one written.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    values: toml::Table,
}

impl SettingsStore {
    /// Opens the store at `path`. A missing file is an empty store; an
    /// unreadable one is logged and treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {:?}", path))?;
            match content.parse::<toml::Table>() {
                Ok(values) => values,
                Err(e) => {
                    warn!("ignoring unparsable settings file {:?}: {}", path, e);
                    toml::Table::new()
                }
            }
        } else {
            toml::Table::new()
        };

        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let Some(value) = self.values.get(key) else {
            return default;
        };

        match value.clone().try_into::<T>() {
            Ok(value) => value,
            Err(e) => {
                warn!("ignoring stored value for '{}': {}", key, e);
                default
            }
        }
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<()> {
        let value = toml::Value::try_from(value)
            .with_context(|| format!("Failed to encode setting '{}'", key))?;
        debug!("setting {} = {}", key, value);
        self.values.insert(key.to_string(), value);
        self.flush()
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(&self.values)?;
        let tmp = self.path.with_extension("toml.tmp");
        std::fs::write(&tmp, content)
            .with_context(|| format!("Failed to write settings to {:?}", tmp))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace settings file {:?}", self.path))?;

        Ok(())
    }
}
