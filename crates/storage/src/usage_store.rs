// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-provider rate-limit usage persistence.
//!
//! One JSON file per provider under the user config directory:
//! `{"windows": {"<window_id>": {"timestamps": ["<iso8601>", ...]}}}`.
//! Writes are whole-file under an advisory file lock so concurrent
//! processes sharing the same config directory coordinate safely.

use crate::StoreError;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;

/// Dispatch timestamps recorded for one window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowUsage {
    pub timestamps: Vec<DateTime<Utc>>,
}

/// All window usage for one provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderUsage {
    pub windows: BTreeMap<String, WindowUsage>,
}

/// Durable usage store rooted at one directory.
#[derive(Debug, Clone)]
pub struct UsageStore {
    dir: PathBuf,
}

impl UsageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, provider: &str) -> PathBuf {
        self.dir.join(format!("{}.json", provider))
    }

    fn lock_path_for(&self, provider: &str) -> PathBuf {
        self.dir.join(format!("{}.lock", provider))
    }

    /// Load a provider's usage. Missing or corrupt files yield empty usage
    /// (corrupt with a warning): usage data is advisory, never fatal.
    pub fn load(&self, provider: &str) -> ProviderUsage {
        let path = self.path_for(provider);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return ProviderUsage::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read usage file");
                return ProviderUsage::default();
            }
        };
        match serde_json::from_str(&json) {
            Ok(usage) => usage,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "corrupt usage file, starting empty");
                ProviderUsage::default()
            }
        }
    }

    /// Persist a provider's usage under its file lock.
    pub fn save(&self, provider: &str, usage: &ProviderUsage) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;

        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path_for(provider))?;
        lock_file.lock_exclusive()?;

        let result = self.write_locked(provider, usage);

        // Errors on unlock are ignored; the lock dies with the handle anyway.
        let _ = fs2::FileExt::unlock(&lock_file);
        result
    }

    fn write_locked(&self, provider: &str, usage: &ProviderUsage) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(usage)?;
        let path = self.path_for(provider);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Providers with usage files on disk.
    pub fn providers(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };
        let mut providers: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|x| x == "json"))
            .filter_map(|p| {
                p.file_stem()
                    .map(|stem| stem.to_string_lossy().to_string())
            })
            .collect();
        providers.sort();
        providers
    }
}

#[cfg(test)]
#[path = "usage_store_tests.rs"]
mod tests;
