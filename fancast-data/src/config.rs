// config.rs
//
// Copyright 2026 Fancast contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Runtime settings of the ingester.
//!
//! Settings live in a JSON file. Every key is optional, missing ones take
//! their default. Lookup order for the file is: the explicit path, then
//! `$FANCAST_CONFIG`, then `config.json` in the XDG config directory. When
//! none of these exist the defaults are used as-is.

use serde::{Deserialize, Serialize};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::DataError;

const XDG_PREFIX: &str = "fancast";
const CONFIG_FILE: &str = "config.json";
const DATABASE_FILE: &str = "fancast.db";

/// Environment variable pointing to the config file.
pub const CONFIG_ENV: &str = "FANCAST_CONFIG";
/// Environment variable overriding the database path.
pub const DATABASE_ENV: &str = "FANCAST_DATABASE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Ingester settings.
pub struct Config {
    /// Path of the sqlite database. `None` means the XDG data directory.
    pub database: Option<PathBuf>,
    /// Timeout of a single feed request, in seconds.
    pub request_timeout_secs: u64,
    /// How many urls may wait in the ingest queue.
    pub queue_capacity: usize,
    /// Minutes between two sweeps for due feeds in `cron` mode.
    pub sweep_interval_minutes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: None,
            request_timeout_secs: 10,
            queue_capacity: 5,
            sweep_interval_minutes: 60,
        }
    }
}

impl Config {
    /// Load the settings, honouring the environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Config, DataError> {
        Config::load_with(path, |key| std::env::var(key).ok())
    }

    fn load_with<F>(path: Option<&Path>, env: F) -> Result<Config, DataError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match path {
            Some(p) => Some(p.to_path_buf()),
            None => env(CONFIG_ENV).map(PathBuf::from).or_else(default_config_file),
        };

        let mut config = match file {
            Some(ref f) => Config::from_file(f)?,
            None => {
                debug!("No config file found, using defaults");
                Config::default()
            }
        };

        if let Some(db) = env(DATABASE_ENV) {
            config.database = Some(PathBuf::from(db));
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse the settings stored at `path`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config, DataError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|err| DataError::Config(format!("{}: {}", path.display(), err)))?;
        let config = serde_json::from_str(&content)
            .map_err(|err| DataError::Config(format!("{}: {}", path.display(), err)))?;

        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> Result<(), DataError> {
        if self.request_timeout_secs == 0 {
            return Err(DataError::Config(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.sweep_interval_minutes == 0 {
            return Err(DataError::Config(
                "sweep_interval_minutes must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Where the database lives, creating the XDG data directory if that is
    /// the one in use.
    pub fn database_path(&self) -> Result<PathBuf, DataError> {
        if let Some(ref db) = self.database {
            return Ok(db.clone());
        }

        xdg::BaseDirectories::with_prefix(XDG_PREFIX)
            .map_err(|err| DataError::Config(err.to_string()))?
            .place_data_file(DATABASE_FILE)
            .map_err(|err| DataError::Config(format!("Cannot create data directory: {err}")))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_minutes * 60)
    }
}

fn default_config_file() -> Option<PathBuf> {
    xdg::BaseDirectories::with_prefix(XDG_PREFIX)
        .ok()?
        .find_config_file(CONFIG_FILE)
}
