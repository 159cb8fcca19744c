// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use std::path::PathBuf;

/// Typed error for config load/parse failures so callers can distinguish
/// e.g. file-not-found from parse errors without string matching.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config load/parse error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Unable to parse {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        source: serde_yml::Error,
    },

    #[error("Unable to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration:\n  {}", .0.join("\n  "))]
    Invalid(Vec<String>),

    #[error("No show named {0}")]
    UnknownShow(String),
}

/// Errors reading or writing the scene and stage store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Store data error in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        source: serde_yml::Error,
    },
}
