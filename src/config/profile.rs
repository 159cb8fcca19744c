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

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::lighting::profile::{Channel, FixtureProfile, Rotation};

use super::error::ConfigError;

/// A YAML representation of a fixture model.
#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "kebab-case")]
pub struct Profile {
    /// Full horizontal travel in degrees.
    h_range: f64,

    /// Full vertical travel in degrees.
    v_range: f64,

    /// Horizontal home axis offset, in coarse units.
    #[serde(default)]
    hx: f64,

    /// Vertical home axis offset, in coarse units.
    #[serde(default)]
    vz: f64,

    #[serde(default)]
    h_rotation: Rotation,

    #[serde(default)]
    v_rotation: Rotation,

    /// Channel names in patch order.
    channels: Vec<String>,

    /// Color wheel positions by color name.
    #[serde(default, alias = "color_values")]
    color_values: HashMap<String, u8>,
}

impl Profile {
    /// Gets the number of channels the profile occupies.
    pub fn footprint(&self) -> usize {
        self.channels.len()
    }

    /// Returns every problem with the profile.
    pub fn validate(&self, name: &str) -> Vec<String> {
        let mut problems = Vec::new();
        if self.h_range <= 0.0 || self.v_range <= 0.0 {
            problems.push(format!("profile {}: h-range and v-range must be positive", name));
        }
        if !(0.0..=255.0).contains(&self.hx) || !(0.0..=255.0).contains(&self.vz) {
            problems.push(format!("profile {}: hx and vz must be within [0, 255]", name));
        }
        if self.channels.is_empty() {
            problems.push(format!("profile {}: no channels", name));
        }

        let mut seen = HashSet::new();
        for channel in self.channels.iter() {
            if !seen.insert(channel.as_str()) {
                problems.push(format!("profile {}: duplicate channel {}", name, channel));
            }
        }

        let has = |channel: &str| seen.contains(channel);
        let wide = ["h-coarse", "h-fine", "v-coarse", "v-fine"];
        if wide.iter().any(|c| has(c)) && !wide.iter().all(|c| has(c)) {
            problems.push(format!(
                "profile {}: 16-bit position needs all of {}",
                name,
                wide.join(", ")
            ));
        }
        if has("h") != has("v") {
            problems.push(format!("profile {}: 8-bit position needs both h and v", name));
        }
        problems
    }

    /// Converts the configuration into a runtime profile.
    pub fn to_profile(&self, name: &str) -> FixtureProfile {
        FixtureProfile::new(
            name,
            self.h_range,
            self.v_range,
            self.hx,
            self.vz,
            self.h_rotation,
            self.v_rotation,
            self.channels
                .iter()
                .map(|channel| Channel::from(channel.as_str()))
                .collect(),
            self.color_values.clone(),
        )
    }
}

/// Reads every *.yml file in the directory and merges the profiles they define.
pub fn load_profiles(dir: &Path) -> Result<BTreeMap<String, Profile>, ConfigError> {
    let io_error = |source| ConfigError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = fs::read_dir(dir)
        .map_err(io_error)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_error)?;
    paths.retain(|path| path.extension().is_some_and(|ext| ext == "yml" || ext == "yaml"));
    paths.sort();

    let mut profiles = BTreeMap::new();
    for path in paths {
        info!(path = path.display().to_string(), "Reading fixture profiles.");
        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let parsed: BTreeMap<String, Profile> =
            serde_yml::from_str(&contents).map_err(|source| ConfigError::Yaml {
                path: path.clone(),
                source,
            })?;
        for (name, profile) in parsed {
            if profiles.insert(name.clone(), profile).is_some() {
                warn!(
                    profile = name,
                    path = path.display().to_string(),
                    "Profile redefined, the later definition wins."
                );
            }
        }
    }
    Ok(profiles)
}
