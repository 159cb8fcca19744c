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

use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use config::{Config, Environment, File};
use duration_string::DurationString;
use serde::Deserialize;
use tracing::info;

use crate::lighting::{self, FixtureProfile};

mod controller;
mod dmx;
mod error;
mod profile;
mod show;
pub mod store;

pub use self::controller::Controller;
pub use self::dmx::{Dmx, Input, Output};
pub use self::error::{ConfigError, StoreError};
pub use self::store::Store;

/// How long to hold off further changes after a mode or operation change.
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(200);

/// The stage loaded when none is named.
pub const DEFAULT_STAGE: &str = "default";

/// The prefix for environment overrides, e.g. FOLLOWSPOT_DMX__OLA_PORT.
const ENV_PREFIX: &str = "FOLLOWSPOT";

/// A YAML representation of the main configuration file.
#[derive(Deserialize, Clone, Debug)]
pub struct Followspot {
    /// The DMX configuration.
    dmx: Dmx,

    /// The handheld controller configuration.
    #[serde(default, alias = "joystick")]
    controller: Controller,

    /// The settle delay after mode changes.
    settle: Option<String>,

    /// The directory of fixture profiles.
    profiles: PathBuf,

    /// The shows file.
    shows: PathBuf,

    /// The directory holding stored scenes and stages.
    data: PathBuf,

    /// The stage to calibrate in stage edit.
    stage: Option<String>,
}

impl Followspot {
    /// Parses the main configuration file, applying environment overrides.
    pub fn deserialize(path: &Path) -> Result<Followspot, ConfigError> {
        let mut config = Config::builder()
            .add_source(File::from(path))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Followspot>()?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.dmx.input_mut().resolve(base);
        config.controller.resolve(base);
        config.profiles = resolve(base, &config.profiles);
        config.shows = resolve(base, &config.shows);
        config.data = resolve(base, &config.data);
        Ok(config)
    }

    /// Gets the DMX configuration.
    pub fn dmx(&self) -> &Dmx {
        &self.dmx
    }

    /// Gets the controller configuration.
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Gets the settle delay.
    pub fn settle(&self) -> Result<Duration, Box<dyn Error>> {
        match &self.settle {
            Some(settle) => Ok(DurationString::from_string(settle.clone())?.into()),
            None => Ok(DEFAULT_SETTLE),
        }
    }

    /// Gets the profiles directory.
    pub fn profiles(&self) -> &Path {
        &self.profiles
    }

    /// Gets the shows file.
    pub fn shows(&self) -> &Path {
        &self.shows
    }

    /// Gets the data directory.
    pub fn data(&self) -> &Path {
        &self.data
    }

    /// Gets the stage name.
    pub fn stage(&self) -> &str {
        self.stage.as_deref().unwrap_or(DEFAULT_STAGE)
    }
}

/// A fully loaded and validated configuration.
#[derive(Debug, Clone)]
pub struct Rig {
    config: Followspot,
    settle: Duration,
    profiles: HashMap<String, Arc<FixtureProfile>>,
    shows: BTreeMap<String, show::Show>,
}

impl Rig {
    /// Gets the main configuration.
    pub fn config(&self) -> &Followspot {
        &self.config
    }

    /// Gets the settle delay.
    pub fn settle(&self) -> Duration {
        self.settle
    }

    /// Gets the store over the data directory.
    pub fn store(&self) -> Store {
        Store::new(self.config.data())
    }

    /// Gets the show names, sorted.
    pub fn show_names(&self) -> Vec<&str> {
        self.shows.keys().map(String::as_str).collect()
    }

    /// Gets the profile names, sorted.
    pub fn profile_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort();
        names
    }

    /// Builds the named show, or the first show if none is named.
    pub fn show(&self, name: Option<&str>) -> Result<lighting::Show, ConfigError> {
        let (name, config) = match name {
            Some(name) => self
                .shows
                .get_key_value(name)
                .ok_or_else(|| ConfigError::UnknownShow(name.to_string()))?,
            None => self
                .shows
                .iter()
                .next()
                .ok_or_else(|| ConfigError::UnknownShow("(none)".to_string()))?,
        };
        info!(show = name, "Loading show.");
        Ok(config.to_show(name, &self.profiles))
    }
}

/// Loads the main configuration along with the profiles and shows it points to.
/// Every problem found is reported at once.
pub fn load(path: &Path) -> Result<Rig, ConfigError> {
    info!(path = path.display().to_string(), "Reading configuration.");
    let config = Followspot::deserialize(path)?;
    let profiles = profile::load_profiles(config.profiles())?;
    let shows = show::load_shows(config.shows())?;

    let mut problems = Vec::new();
    let settle = match config.settle() {
        Ok(settle) => settle,
        Err(e) => {
            problems.push(format!("settle: {}", e));
            DEFAULT_SETTLE
        }
    };

    let control_id = config.dmx().input().id();
    if control_id < 1 || usize::from(control_id) + 1 >= crate::dmx::frame::UNIVERSE_SIZE {
        problems.push(format!(
            "dmx input id {}: the control channels must fit within the universe",
            control_id
        ));
    }

    for (name, profile) in profiles.iter() {
        problems.extend(profile.validate(name));
    }
    if shows.is_empty() {
        problems.push(format!("{}: no shows defined", config.shows().display()));
    }
    for (name, show) in shows.iter() {
        problems.extend(show.validate(name, &profiles, control_id));
    }

    if !problems.is_empty() {
        return Err(ConfigError::Invalid(problems));
    }

    Ok(Rig {
        settle,
        profiles: profiles
            .iter()
            .map(|(name, profile)| (name.clone(), Arc::new(profile.to_profile(name))))
            .collect(),
        shows,
        config,
    })
}

/// Resolves a configured path against the directory of the configuration file.
fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
