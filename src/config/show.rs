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
use std::fs;
use std::path::Path;
use std::sync::Arc;

use glam::DVec3;
use serde::Deserialize;
use tracing::{info, warn};

use crate::dmx::frame::UNIVERSE_SIZE;
use crate::lighting::{self, group::ALL, show::mount_from_tags, FixtureProfile};

use super::error::ConfigError;
use super::profile::Profile;

/// The top level of the shows file.
#[derive(Deserialize, Clone, Debug)]
struct ShowFile {
    shows: BTreeMap<String, Show>,
}

/// A YAML representation of a show.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Show {
    /// Aspect names mapped to their tags.
    #[serde(default)]
    fixture_aspects: HashMap<String, Vec<String>>,

    /// Fixtures by name.
    #[serde(default)]
    fixtures: BTreeMap<String, Fixture>,

    /// Groups by name.
    #[serde(default)]
    fixture_groups: BTreeMap<String, Vec<String>>,
}

/// A YAML representation of a patched fixture.
#[derive(Deserialize, Clone, Debug)]
pub struct Fixture {
    /// The name of the fixture profile.
    profile: String,

    /// The first DMX channel.
    id: u16,

    /// The aspect describing how the fixture is hung.
    aspect: Option<String>,

    x: Option<f64>,
    y: Option<f64>,
    z: Option<f64>,

    /// The initial focus value.
    focus: Option<u8>,
}

impl Fixture {
    /// Creates a new fixture configuration.
    pub fn new(profile: &str, id: u16, aspect: Option<&str>, position: Option<DVec3>) -> Fixture {
        Fixture {
            profile: profile.to_string(),
            id,
            aspect: aspect.map(str::to_string),
            x: position.map(|p| p.x),
            y: position.map(|p| p.y),
            z: position.map(|p| p.z),
            focus: None,
        }
    }

    /// Gets the position, if every coordinate is given.
    pub fn position(&self) -> Option<DVec3> {
        match (self.x, self.y, self.z) {
            (Some(x), Some(y), Some(z)) => Some(DVec3::new(x, y, z)),
            _ => None,
        }
    }

    fn partially_located(&self) -> bool {
        let given = [self.x, self.y, self.z].iter().filter(|c| c.is_some()).count();
        given > 0 && given < 3
    }
}

impl Show {
    /// Creates a new show configuration.
    pub fn new(
        fixture_aspects: HashMap<String, Vec<String>>,
        fixtures: BTreeMap<String, Fixture>,
        fixture_groups: BTreeMap<String, Vec<String>>,
    ) -> Show {
        Show {
            fixture_aspects,
            fixtures,
            fixture_groups,
        }
    }

    /// Returns every problem with the show given the known profiles and the control channel.
    pub fn validate(
        &self,
        name: &str,
        profiles: &BTreeMap<String, Profile>,
        control_id: u16,
    ) -> Vec<String> {
        let mut problems = Vec::new();
        let control = usize::from(control_id)..=usize::from(control_id) + 2;

        for (fixture_name, fixture) in self.fixtures.iter() {
            let context = format!("show {}, fixture {}", name, fixture_name);
            match profiles.get(&fixture.profile) {
                None => problems.push(format!("{}: undefined profile {}", context, fixture.profile)),
                Some(profile) => {
                    let first = usize::from(fixture.id);
                    let last = first + profile.footprint().saturating_sub(1);
                    if first < 1 || last > UNIVERSE_SIZE {
                        problems.push(format!(
                            "{}: channels {}-{} leave the universe",
                            context, first, last
                        ));
                    }
                    if first <= *control.end() && *control.start() <= last {
                        problems.push(format!(
                            "{}: channels {}-{} overlap the control channels",
                            context, first, last
                        ));
                    }
                }
            }
            if let Some(aspect) = &fixture.aspect {
                if !self.fixture_aspects.contains_key(aspect) {
                    problems.push(format!("{}: undefined aspect {}", context, aspect));
                }
            }
            if fixture.partially_located() {
                problems.push(format!("{}: position needs x, y and z", context));
            }
        }

        for (group, members) in self.fixture_groups.iter() {
            if group == ALL {
                problems.push(format!("show {}: group name {} is reserved", name, ALL));
            }
            for member in members {
                if !self.fixtures.contains_key(member) {
                    problems.push(format!(
                        "show {}, group {}: undefined fixture {}",
                        name, group, member
                    ));
                }
            }
        }
        problems
    }

    /// Converts the configuration into a runtime show. The show must have passed validation.
    pub fn to_show(
        &self,
        name: &str,
        profiles: &HashMap<String, Arc<FixtureProfile>>,
    ) -> lighting::Show {
        if self.fixture_aspects.is_empty() {
            info!(
                show = name,
                "No fixture aspects defined, every fixture is standing and facing up-stage."
            );
        }
        if self.fixtures.is_empty() {
            warn!(show = name, "No fixtures defined, all DMX will pass through.");
        }

        let fixtures = self
            .fixtures
            .iter()
            .filter_map(|(fixture_name, fixture)| {
                let profile = profiles.get(&fixture.profile)?;
                let mount = fixture
                    .aspect
                    .as_ref()
                    .and_then(|aspect| self.fixture_aspects.get(aspect))
                    .map(|tags| mount_from_tags(tags.as_slice()))
                    .unwrap_or_default();
                Some(lighting::Fixture::new(
                    fixture_name,
                    fixture.id,
                    fixture.position(),
                    Arc::clone(profile),
                    mount,
                    fixture.focus,
                ))
            })
            .collect();

        lighting::Show::new(
            name,
            fixtures,
            self.fixture_groups.clone(),
            self.fixture_aspects.clone(),
        )
    }
}

/// Reads the shows file.
pub fn load_shows(path: &Path) -> Result<BTreeMap<String, Show>, ConfigError> {
    info!(path = path.display().to_string(), "Reading shows.");
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: ShowFile = serde_yml::from_str(&contents).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(file.shows)
}
