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
use std::fmt;

use glam::DVec3;
use tracing::debug;

use crate::dmx::frame::Frame;

use super::codec;
use super::fixture::Fixture;
use super::group::{FixtureGroup, ALL};
use super::pointing::Mount;

/// Derives mount corrections from aspect tags.
pub fn mount_from_tags<S: AsRef<str>>(tags: &[S]) -> Mount {
    let mut mount = Mount::default();
    for tag in tags {
        match tag.as_ref() {
            "hanging" | "inverted" => mount.inverted = true,
            "reversed" | "backward" => mount.reversed = true,
            _ => {}
        }
    }
    mount
}

/// The fixtures and groups of one production.
#[derive(Debug, Clone)]
pub struct Show {
    name: String,
    fixtures: BTreeMap<String, Fixture>,
    /// Groups as configured, without the implicit group.
    defined_groups: BTreeMap<String, Vec<String>>,
    /// Every group, including the implicit one.
    groups: BTreeMap<String, FixtureGroup>,
    fixture_names: Vec<String>,
    aspects: HashMap<String, Vec<String>>,
}

impl Show {
    /// Creates a new show. Group members are expected to name fixtures in the show.
    pub fn new(
        name: &str,
        fixtures: Vec<Fixture>,
        groups: BTreeMap<String, Vec<String>>,
        aspects: HashMap<String, Vec<String>>,
    ) -> Show {
        let mut show = Show {
            name: name.to_string(),
            fixtures: fixtures
                .into_iter()
                .map(|fixture| (fixture.name().to_string(), fixture))
                .collect(),
            defined_groups: groups,
            groups: BTreeMap::new(),
            fixture_names: Vec::new(),
            aspects,
        };
        show.rebuild_groups();
        show
    }

    /// Recomputes the sorted name list and the derived group map.
    pub fn rebuild_groups(&mut self) {
        self.fixture_names = self.fixtures.keys().cloned().collect();
        self.groups = self
            .defined_groups
            .iter()
            .map(|(name, members)| {
                let members = members
                    .iter()
                    .filter(|member| self.fixtures.contains_key(member.as_str()))
                    .cloned()
                    .collect();
                (name.clone(), FixtureGroup::new(name, members))
            })
            .collect();
        self.groups.insert(
            ALL.to_string(),
            FixtureGroup::new(ALL, self.fixture_names.clone()),
        );
        debug!(show = self.name, groups = self.groups.len(), "Rebuilt groups.");
    }

    /// Gets the name of the show.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets a fixture by name.
    pub fn fixture(&self, name: &str) -> Option<&Fixture> {
        self.fixtures.get(name)
    }

    /// Gets a mutable fixture by name.
    pub fn fixture_mut(&mut self, name: &str) -> Option<&mut Fixture> {
        self.fixtures.get_mut(name)
    }

    /// Gets every fixture, ordered by name.
    pub fn fixtures(&self) -> impl Iterator<Item = &Fixture> {
        self.fixtures.values()
    }

    /// Gets the sorted fixture names.
    pub fn fixture_names(&self) -> &[String] {
        &self.fixture_names
    }

    /// Gets a group by name.
    pub fn group(&self, name: &str) -> Option<&FixtureGroup> {
        self.groups.get(name)
    }

    /// Gets the sorted group names.
    pub fn group_names(&self) -> Vec<&str> {
        self.groups.keys().map(String::as_str).collect()
    }

    /// Gets the aspect catalogue.
    pub fn aspects(&self) -> &HashMap<String, Vec<String>> {
        &self.aspects
    }

    /// Aims every member of the group at the target.
    pub fn point_group(&mut self, group: &str, target: DVec3) {
        self.for_each_member(group, |fixture| {
            fixture.point_at(target);
        });
    }

    /// Turns every member of the group on.
    pub fn group_on(&mut self, group: &str, color: &str) {
        self.for_each_member(group, |fixture| fixture.on(color));
    }

    /// Turns every member of the group off.
    pub fn group_off(&mut self, group: &str) {
        self.for_each_member(group, Fixture::off);
    }

    /// Writes every channel of the group's members into the frame.
    pub fn encode_group(&self, group: &str, frame: &mut Frame) {
        for fixture in self.members(group) {
            codec::encode(fixture, frame);
        }
    }

    /// Writes the position channels of the group's members into the frame.
    pub fn encode_group_position(&self, group: &str, frame: &mut Frame) {
        for fixture in self.members(group) {
            codec::encode_position(fixture, frame);
        }
    }

    /// Loads every fixture's pan and tilt from the frame. Looks stay as they are.
    pub fn decode_positions(&mut self, frame: &Frame) {
        for fixture in self.fixtures.values_mut() {
            codec::decode_position(fixture, frame);
        }
    }

    fn members<'a>(&'a self, group: &str) -> impl Iterator<Item = &'a Fixture> {
        self.groups
            .get(group)
            .into_iter()
            .flat_map(|group| group.members())
            .filter_map(|member| self.fixtures.get(member))
    }

    fn for_each_member<F: FnMut(&mut Fixture)>(&mut self, group: &str, mut f: F) {
        let Some(group) = self.groups.get(group) else {
            return;
        };
        for member in group.members() {
            if let Some(fixture) = self.fixtures.get_mut(member) {
                f(fixture);
            }
        }
    }
}

impl fmt::Display for Show {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Show: {}", self.name)?;
        writeln!(f, "  Fixtures:")?;
        for fixture in self.fixtures.values() {
            writeln!(f, "    {}", fixture)?;
        }
        writeln!(f, "  Groups:")?;
        for group in self.groups.values() {
            writeln!(f, "    {}", group)?;
        }
        Ok(())
    }
}
