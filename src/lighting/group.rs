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

use std::fmt;

use glam::DVec3;

/// The name of the implicit group containing every fixture in a show.
pub const ALL: &str = "all";

/// A named point in stage space for a group to aim at.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    name: String,
    pos: DVec3,
}

impl Target {
    pub fn new(name: &str, pos: DVec3) -> Target {
        Target {
            name: name.to_string(),
            pos,
        }
    }

    /// Gets the name of the target.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the position of the target.
    pub fn pos(&self) -> DVec3 {
        self.pos
    }

    /// Moves the target. Returns true if the position changed.
    pub fn move_to(&mut self, pos: DVec3) -> bool {
        let changed = self.pos != pos;
        self.pos = pos;
        changed
    }
}

/// A named set of fixtures aimed as one. Members are fixture names owned by the show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureGroup {
    name: String,
    members: Vec<String>,
}

impl FixtureGroup {
    pub fn new(name: &str, members: Vec<String>) -> FixtureGroup {
        FixtureGroup {
            name: name.to_string(),
            members,
        }
    }

    /// Gets the name of the group.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the member fixture names.
    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Returns true if the fixture is a member.
    pub fn contains(&self, fixture: &str) -> bool {
        self.members.iter().any(|member| member == fixture)
    }
}

impl fmt::Display for FixtureGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.members.join(", "))
    }
}
