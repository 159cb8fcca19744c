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

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Stick readings inside this magnitude are treated as centred.
pub const DEFAULT_DEADZONE: i32 = 4000;

/// A YAML representation of the handheld controller configuration.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Controller {
    /// The raw stick deadzone.
    deadzone: Option<i32>,

    /// Where xboxdrv event lines are read from.
    path: Option<PathBuf>,

    /// The controller id passed to the LED indicator.
    id: Option<u8>,
}

impl Controller {
    /// Creates a new controller configuration.
    pub fn new(deadzone: Option<i32>, path: Option<PathBuf>, id: Option<u8>) -> Controller {
        Controller { deadzone, path, id }
    }

    /// Gets the stick deadzone in raw units.
    pub fn deadzone(&self) -> i32 {
        self.deadzone.unwrap_or(DEFAULT_DEADZONE)
    }

    /// Gets the event stream path.
    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    /// Gets the controller id.
    pub fn id(&self) -> u8 {
        self.id.unwrap_or(0)
    }

    pub(super) fn resolve(&mut self, base: &Path) {
        if let Some(path) = self.path.as_mut() {
            *path = super::resolve(base, path);
        }
    }
}
