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

use parking_lot::Mutex;

use super::{Axis, Button, ControllerState, Indicator, Trigger};

/// A scripted controller for tests.
pub struct Gamepad {
    state: Mutex<Option<ControllerState>>,
    indicated: Mutex<Vec<Indicator>>,
}

impl Gamepad {
    /// Creates a connected controller at rest.
    pub fn new() -> Gamepad {
        Gamepad {
            state: Mutex::new(Some(ControllerState::default())),
            indicated: Mutex::new(Vec::new()),
        }
    }

    pub fn press(&self, button: Button) {
        self.update(|state| state.set_pressed(button, true));
    }

    pub fn release(&self, button: Button) {
        self.update(|state| state.set_pressed(button, false));
    }

    pub fn set_axis(&self, axis: Axis, value: f64) {
        self.update(|state| state.set_axis(axis, value));
    }

    pub fn set_trigger(&self, trigger: Trigger, value: f64) {
        self.update(|state| state.set_trigger(trigger, value));
    }

    pub fn disconnect(&self) {
        *self.state.lock() = None;
    }

    /// Gets every indicator signalled so far.
    pub fn indicated(&self) -> Vec<Indicator> {
        self.indicated.lock().clone()
    }

    fn update<F: FnOnce(&mut ControllerState)>(&self, f: F) {
        let mut state = self.state.lock();
        f(state.get_or_insert_with(ControllerState::default));
    }
}

impl super::Gamepad for Gamepad {
    fn snapshot(&self) -> Option<ControllerState> {
        self.state.lock().clone()
    }

    fn indicate(&self, indicator: Indicator) {
        self.indicated.lock().push(indicator);
    }
}
