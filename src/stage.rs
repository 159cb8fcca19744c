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
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::store::{Calibration, StageRecord};
use crate::config::{Store, StoreError};
use crate::controller::{Axis, Button, Debounce, Input};
use crate::dmx::frame::Frame;
use crate::lighting::profile::Channel;
use crate::lighting::{codec, Show};

pub const DEFAULT_STICK_SPEED: f64 = 150.0;

const SPEED_STEP: f64 = 50.0;
const MIN_SPEED: f64 = 25.0;
const MAX_SPEED: f64 = 500.0;

const FOCUS_STEP: i16 = 8;

/// The color a pair is lit in while calibrating.
const PAIR_COLOR: &str = "white";

/// Two adjacent fixtures from a stable ordering of fixture names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixturePair {
    names: Vec<String>,
    index: usize,
}

impl FixturePair {
    pub fn new(names: Vec<String>) -> FixturePair {
        FixturePair { names, index: 0 }
    }

    /// Gets the index of the first member.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Gets the first member.
    pub fn a(&self) -> Option<&str> {
        self.names.get(self.index).map(String::as_str)
    }

    /// Gets the second member, which wraps to the start of the ordering.
    pub fn b(&self) -> Option<&str> {
        if self.names.is_empty() {
            return None;
        }
        self.names
            .get((self.index + 1) % self.names.len())
            .map(String::as_str)
    }

    pub fn next(&mut self) {
        if !self.names.is_empty() {
            self.index = (self.index + 1) % self.names.len();
        }
    }

    pub fn prev(&mut self) {
        if !self.names.is_empty() {
            self.index = (self.index + self.names.len() - 1) % self.names.len();
        }
    }

    /// Returns true if the fixture is one of the pair.
    pub fn contains(&self, name: &str) -> bool {
        self.a() == Some(name) || self.b() == Some(name)
    }
}

/// A calibration workspace that walks adjacent fixture pairs.
#[derive(Debug)]
pub struct Stage {
    name: String,
    pair: FixturePair,
    speed: f64,
    settle: Debounce,
}

impl Stage {
    /// Opens the stage. Pan and tilt start from the inbound frame, then any stored
    /// calibration is applied and the first pair is lit and aimed at each other.
    pub fn new(show: &mut Show, store: &Store, name: &str, frame: &Frame, settle: Duration) -> Stage {
        show.decode_positions(frame);
        match store.stage(name) {
            Ok(Some(record)) => Self::apply(show, &record),
            Ok(None) => info!(stage = name, "No stored calibration for stage."),
            Err(e) => warn!(stage = name, err = e.to_string(), "Unable to read stages."),
        }

        let stage = Stage {
            name: name.to_string(),
            pair: FixturePair::new(show.fixture_names().to_vec()),
            speed: DEFAULT_STICK_SPEED,
            settle: Debounce::new(settle),
        };
        stage.light_pair(show);
        info!(
            stage = stage.name,
            a = stage.pair.a(),
            b = stage.pair.b(),
            "Stage loaded."
        );
        stage
    }

    /// Applies stored calibration to the show's fixtures.
    pub fn apply(show: &mut Show, record: &StageRecord) {
        for (name, calibration) in record.iter() {
            let Some(fixture) = show.fixture_mut(name) else {
                warn!(fixture = name, "Calibrated fixture is no longer in the show.");
                continue;
            };
            fixture.set_inverted(calibration.inverted);
            fixture.set_reversed(calibration.reversed);
            if let Some(focus) = calibration.focus {
                fixture.set_focus(focus);
            }
            fixture.set_raw(calibration.pan, calibration.tilt);
        }
    }

    /// Gets the stage name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the current pair.
    pub fn pair(&self) -> &FixturePair {
        &self.pair
    }

    /// Gets the stick speed.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Handles one tick of calibration input and renders the pair.
    pub fn edit(&mut self, show: &mut Show, store: &Store, input: &Input, frame: &mut Frame) {
        let bumper = input.pressed(Button::LeftBumper) || input.pressed(Button::RightBumper);
        if bumper && self.settle.accept(input.now()) {
            self.rotate(show, input.pressed(Button::RightBumper));
        }

        let focus = if input.pressed(Button::DpadUp) {
            FOCUS_STEP
        } else if input.pressed(Button::DpadDown) {
            -FOCUS_STEP
        } else {
            0
        };
        if focus != 0 {
            if let Some(a) = self.pair.a().and_then(|name| show.fixture_mut(name)) {
                a.adjust_focus(focus);
                debug!(fixture = a.name(), focus = a.value(&Channel::Focus), "Focus changed.");
            }
        }

        let speed = if input.pressed(Button::DpadRight) {
            SPEED_STEP
        } else if input.pressed(Button::DpadLeft) {
            -SPEED_STEP
        } else {
            0.0
        };
        if speed != 0.0 && self.settle.accept(input.now()) {
            self.speed = (self.speed + speed).clamp(MIN_SPEED, MAX_SPEED);
            debug!(stage = self.name, speed = self.speed, "Stick speed changed.");
        }

        if input.pressed(Button::Y) || input.pressed(Button::X) {
            if let Some(a) = self.pair.a().and_then(|name| show.fixture_mut(name)) {
                let mut mount = a.mount();
                if input.pressed(Button::Y) {
                    mount.inverted = !mount.inverted;
                }
                if input.pressed(Button::X) {
                    mount.reversed = !mount.reversed;
                }
                a.set_inverted(mount.inverted);
                a.set_reversed(mount.reversed);
                info!(
                    fixture = a.name(),
                    inverted = mount.inverted,
                    reversed = mount.reversed,
                    "Mount changed."
                );
            }
            self.aim_pair(show);
        }

        let nudges = [
            (self.pair.a(), Axis::LeftX, Axis::LeftY),
            (self.pair.b(), Axis::RightX, Axis::RightY),
        ];
        for (name, x, y) in nudges {
            let (dx, dy) = (input.axis(x), input.axis(y));
            if dx == 0.0 && dy == 0.0 {
                continue;
            }
            if let Some(fixture) = name.and_then(|name| show.fixture_mut(name)) {
                fixture.nudge(self.speed * dx, self.speed * dy);
            }
        }

        if input.pressed(Button::B) {
            match self.save(show, store) {
                Ok(()) => info!(stage = self.name, "Saved stage."),
                Err(e) => error!(stage = self.name, err = e.to_string(), "Unable to save stage."),
            }
        }

        for name in [self.pair.a(), self.pair.b()].into_iter().flatten() {
            if let Some(fixture) = show.fixture(name) {
                codec::encode(fixture, frame);
            }
        }
    }

    /// Releases the stage, turning the pair off.
    pub fn exit(&mut self, show: &mut Show) {
        for name in [self.pair.a(), self.pair.b()].into_iter().flatten() {
            if let Some(fixture) = show.fixture_mut(name) {
                fixture.off();
            }
        }
        debug!(stage = self.name, "Stage released.");
    }

    /// Writes every fixture's calibration to the store.
    pub fn save(&self, show: &Show, store: &Store) -> Result<(), StoreError> {
        store.save_stage(&self.name, &Self::record(show))
    }

    /// Gets the persisted calibration of every fixture in the show.
    pub fn record(show: &Show) -> StageRecord {
        show.fixtures()
            .map(|fixture| {
                (
                    fixture.name().to_string(),
                    Calibration {
                        inverted: fixture.mount().inverted,
                        reversed: fixture.mount().reversed,
                        focus: fixture.value(&Channel::Focus),
                        pan: fixture.pan(),
                        tilt: fixture.tilt(),
                    },
                )
            })
            .collect()
    }

    fn rotate(&mut self, show: &mut Show, forward: bool) {
        let before = self.pair.clone();
        if forward {
            self.pair.next();
        } else {
            self.pair.prev();
        }

        for name in [before.a(), before.b()].into_iter().flatten() {
            if self.pair.contains(name) {
                continue;
            }
            if let Some(fixture) = show.fixture_mut(name) {
                fixture.off();
            }
        }
        self.light_pair(show);
        info!(
            stage = self.name,
            a = self.pair.a(),
            b = self.pair.b(),
            "Switched pair."
        );
    }

    fn light_pair(&self, show: &mut Show) {
        for name in [self.pair.a(), self.pair.b()].into_iter().flatten() {
            if let Some(fixture) = show.fixture_mut(name) {
                fixture.on(PAIR_COLOR);
            }
        }
        self.aim_pair(show);
    }

    /// Points each member at the other when both are located.
    fn aim_pair(&self, show: &mut Show) {
        let (Some(a), Some(b)) = (self.pair.a(), self.pair.b()) else {
            return;
        };
        if a == b {
            return;
        }
        let positions = (
            show.fixture(a).and_then(|f| f.position()),
            show.fixture(b).and_then(|f| f.position()),
        );
        let (Some(a_pos), Some(b_pos)) = positions else {
            debug!(a, b, "Pair isn't located, not aiming.");
            return;
        };
        if let Some(fixture) = show.fixture_mut(a) {
            fixture.point_at(b_pos);
        }
        if let Some(fixture) = show.fixture_mut(b) {
            fixture.point_at(a_pos);
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stage {} pair {}/{} speed {}",
            self.name,
            self.pair.a().unwrap_or("-"),
            self.pair.b().unwrap_or("-"),
            self.speed
        )
    }
}
