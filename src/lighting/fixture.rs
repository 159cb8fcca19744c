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
use std::sync::Arc;

use glam::DVec3;
use tracing::debug;

use super::codec;
use super::pointing::{self, Aim, Mount, RAW_MAX};
use super::profile::{Channel, FixtureProfile, PositionLayout};

/// The raw value a fixture starts at on both axes.
pub const RAW_CENTER: f64 = (255.0 * 255.0) / 2.0;

/// The channels cleared by `off`.
const LIGHT_CHANNELS: [Channel; 6] = [
    Channel::Intensity,
    Channel::Color,
    Channel::Red,
    Channel::Green,
    Channel::Blue,
    Channel::White,
];

/// A physical instrument patched into the universe.
#[derive(Debug, Clone)]
pub struct Fixture {
    /// The name of the fixture.
    name: String,
    /// The first DMX channel the fixture occupies, 1-based.
    id: u16,
    /// Where the fixture hangs. None if it hasn't been located yet.
    position: Option<DVec3>,
    /// The model description.
    profile: Arc<FixtureProfile>,
    /// Mount corrections from the fixture's aspect.
    mount: Mount,
    /// Raw pan, [0, 65535].
    pan: f64,
    /// Raw tilt, [0, 65535].
    tilt: f64,
    /// Current value of every channel in the profile layout.
    values: Vec<u8>,
}

impl Fixture {
    /// Creates a new fixture centred on both axes with every light channel off.
    pub fn new(
        name: &str,
        id: u16,
        position: Option<DVec3>,
        profile: Arc<FixtureProfile>,
        mount: Mount,
        focus: Option<u8>,
    ) -> Fixture {
        let mut fixture = Fixture {
            name: name.to_string(),
            id,
            position,
            values: vec![0; profile.footprint()],
            profile,
            mount,
            pan: RAW_CENTER,
            tilt: RAW_CENTER,
        };
        if let Some(focus) = focus {
            fixture.set_value(&Channel::Focus, focus);
        }
        fixture.sync_position();
        fixture
    }

    /// Gets the name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the first DMX channel.
    pub fn id(&self) -> u16 {
        self.id
    }

    /// Gets the last DMX channel.
    pub fn last_channel(&self) -> usize {
        usize::from(self.id) + self.profile.footprint().saturating_sub(1)
    }

    /// Gets the profile.
    pub fn profile(&self) -> &FixtureProfile {
        &self.profile
    }

    /// Gets the position, if located.
    pub fn position(&self) -> Option<DVec3> {
        self.position
    }

    /// Moves the fixture.
    pub fn set_position(&mut self, position: Option<DVec3>) {
        self.position = position;
    }

    /// Returns true if the fixture has a known position.
    pub fn is_located(&self) -> bool {
        self.position.is_some()
    }

    /// Gets the mount corrections.
    pub fn mount(&self) -> Mount {
        self.mount
    }

    /// Sets whether the fixture hangs upside down.
    pub fn set_inverted(&mut self, inverted: bool) {
        self.mount.inverted = inverted;
    }

    /// Sets whether the fixture is turned around.
    pub fn set_reversed(&mut self, reversed: bool) {
        self.mount.reversed = reversed;
    }

    /// Gets the raw pan value.
    pub fn pan(&self) -> f64 {
        self.pan
    }

    /// Gets the raw tilt value.
    pub fn tilt(&self) -> f64 {
        self.tilt
    }

    /// Gets the current value of a channel, if the profile has it.
    pub fn value(&self, channel: &Channel) -> Option<u8> {
        self.profile
            .index_of(channel)
            .and_then(|index| self.values.get(index).copied())
    }

    /// Gets every channel value in layout order.
    pub fn values(&self) -> &[u8] {
        &self.values
    }

    /// Replaces the channel values wholesale and recovers pan/tilt from them.
    pub(super) fn load_values(&mut self, values: &[u8]) {
        for (slot, value) in self.values.iter_mut().zip(values) {
            *slot = *value;
        }
        if let Some((pan, tilt)) = codec::position_from_values(&self.profile, &self.values) {
            self.pan = pan;
            self.tilt = tilt;
        }
    }

    /// Sets raw pan/tilt directly, clamped to the device range.
    pub fn set_raw(&mut self, pan: f64, tilt: f64) {
        self.pan = pan.clamp(0.0, RAW_MAX);
        self.tilt = tilt.clamp(0.0, RAW_MAX);
        self.sync_position();
    }

    /// Moves raw pan/tilt by the given amounts, clamped to the device range.
    pub fn nudge(&mut self, pan: f64, tilt: f64) {
        self.set_raw(self.pan + pan, self.tilt + tilt);
    }

    /// Points the fixture at the target. Unlocated fixtures can't be aimed and return None.
    pub fn point_at(&mut self, target: DVec3) -> Option<Aim> {
        let Some(origin) = self.position else {
            debug!(fixture = self.name, "Fixture has no position, not aiming.");
            return None;
        };

        let aim = pointing::aim(origin, target, self.mount);
        let (pan, tilt) = pointing::to_raw(&self.profile, aim);
        debug!(
            fixture = self.name,
            ha = aim.ha,
            va = aim.va,
            pan,
            tilt,
            "Aimed fixture."
        );
        self.set_raw(pan, tilt);
        Some(aim)
    }

    /// Turns the fixture on in the given color.
    pub fn on(&mut self, color: &str) {
        self.set_value(&Channel::Intensity, u8::MAX);
        self.set_value(&Channel::Shutter, u8::MAX);
        if let Some(value) = self.profile.color_value(color) {
            self.set_value(&Channel::Color, value);
        }

        let white = color == "white";
        if white {
            self.set_value(&Channel::White, u8::MAX);
        }
        for (primary, name) in [
            (Channel::Red, "red"),
            (Channel::Green, "green"),
            (Channel::Blue, "blue"),
        ] {
            if white || color == name {
                self.set_value(&primary, u8::MAX);
            }
        }
    }

    /// Turns the fixture off.
    pub fn off(&mut self) {
        for channel in LIGHT_CHANNELS.iter() {
            self.set_value(channel, 0);
        }
    }

    /// Returns true if the intensity (or, lacking one, any primary) is up.
    pub fn is_lit(&self) -> bool {
        LIGHT_CHANNELS
            .iter()
            .filter(|channel| **channel != Channel::Color)
            .any(|channel| self.value(channel).is_some_and(|value| value > 0))
    }

    /// Adjusts the focus channel by delta, clamped to a byte.
    pub fn adjust_focus(&mut self, delta: i16) {
        if let Some(focus) = self.value(&Channel::Focus) {
            self.set_value(&Channel::Focus, codec::clamp_byte(i32::from(focus) + i32::from(delta)));
        }
    }

    /// Sets the focus channel, if the profile has one.
    pub fn set_focus(&mut self, focus: u8) {
        self.set_value(&Channel::Focus, focus);
    }

    fn set_value(&mut self, channel: &Channel, value: u8) {
        if let Some(index) = self.profile.index_of(channel) {
            self.values[index] = value;
        }
    }

    /// Writes pan/tilt into the position channels of the layout.
    fn sync_position(&mut self) {
        match self.profile.position_layout() {
            PositionLayout::Wide => {
                let (h_coarse, h_fine) = codec::split_wide(self.pan);
                let (v_coarse, v_fine) = codec::split_wide(self.tilt);
                self.set_value(&Channel::HCoarse, h_coarse);
                self.set_value(&Channel::HFine, h_fine);
                self.set_value(&Channel::VCoarse, v_coarse);
                self.set_value(&Channel::VFine, v_fine);
            }
            PositionLayout::Narrow => {
                self.set_value(&Channel::H, codec::narrow(self.pan));
                self.set_value(&Channel::V, codec::narrow(self.tilt));
            }
            PositionLayout::Fixed => {}
        }
    }
}

impl fmt::Display for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @{}-{} ({})",
            self.name,
            self.id,
            self.last_channel(),
            self.profile.name()
        )?;
        if let Some(position) = self.position {
            write!(f, " at ({}, {}, {})", position.x, position.y, position.z)?;
        }
        Ok(())
    }
}
