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
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The direction a motor turns as its raw value increases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rotation {
    Cw,
    #[default]
    Ccw,
}

impl Rotation {
    /// The sign applied to an angle when converting it to raw device units.
    pub fn sign(self) -> f64 {
        match self {
            Rotation::Cw => -1.0,
            Rotation::Ccw => 1.0,
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rotation::Cw => write!(f, "cw"),
            Rotation::Ccw => write!(f, "ccw"),
        }
    }
}

/// A semantic channel within a fixture's DMX footprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Channel {
    HCoarse,
    HFine,
    VCoarse,
    VFine,
    H,
    V,
    Intensity,
    Shutter,
    Color,
    Red,
    Green,
    Blue,
    White,
    Focus,
    /// A channel we don't manage. It's written as zero.
    Other(String),
}

impl From<&str> for Channel {
    fn from(name: &str) -> Self {
        match name {
            "h-coarse" => Channel::HCoarse,
            "h-fine" => Channel::HFine,
            "v-coarse" => Channel::VCoarse,
            "v-fine" => Channel::VFine,
            "h" => Channel::H,
            "v" => Channel::V,
            "intensity" => Channel::Intensity,
            "shutter" => Channel::Shutter,
            "color" => Channel::Color,
            "red" => Channel::Red,
            "green" => Channel::Green,
            "blue" => Channel::Blue,
            "white" => Channel::White,
            "focus" => Channel::Focus,
            other => Channel::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::HCoarse => "h-coarse",
            Channel::HFine => "h-fine",
            Channel::VCoarse => "v-coarse",
            Channel::VFine => "v-fine",
            Channel::H => "h",
            Channel::V => "v",
            Channel::Intensity => "intensity",
            Channel::Shutter => "shutter",
            Channel::Color => "color",
            Channel::Red => "red",
            Channel::Green => "green",
            Channel::Blue => "blue",
            Channel::White => "white",
            Channel::Focus => "focus",
            Channel::Other(name) => name,
        };
        write!(f, "{}", name)
    }
}

/// How a profile carries its pan/tilt position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionLayout {
    /// Coarse/fine channel pairs, 16 bits per axis.
    Wide,
    /// One channel per axis.
    Narrow,
    /// No position channels at all.
    Fixed,
}

/// The static description of a fixture model. Shared read-only by every
/// fixture of that model.
#[derive(Debug, Clone)]
pub struct FixtureProfile {
    name: String,
    h_range: f64,
    v_range: f64,
    hx: f64,
    vz: f64,
    h_rotation: Rotation,
    v_rotation: Rotation,
    channels: Vec<Channel>,
    color_values: HashMap<String, u8>,
}

impl FixtureProfile {
    /// Creates a new fixture profile. Callers are expected to have validated
    /// the geometry and channel layout.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &str,
        h_range: f64,
        v_range: f64,
        hx: f64,
        vz: f64,
        h_rotation: Rotation,
        v_rotation: Rotation,
        channels: Vec<Channel>,
        color_values: HashMap<String, u8>,
    ) -> FixtureProfile {
        FixtureProfile {
            name: name.to_string(),
            h_range,
            v_range,
            hx,
            vz,
            h_rotation,
            v_rotation,
            channels,
            color_values,
        }
    }

    /// Gets the name of the profile.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the horizontal travel in degrees.
    pub fn h_range(&self) -> f64 {
        self.h_range
    }

    /// Gets the vertical travel in degrees.
    pub fn v_range(&self) -> f64 {
        self.v_range
    }

    /// Gets the raw pan value of the home axis.
    pub fn home_h_units(&self) -> f64 {
        self.hx * 255.0
    }

    /// Gets the raw tilt value of the home axis.
    pub fn home_v_units(&self) -> f64 {
        self.vz * 255.0
    }

    /// Gets the horizontal motor direction.
    pub fn h_rotation(&self) -> Rotation {
        self.h_rotation
    }

    /// Gets the vertical motor direction.
    pub fn v_rotation(&self) -> Rotation {
        self.v_rotation
    }

    /// Gets the ordered channel layout.
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// The number of DMX channels the profile occupies.
    pub fn footprint(&self) -> usize {
        self.channels.len()
    }

    /// Gets the position of the channel in the layout, if present.
    pub fn index_of(&self, channel: &Channel) -> Option<usize> {
        self.channels.iter().position(|c| c == channel)
    }

    /// Returns true if the layout has the given channel.
    pub fn has(&self, channel: &Channel) -> bool {
        self.index_of(channel).is_some()
    }

    /// Gets the color wheel value for the named color.
    pub fn color_value(&self, color: &str) -> Option<u8> {
        self.color_values.get(color).copied()
    }

    /// Determines how pan/tilt are laid out.
    pub fn position_layout(&self) -> PositionLayout {
        if self.has(&Channel::HCoarse) {
            PositionLayout::Wide
        } else if self.has(&Channel::H) {
            PositionLayout::Narrow
        } else {
            PositionLayout::Fixed
        }
    }
}

impl fmt::Display for FixtureProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (h: {}° {}, v: {}° {}, {} channels)",
            self.name,
            self.h_range,
            self.h_rotation,
            self.v_range,
            self.v_rotation,
            self.channels.len()
        )
    }
}
