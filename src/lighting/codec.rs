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

//! Conversion between raw pan/tilt values, fixture channel values, and universe frames.

use crate::dmx::frame::Frame;

use super::fixture::Fixture;
use super::pointing::RAW_MAX;
use super::profile::{Channel, FixtureProfile, PositionLayout};

/// Clamps an integer into a byte.
pub fn clamp_byte(value: i32) -> u8 {
    value.clamp(0, i32::from(u8::MAX)) as u8
}

/// Splits a raw value into coarse and fine bytes.
pub fn split_wide(raw: f64) -> (u8, u8) {
    let raw = raw.clamp(0.0, RAW_MAX) as i32;
    let coarse = clamp_byte(raw / 255);
    let fine = clamp_byte(raw - i32::from(coarse) * 255);
    (coarse, fine)
}

/// Recombines coarse and fine bytes into a raw value.
pub fn join_wide(coarse: u8, fine: u8) -> f64 {
    f64::from(coarse) * 255.0 + f64::from(fine)
}

/// Reduces a raw value to a single byte.
pub fn narrow(raw: f64) -> u8 {
    clamp_byte(raw.clamp(0.0, RAW_MAX) as i32 / 255)
}

/// Expands a single byte to a raw value.
pub fn widen(value: u8) -> f64 {
    f64::from(value) * 255.0
}

/// The zero-based frame index of a fixture channel. None for fixtures patched at 0.
pub fn frame_index(id: u16, index: usize) -> Option<usize> {
    (usize::from(id) + index).checked_sub(1)
}

/// Recovers raw pan/tilt from channel values laid out for the profile.
pub fn position_from_values(profile: &FixtureProfile, values: &[u8]) -> Option<(f64, f64)> {
    let value = |channel: &Channel| {
        profile
            .index_of(channel)
            .and_then(|index| values.get(index).copied())
    };
    match profile.position_layout() {
        PositionLayout::Wide => Some((
            join_wide(value(&Channel::HCoarse)?, value(&Channel::HFine)?),
            join_wide(value(&Channel::VCoarse)?, value(&Channel::VFine)?),
        )),
        PositionLayout::Narrow => Some((widen(value(&Channel::H)?), widen(value(&Channel::V)?))),
        PositionLayout::Fixed => None,
    }
}

/// Writes every channel of the fixture into the frame. Channels beyond the universe are skipped.
pub fn encode(fixture: &Fixture, frame: &mut Frame) {
    for (index, value) in fixture.values().iter().enumerate() {
        write(fixture, frame, index, *value);
    }
}

/// Writes only the position channels of the fixture into the frame.
pub fn encode_position(fixture: &Fixture, frame: &mut Frame) {
    for (index, channel) in fixture.profile().channels().iter().enumerate() {
        if is_position(channel) {
            write(fixture, frame, index, fixture.values()[index]);
        }
    }
}

/// Loads the fixture's channel values from the frame.
pub fn decode(fixture: &mut Fixture, frame: &Frame) {
    let values = frame_values(fixture, frame);
    fixture.load_values(&values);
}

/// Loads only pan and tilt from the frame. Returns false for fixtures without position channels.
pub fn decode_position(fixture: &mut Fixture, frame: &Frame) -> bool {
    let values = frame_values(fixture, frame);
    match position_from_values(fixture.profile(), &values) {
        Some((pan, tilt)) => {
            fixture.set_raw(pan, tilt);
            true
        }
        None => false,
    }
}

fn frame_values(fixture: &Fixture, frame: &Frame) -> Vec<u8> {
    (0..fixture.profile().footprint())
        .map(|index| {
            frame_index(fixture.id(), index)
                .map(|offset| frame.get(offset))
                .unwrap_or(0)
        })
        .collect()
}

fn write(fixture: &Fixture, frame: &mut Frame, index: usize, value: u8) {
    if let Some(offset) = frame_index(fixture.id(), index) {
        frame.set(offset, value);
    }
}

fn is_position(channel: &Channel) -> bool {
    matches!(
        channel,
        Channel::HCoarse | Channel::HFine | Channel::VCoarse | Channel::VFine | Channel::H | Channel::V
    )
}
