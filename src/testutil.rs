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

#[cfg(test)]
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    thread,
    time::{Duration, SystemTime},
};

#[cfg(test)]
use glam::DVec3;

#[cfg(test)]
use crate::lighting::{
    fixture::Fixture,
    pointing::Mount,
    profile::{Channel, FixtureProfile, Rotation},
    show::{mount_from_tags, Show},
};

/// The control channel used by test configurations.
#[cfg(test)]
pub const CONTROL_ID: u16 = 100;

/// A 16-bit mover with a color wheel and focus.
#[cfg(test)]
pub fn wide_profile() -> FixtureProfile {
    FixtureProfile::new(
        "wide-spot",
        540.0,
        270.0,
        0.0,
        0.0,
        Rotation::Ccw,
        Rotation::Ccw,
        vec![
            Channel::HCoarse,
            Channel::HFine,
            Channel::VCoarse,
            Channel::VFine,
            Channel::Intensity,
            Channel::Color,
            Channel::Shutter,
            Channel::Focus,
        ],
        HashMap::from([("white".to_string(), 0), ("red".to_string(), 16)]),
    )
}

/// A 16-bit RGBW wash.
#[cfg(test)]
pub fn rgbw_profile() -> FixtureProfile {
    FixtureProfile::new(
        "rgbw-wash",
        540.0,
        180.0,
        128.0,
        0.0,
        Rotation::Cw,
        Rotation::Ccw,
        vec![
            Channel::HCoarse,
            Channel::HFine,
            Channel::VCoarse,
            Channel::VFine,
            Channel::Intensity,
            Channel::Red,
            Channel::Green,
            Channel::Blue,
            Channel::White,
        ],
        HashMap::new(),
    )
}

/// An 8-bit scanner with a color wheel and shutter but no focus.
#[cfg(test)]
pub fn wheel_profile() -> FixtureProfile {
    FixtureProfile::new(
        "wheel-scan",
        360.0,
        180.0,
        0.0,
        0.0,
        Rotation::Ccw,
        Rotation::Ccw,
        vec![
            Channel::H,
            Channel::V,
            Channel::Shutter,
            Channel::Color,
            Channel::Intensity,
        ],
        HashMap::from([
            ("white".to_string(), 0),
            ("red".to_string(), 8),
            ("blue".to_string(), 24),
        ]),
    )
}

/// An 8-bit mover with nothing but position and intensity.
#[cfg(test)]
pub fn narrow_profile() -> FixtureProfile {
    FixtureProfile::new(
        "narrow-mover",
        540.0,
        270.0,
        0.0,
        0.0,
        Rotation::Ccw,
        Rotation::Ccw,
        vec![Channel::H, Channel::V, Channel::Intensity],
        HashMap::new(),
    )
}

/// A four fixture show split into stage-left and stage-right. right-2 is unlocated.
#[cfg(test)]
pub fn test_show() -> Show {
    let fixtures = vec![
        Fixture::new(
            "left-1",
            1,
            Some(DVec3::new(0.0, 0.0, 10.0)),
            Arc::new(wide_profile()),
            Mount::default(),
            Some(64),
        ),
        Fixture::new(
            "left-2",
            9,
            Some(DVec3::new(2.0, 0.0, 10.0)),
            Arc::new(rgbw_profile()),
            Mount::default(),
            None,
        ),
        Fixture::new(
            "right-1",
            20,
            Some(DVec3::new(8.0, 0.0, 10.0)),
            Arc::new(wheel_profile()),
            mount_from_tags(&["hanging"]),
            None,
        ),
        Fixture::new(
            "right-2",
            30,
            None,
            Arc::new(narrow_profile()),
            Mount::default(),
            None,
        ),
    ];
    let groups = BTreeMap::from([
        (
            "stage-left".to_string(),
            vec!["left-1".to_string(), "left-2".to_string()],
        ),
        (
            "stage-right".to_string(),
            vec!["right-1".to_string(), "right-2".to_string()],
        ),
    ]);
    let aspects = HashMap::from([("hanging".to_string(), vec!["hanging".to_string()])]);
    Show::new("test", fixtures, groups, aspects)
}

/// Wait for the given predicate to return true or fail.
#[inline]
#[cfg(test)]
pub fn eventually<F>(predicate: F, error_msg: &str)
where
    F: Fn() -> bool,
{
    let start = SystemTime::now();
    let tick = Duration::from_millis(10);
    let timeout = Duration::from_secs(3);

    loop {
        let elapsed = match start.elapsed() {
            Ok(elapsed) => elapsed,
            Err(_) => panic!("System time error"),
        };

        if elapsed > timeout {
            panic!("{}", error_msg);
        }
        if predicate() {
            return;
        }
        thread::sleep(tick);
    }
}
