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

//! Turns a target position and a fixture's mounting geometry into pan/tilt
//! angles and raw device units.

use glam::DVec3;

use super::profile::FixtureProfile;

/// The largest raw pan/tilt value.
pub const RAW_MAX: f64 = 65535.0;

/// Pan and tilt angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aim {
    /// The pan angle, [0, 360).
    pub ha: f64,
    /// The tilt angle, [0, 360).
    pub va: f64,
}

/// How a fixture is hung relative to its profile's home orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Mount {
    /// Hanging upside down.
    pub inverted: bool,
    /// Rotated 180 degrees about the vertical axis.
    pub reversed: bool,
}

/// Unsigned angle between two vectors in degrees. None if either vector has no length.
fn angle_between(a: DVec3, b: DVec3) -> Option<f64> {
    let denominator = (a.length_squared() * b.length_squared()).sqrt();
    if denominator <= f64::EPSILON {
        return None;
    }
    Some((a.dot(b) / denominator).clamp(-1.0, 1.0).acos().to_degrees())
}

/// Computes the pan/tilt angles a fixture at `origin` needs to hit `target`.
///
/// The result depends only on the inputs, so calling this repeatedly with an
/// unchanged target always yields the same angles.
pub fn aim(origin: DVec3, target: DVec3, mount: Mount) -> Aim {
    let v_target = target - origin;
    let horizontal = DVec3::new(v_target.x, v_target.y, 0.0);

    // Pan is measured against the home axis (+x). A target straight above or
    // below has no bearing, so it's pinned to the home axis.
    let mut ha = angle_between(DVec3::X, horizontal).unwrap_or(0.0);

    // The unsigned angle only covers half a turn. Targets behind the zero
    // bearing axis take the reflected angle so the beam doesn't sweep the long way.
    if target.y < origin.y {
        ha = 360.0 - ha;
    }
    ha = ha.rem_euclid(360.0);

    let mut va = if target.z <= 0.0 {
        0.0
    } else {
        match angle_between(v_target, horizontal) {
            Some(va) => va,
            None if v_target.length_squared() > f64::EPSILON => 90.0,
            None => 0.0,
        }
    };

    if mount.reversed {
        ha = (ha + 180.0).rem_euclid(360.0);
    }
    if mount.inverted {
        if !mount.reversed {
            ha = (180.0 - ha).rem_euclid(180.0);
        }
        va = (90.0 - va).rem_euclid(180.0);
    }

    Aim { ha, va }
}

/// Maps angles onto the profile's raw 16-bit pan/tilt range, clamped to [0, 65535].
pub fn to_raw(profile: &FixtureProfile, aim: Aim) -> (f64, f64) {
    let h = profile.home_h_units()
        + (aim.ha / profile.h_range()) * RAW_MAX * profile.h_rotation().sign();
    let v = profile.home_v_units() + (aim.va / profile.v_range()) * RAW_MAX;
    (h.clamp(0.0, RAW_MAX), v.clamp(0.0, RAW_MAX))
}

/// Raw units back to angles. Inverse of `to_raw` inside the unclamped range.
pub fn to_angles(profile: &FixtureProfile, raw_h: f64, raw_v: f64) -> Aim {
    Aim {
        ha: (raw_h - profile.home_h_units()) / RAW_MAX * profile.h_range()
            * profile.h_rotation().sign(),
        va: (raw_v - profile.home_v_units()) / RAW_MAX * profile.v_range(),
    }
}
