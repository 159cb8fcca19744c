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

use std::collections::BTreeSet;
use std::fmt;
use std::time::{Duration, Instant};

use tracing::debug;

#[cfg(test)]
pub mod mock;
pub mod xboxdrv;

/// A digital control on the handheld controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Button {
    A,
    B,
    X,
    Y,
    Start,
    Back,
    Guide,
    LeftBumper,
    RightBumper,
    LeftThumb,
    RightThumb,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
}

/// A stick axis, [-1.0, 1.0] after deadzone correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    LeftX,
    LeftY,
    RightX,
    RightY,
}

/// An analog trigger, [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Left,
    Right,
}

/// Trigger travel at which a trigger counts as pulled.
const TRIGGER_THRESHOLD: f64 = 0.5;

/// Everything the controller reports at an instant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerState {
    pressed: BTreeSet<Button>,
    axes: [f64; 4],
    triggers: [f64; 2],
}

impl ControllerState {
    /// Returns true if the button is held.
    pub fn pressed(&self, button: Button) -> bool {
        self.pressed.contains(&button)
    }

    pub fn set_pressed(&mut self, button: Button, pressed: bool) {
        if pressed {
            self.pressed.insert(button);
        } else {
            self.pressed.remove(&button);
        }
    }

    /// Gets an axis reading.
    pub fn axis(&self, axis: Axis) -> f64 {
        self.axes[axis as usize]
    }

    pub fn set_axis(&mut self, axis: Axis, value: f64) {
        self.axes[axis as usize] = value.clamp(-1.0, 1.0);
    }

    /// Gets a trigger reading.
    pub fn trigger(&self, trigger: Trigger) -> f64 {
        self.triggers[trigger as usize]
    }

    pub fn set_trigger(&mut self, trigger: Trigger, value: f64) {
        self.triggers[trigger as usize] = value.clamp(0.0, 1.0);
    }
}

/// What the controller's indicator should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Passthrough,
    SceneRun,
    SceneEdit,
    StageEdit,
    Technical,
    Production,
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Indicator::Passthrough => "passthrough",
                Indicator::SceneRun => "scene run",
                Indicator::SceneEdit => "scene edit",
                Indicator::StageEdit => "stage edit",
                Indicator::Technical => "technical",
                Indicator::Production => "production",
            }
        )
    }
}

/// A source of controller state.
pub trait Gamepad: Send + Sync {
    /// The latest state, or None if the controller isn't connected.
    fn snapshot(&self) -> Option<ControllerState>;

    /// Signals a mode or operation change to the operator.
    fn indicate(&self, indicator: Indicator);
}

/// Stands in when no controller is configured.
pub struct Disconnected {}

impl Gamepad for Disconnected {
    fn snapshot(&self) -> Option<ControllerState> {
        None
    }

    fn indicate(&self, indicator: Indicator) {
        debug!(indicator = indicator.to_string(), "No controller to indicate on.");
    }
}

/// One tick's view of the controller. Immutable once sampled.
#[derive(Debug, Clone)]
pub struct Input {
    now: Instant,
    current: ControllerState,
    previous: ControllerState,
    connected: bool,
}

impl Input {
    /// Input with no edges and centred sticks.
    pub fn neutral(now: Instant) -> Input {
        Input {
            now,
            current: ControllerState::default(),
            previous: ControllerState::default(),
            connected: false,
        }
    }

    /// Builds input from explicit states.
    pub fn new(now: Instant, current: ControllerState, previous: ControllerState) -> Input {
        Input {
            now,
            current,
            previous,
            connected: true,
        }
    }

    /// When the tick was sampled.
    pub fn now(&self) -> Instant {
        self.now
    }

    /// Returns true if a controller is connected.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Returns true while the button is held.
    pub fn held(&self, button: Button) -> bool {
        self.current.pressed(button)
    }

    /// Returns true only on the tick the button went down.
    pub fn pressed(&self, button: Button) -> bool {
        self.current.pressed(button) && !self.previous.pressed(button)
    }

    pub fn axis(&self, axis: Axis) -> f64 {
        self.current.axis(axis)
    }

    pub fn trigger(&self, trigger: Trigger) -> f64 {
        self.current.trigger(trigger)
    }

    /// Returns true only on the tick the trigger was pulled past halfway.
    pub fn pulled(&self, trigger: Trigger) -> bool {
        self.current.trigger(trigger) >= TRIGGER_THRESHOLD
            && self.previous.trigger(trigger) < TRIGGER_THRESHOLD
    }
}

/// Turns successive snapshots into per-tick input with edges.
#[derive(Debug, Default)]
pub struct InputTracker {
    previous: ControllerState,
}

impl InputTracker {
    pub fn new() -> InputTracker {
        InputTracker::default()
    }

    /// Samples the controller for this tick.
    pub fn sample(&mut self, gamepad: &dyn Gamepad, now: Instant) -> Input {
        self.track(gamepad.snapshot(), now)
    }

    /// Builds this tick's input from a snapshot.
    pub fn track(&mut self, snapshot: Option<ControllerState>, now: Instant) -> Input {
        match snapshot {
            Some(current) => {
                let previous = std::mem::replace(&mut self.previous, current.clone());
                Input::new(now, current, previous)
            }
            None => {
                self.previous = ControllerState::default();
                Input::neutral(now)
            }
        }
    }
}

/// Holds off repeated actions until an interval has passed since the last accepted one.
#[derive(Debug, Clone)]
pub struct Debounce {
    interval: Duration,
    last: Option<Instant>,
}

impl Debounce {
    pub fn new(interval: Duration) -> Debounce {
        Debounce {
            interval,
            last: None,
        }
    }

    /// Gets the interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns true if an action would be accepted now.
    pub fn ready(&self, now: Instant) -> bool {
        match self.last {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        }
    }

    /// Accepts the action if ready, recording when.
    pub fn accept(&mut self, now: Instant) -> bool {
        if !self.ready(now) {
            return false;
        }
        self.last = Some(now);
        true
    }
}
