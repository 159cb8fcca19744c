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

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, span, warn, Level};

use crate::config;

use super::{Axis, Button, ControllerState, Gamepad, Indicator, Trigger};

/// Length of an event line, without its newline.
pub const LINE_LENGTH: usize = 139;

/// How long to wait before reopening the event stream.
const REOPEN_DELAY: Duration = Duration::from_secs(1);

const AXES: [(Axis, usize, usize); 4] = [
    (Axis::LeftX, 3, 9),
    (Axis::LeftY, 13, 19),
    (Axis::RightX, 24, 30),
    (Axis::RightY, 34, 40),
];

const BUTTONS: [(Button, usize); 15] = [
    (Button::DpadUp, 45),
    (Button::DpadDown, 50),
    (Button::DpadLeft, 55),
    (Button::DpadRight, 60),
    (Button::Back, 68),
    (Button::Guide, 76),
    (Button::Start, 84),
    (Button::LeftThumb, 90),
    (Button::RightThumb, 95),
    (Button::A, 100),
    (Button::B, 104),
    (Button::X, 108),
    (Button::Y, 112),
    (Button::LeftBumper, 118),
    (Button::RightBumper, 123),
];

const TRIGGERS: [(Trigger, usize, usize); 2] = [(Trigger::Left, 129, 132), (Trigger::Right, 136, 139)];

/// Scales a raw stick reading to [-1.0, 1.0], treating readings inside the deadzone as centred.
pub fn scale_axis(raw: i32, deadzone: i32) -> f64 {
    if raw.abs() < deadzone {
        0.0
    } else if raw < 0 {
        f64::from(raw + deadzone) / (32768.0 - f64::from(deadzone))
    } else {
        f64::from(raw - deadzone) / (32767.0 - f64::from(deadzone))
    }
}

/// Decodes an xboxdrv event line. Anything that isn't a full event line means the
/// controller has dropped off and yields None.
pub fn decode(line: &str, deadzone: i32) -> Option<ControllerState> {
    let line = line.trim_end_matches(|c: char| c == '\r' || c == '\n');
    if line.len() < LINE_LENGTH {
        return None;
    }

    let number = |start: usize, end: usize| line.get(start..end)?.trim().parse::<i32>().ok();

    let mut state = ControllerState::default();
    for (axis, start, end) in AXES {
        state.set_axis(axis, scale_axis(number(start, end)?, deadzone));
    }
    for (button, index) in BUTTONS {
        state.set_pressed(button, line.get(index..index + 1)? == "1");
    }
    for (trigger, start, end) in TRIGGERS {
        state.set_trigger(trigger, f64::from(number(start, end)?) / 255.0);
    }
    Some(state)
}

/// The LED pattern xboxdrv shows for an indicator.
pub fn led_code(indicator: Indicator, id: u8) -> Option<u8> {
    match indicator {
        Indicator::StageEdit => Some(10),
        Indicator::SceneEdit => Some(13),
        Indicator::SceneRun => Some(1),
        Indicator::Passthrough => Some(id.saturating_add(1)),
        Indicator::Technical | Indicator::Production => None,
    }
}

/// A controller read from the event stream of an xboxdrv process.
pub struct Driver {
    path: Option<PathBuf>,
    deadzone: i32,
    id: u8,
    state: Arc<RwLock<Option<ControllerState>>>,
}

impl Driver {
    pub fn new(config: &config::Controller) -> Driver {
        Driver {
            path: config.path().cloned(),
            deadzone: config.deadzone(),
            id: config.id(),
            state: Arc::new(RwLock::new(None)),
        }
    }

    /// Starts reading the event stream. Returns None if no stream is configured.
    pub fn start(&self) -> Option<JoinHandle<()>> {
        let path = self.path.clone()?;
        let state = Arc::clone(&self.state);
        let deadzone = self.deadzone;
        Some(tokio::task::spawn_blocking(move || {
            let span = span!(Level::INFO, "xboxdrv driver");
            let _enter = span.enter();

            info!(path = path.display().to_string(), "Controller driver started.");
            // The driver holds the other reference; stop once it is dropped.
            while Arc::strong_count(&state) > 1 {
                if let Err(e) = Self::read_stream(&path, &state, deadzone) {
                    warn!(err = e.to_string(), "Unable to read controller events.");
                }
                *state.write() = None;
                std::thread::sleep(REOPEN_DELAY);
            }
        }))
    }

    fn read_stream(
        path: &Path,
        state: &RwLock<Option<ControllerState>>,
        deadzone: i32,
    ) -> Result<(), io::Error> {
        let file = File::open(path)?;
        Self::monitor_io(BufReader::new(file), state, deadzone)?;
        info!("Controller event stream closed.");
        Ok(())
    }

    /// Reads event lines until the stream ends, publishing each decoded state.
    fn monitor_io<R>(
        reader: R,
        state: &RwLock<Option<ControllerState>>,
        deadzone: i32,
    ) -> Result<(), io::Error>
    where
        R: BufRead,
    {
        for line in reader.lines() {
            let line = line?;
            let decoded = decode(&line, deadzone);
            if decoded.is_none() {
                debug!(line, "Controller not reporting.");
            }
            *state.write() = decoded;
        }
        Ok(())
    }
}

impl Gamepad for Driver {
    fn snapshot(&self) -> Option<ControllerState> {
        self.state.read().clone()
    }

    fn indicate(&self, indicator: Indicator) {
        match led_code(indicator, self.id) {
            Some(led) => info!(indicator = indicator.to_string(), led, "Controller indicator."),
            None => debug!(indicator = indicator.to_string(), "No LED for indicator."),
        }
    }
}
