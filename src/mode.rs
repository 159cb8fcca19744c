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
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::Store;
use crate::controller::{Button, Debounce, Gamepad, Indicator, Input};
use crate::dmx::frame::Frame;
use crate::lighting::Show;
use crate::stage::Stage;

pub mod working;

pub use working::Working;

/// Who is authoritative over the console's mode field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// The console decides.
    Production,
    /// The handheld controller may override the console.
    Technical,
}

impl From<u8> for Operation {
    fn from(value: u8) -> Self {
        match value {
            1 => Operation::Technical,
            _ => Operation::Production,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Production => write!(f, "production"),
            Operation::Technical => write!(f, "technical"),
        }
    }
}

/// What the engine does with each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Passthru,
    SceneRun,
    SceneEdit,
    StageEdit,
}

impl Mode {
    fn is_scene(self) -> bool {
        matches!(self, Mode::SceneRun | Mode::SceneEdit)
    }
}

impl From<u8> for Mode {
    fn from(value: u8) -> Self {
        match value {
            1 => Mode::SceneRun,
            2 => Mode::SceneEdit,
            3 => Mode::StageEdit,
            _ => Mode::Passthru,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Passthru => write!(f, "passthru"),
            Mode::SceneRun => write!(f, "scene run"),
            Mode::SceneEdit => write!(f, "scene edit"),
            Mode::StageEdit => write!(f, "stage edit"),
        }
    }
}

/// The per-frame state machine deciding which of the console, a stored scene, or the
/// controller drives the fixtures.
pub struct ModeController {
    show: Show,
    store: Store,
    /// The mode channel. Operation is read one channel below and the scene one above.
    control_id: u16,
    stage: String,
    settle: Duration,
    gamepad: Arc<dyn Gamepad>,

    operation: Operation,
    mode: Mode,
    scene: u8,
    /// The mode chosen from the controller while technical.
    controller_mode: Option<Mode>,

    operation_settle: Debounce,
    mode_settle: Debounce,
    working: Working,
}

impl ModeController {
    /// Creates a new controller starting in production passthrough. The stage's stored
    /// calibration is applied to the show before any mode runs.
    pub fn new(
        mut show: Show,
        store: Store,
        control_id: u16,
        stage: &str,
        settle: Duration,
        gamepad: Arc<dyn Gamepad>,
    ) -> ModeController {
        match store.stage(stage) {
            Ok(Some(record)) => {
                Stage::apply(&mut show, &record);
                info!(stage, fixtures = record.len(), "Applied stored calibration.");
            }
            Ok(None) => debug!(stage, "No stored calibration."),
            Err(e) => warn!(stage, err = e.to_string(), "Unable to read stored calibration."),
        }
        info!(
            show = show.name(),
            control_id,
            stage,
            settle = format!("{:?}", settle),
            "Mode controller started."
        );
        ModeController {
            show,
            store,
            control_id,
            stage: stage.to_string(),
            settle,
            gamepad,
            operation: Operation::Production,
            mode: Mode::Passthru,
            scene: 0,
            controller_mode: None,
            operation_settle: Debounce::new(settle),
            mode_settle: Debounce::new(settle),
            working: Working::Passthrough,
        }
    }

    /// Gets the accepted operation.
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Gets the accepted mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Gets the active component.
    pub fn working(&self) -> &Working {
        &self.working
    }

    /// Gets the show.
    pub fn show(&self) -> &Show {
        &self.show
    }

    /// Reads the control fields from the frame.
    pub fn read_control(&self, frame: &Frame) -> (Operation, Mode, u8) {
        let id = usize::from(self.control_id);
        (
            Operation::from(frame.get(id.saturating_sub(1))),
            Mode::from(frame.get(id)),
            frame.get(id + 1),
        )
    }

    /// Runs one frame through the state machine and returns the frame to send.
    pub fn tick(&mut self, mut frame: Frame, input: &Input) -> Frame {
        let (operation, console_mode, scene) = self.read_control(&frame);
        let now = input.now();

        if operation != self.operation && self.operation_settle.accept(now) {
            info!(from = %self.operation, to = %operation, "Operation changed.");
            self.operation = operation;
            self.controller_mode = None;
            self.gamepad.indicate(match operation {
                Operation::Production => Indicator::Production,
                Operation::Technical => Indicator::Technical,
            });
        }

        let mode = match self.operation {
            Operation::Production => console_mode,
            Operation::Technical => self.controller_override(console_mode, input),
        };

        let changed = mode != self.mode || (mode.is_scene() && scene != self.scene);
        if changed && self.mode_settle.accept(now) {
            self.switch(mode, scene, &frame);
        }

        self.working
            .advance(&mut self.show, &self.store, input, &mut frame);
        frame
    }

    /// Applies controller mode edges and returns the mode in effect.
    fn controller_override(&mut self, console_mode: Mode, input: &Input) -> Mode {
        let effective = self.controller_mode.unwrap_or(console_mode);
        let chosen = if input.pressed(Button::Back) {
            Some(Mode::Passthru)
        } else if input.pressed(Button::Start) && effective == Mode::Passthru {
            Some(Mode::SceneEdit)
        } else if input.pressed(Button::Guide) && effective == Mode::Passthru {
            Some(Mode::StageEdit)
        } else {
            None
        };
        if let Some(chosen) = chosen {
            debug!(mode = %chosen, "Controller chose mode.");
            self.controller_mode = Some(chosen);
        }
        self.controller_mode.unwrap_or(console_mode)
    }

    fn switch(&mut self, mode: Mode, scene: u8, frame: &Frame) {
        info!(from = %self.mode, to = %mode, scene, "Mode changed.");
        self.working.exit(&mut self.show);
        self.working = Working::enter(
            mode,
            &mut self.show,
            &self.store,
            scene,
            &self.stage,
            frame,
            self.settle,
        );
        self.gamepad.indicate(self.working.indicator());
        self.mode = mode;
        self.scene = scene;
    }
}

#[cfg(test)]
mod test {
    use std::error::Error;
    use std::time::Instant;

    use tempfile::TempDir;

    use crate::config::store::{Calibration, StageRecord};
    use crate::config::StoreError;
    use crate::controller::{mock, InputTracker, Trigger};
    use crate::lighting::profile::Channel;
    use crate::lighting::Fixture;
    use crate::testutil::{test_show, CONTROL_ID};

    use super::*;

    const SETTLE: Duration = Duration::from_millis(200);

    struct Harness {
        _dir: TempDir,
        controller: ModeController,
        gamepad: Arc<mock::Gamepad>,
        tracker: InputTracker,
        now: Instant,
    }

    impl Harness {
        fn new() -> Result<Harness, Box<dyn Error>> {
            Harness::with_store(|_| Ok(()))
        }

        /// Builds the harness after seeding the store.
        fn with_store<F>(seed: F) -> Result<Harness, Box<dyn Error>>
        where
            F: FnOnce(&Store) -> Result<(), StoreError>,
        {
            let dir = tempfile::tempdir()?;
            let store = Store::new(dir.path());
            seed(&store)?;
            let gamepad = Arc::new(mock::Gamepad::new());
            let controller = ModeController::new(
                test_show(),
                store,
                CONTROL_ID,
                "main",
                SETTLE,
                gamepad.clone(),
            );
            Ok(Harness {
                _dir: dir,
                controller,
                gamepad,
                tracker: InputTracker::new(),
                now: Instant::now(),
            })
        }

        /// Advances time and runs a frame with the given control fields.
        fn tick(&mut self, after: Duration, operation: u8, mode: u8, scene: u8) -> Frame {
            self.tick_frame(after, control_frame(operation, mode, scene))
        }

        fn tick_frame(&mut self, after: Duration, frame: Frame) -> Frame {
            self.now += after;
            let input = self.tracker.sample(self.gamepad.as_ref(), self.now);
            self.controller.tick(frame, &input)
        }

        fn tap(&mut self, button: Button, operation: u8, mode: u8, scene: u8) {
            self.gamepad.press(button);
            self.tick(SETTLE, operation, mode, scene);
            self.gamepad.release(button);
        }
    }

    fn control_frame(operation: u8, mode: u8, scene: u8) -> Frame {
        let mut frame = Frame::new();
        let id = usize::from(CONTROL_ID);
        frame.set(id - 1, operation);
        frame.set(id, mode);
        frame.set(id + 1, scene);
        frame
    }

    #[test]
    fn test_unknown_values() {
        assert_eq!(Mode::Passthru, Mode::from(9));
        assert_eq!(Mode::StageEdit, Mode::from(3));
        assert_eq!(Operation::Production, Operation::from(200));
        assert_eq!(Operation::Technical, Operation::from(1));
    }

    #[test]
    fn test_passthrough_leaves_frame_alone() -> Result<(), Box<dyn Error>> {
        let mut harness = Harness::new()?;
        let mut frame = control_frame(0, 0, 0);
        for i in 0..50 {
            frame.set(i, 200);
        }
        let out = harness.tick_frame(SETTLE, frame.clone());
        assert_eq!(frame, out);
        assert!(matches!(harness.controller.working(), Working::Passthrough));
        Ok(())
    }

    #[test]
    fn test_technical_start_enters_scene_edit() -> Result<(), Box<dyn Error>> {
        let mut harness = Harness::new()?;
        harness.tick(SETTLE, 0, 0, 7);
        assert_eq!(Mode::Passthru, harness.controller.mode());

        harness.tick(SETTLE, 1, 0, 7);
        assert_eq!(Operation::Technical, harness.controller.operation());

        // The press lands right after the operation change.
        harness.gamepad.press(Button::Start);
        harness.tick(Duration::from_millis(1), 1, 0, 7);
        harness.gamepad.release(Button::Start);

        assert_eq!(Mode::SceneEdit, harness.controller.mode());
        let scene = harness.controller.working().scene().ok_or("no scene")?;
        assert_eq!(7, scene.id());
        assert!(matches!(harness.controller.working(), Working::SceneEdit(_)));
        assert_eq!(
            vec![Indicator::Technical, Indicator::SceneEdit],
            harness.gamepad.indicated()
        );
        Ok(())
    }

    #[test]
    fn test_production_ignores_controller() -> Result<(), Box<dyn Error>> {
        let mut harness = Harness::new()?;
        harness.tap(Button::Start, 0, 0, 1);
        harness.tap(Button::Guide, 0, 0, 1);
        assert_eq!(Mode::Passthru, harness.controller.mode());

        harness.tick(SETTLE, 0, 1, 1);
        assert_eq!(Mode::SceneRun, harness.controller.mode());
        Ok(())
    }

    #[test]
    fn test_controller_override_until_operation_changes() -> Result<(), Box<dyn Error>> {
        let mut harness = Harness::new()?;
        harness.tick(SETTLE, 1, 0, 1);
        harness.tap(Button::Guide, 1, 0, 1);
        assert_eq!(Mode::StageEdit, harness.controller.mode());

        // Start only works from passthrough.
        harness.tap(Button::Start, 1, 0, 1);
        assert_eq!(Mode::StageEdit, harness.controller.mode());

        // The override holds while the console stays put.
        harness.tick(SETTLE, 1, 0, 1);
        assert_eq!(Mode::StageEdit, harness.controller.mode());

        harness.tap(Button::Back, 1, 0, 1);
        assert_eq!(Mode::Passthru, harness.controller.mode());

        harness.tap(Button::Start, 1, 0, 1);
        assert_eq!(Mode::SceneEdit, harness.controller.mode());

        // Back to production hands control to the console.
        harness.tick(SETTLE, 0, 1, 1);
        assert_eq!(Operation::Production, harness.controller.operation());
        assert_eq!(Mode::SceneRun, harness.controller.mode());
        Ok(())
    }

    #[test]
    fn test_changes_inside_settle_are_retried() -> Result<(), Box<dyn Error>> {
        let mut harness = Harness::new()?;
        harness.tick(SETTLE, 0, 1, 1);
        assert_eq!(Mode::SceneRun, harness.controller.mode());

        harness.tick(Duration::from_millis(50), 0, 3, 1);
        assert_eq!(Mode::SceneRun, harness.controller.mode());

        harness.tick(SETTLE, 0, 3, 1);
        assert_eq!(Mode::StageEdit, harness.controller.mode());
        assert!(harness.controller.working().stage().is_some());
        Ok(())
    }

    #[test]
    fn test_scene_change_rebuilds_scene() -> Result<(), Box<dyn Error>> {
        let mut harness = Harness::new()?;
        harness.tick(SETTLE, 0, 1, 1);
        harness.tick(SETTLE, 0, 1, 2);
        assert_eq!(
            Some(2),
            harness.controller.working().scene().map(|scene| scene.id())
        );
        assert_eq!(
            vec![Indicator::SceneRun, Indicator::SceneRun],
            harness.gamepad.indicated()
        );
        Ok(())
    }

    #[test]
    fn test_leaving_releases_previous() -> Result<(), Box<dyn Error>> {
        let mut harness = Harness::new()?;
        harness.tick(SETTLE, 0, 2, 1);
        harness.gamepad.set_trigger(Trigger::Right, 1.0);
        let frame = harness.tick(SETTLE, 0, 2, 1);
        harness.gamepad.set_trigger(Trigger::Right, 0.0);

        // left-1 intensity is on channel 5.
        assert_eq!(255, frame.get(4));
        assert!(harness.controller.show().fixtures().any(Fixture::is_lit));

        let frame = harness.tick(SETTLE, 0, 0, 1);
        assert!(matches!(harness.controller.working(), Working::Passthrough));
        assert!(!harness.controller.show().fixtures().any(Fixture::is_lit));
        assert_eq!(0, frame.get(4));
        Ok(())
    }

    #[test]
    fn test_disconnected_controller_is_neutral() -> Result<(), Box<dyn Error>> {
        let mut harness = Harness::new()?;
        harness.tick(SETTLE, 1, 0, 1);
        harness.gamepad.press(Button::Start);
        harness.gamepad.disconnect();
        harness.tick(SETTLE, 1, 0, 1);
        assert_eq!(Mode::Passthru, harness.controller.mode());
        Ok(())
    }

    #[test]
    fn test_stored_calibration_applies_to_scenes() -> Result<(), Box<dyn Error>> {
        let mut harness = Harness::with_store(|store| {
            let record = StageRecord::from([(
                "left-1".to_string(),
                Calibration {
                    inverted: true,
                    reversed: true,
                    focus: Some(200),
                    pan: 0.0,
                    tilt: 0.0,
                },
            )]);
            store.save_stage("main", &record)
        })?;
        harness.tick(SETTLE, 0, 1, 1);
        assert!(matches!(harness.controller.working(), Working::SceneRun(_)));

        let Some(left) = harness.controller.show().fixture("left-1") else {
            panic!("missing fixture");
        };
        assert!(left.mount().inverted);
        assert!(left.mount().reversed);
        assert_eq!(Some(200), left.value(&Channel::Focus));

        // Fixtures without a stored calibration keep the mount from their aspect.
        let Some(right) = harness.controller.show().fixture("right-1") else {
            panic!("missing fixture");
        };
        assert!(right.mount().inverted);
        assert!(!right.mount().reversed);
        Ok(())
    }

    #[test]
    fn test_stage_edit_keeps_console_looks_out_of_scenes() -> Result<(), Box<dyn Error>> {
        let mut harness = Harness::new()?;
        // right-1 is outside the first pair. Its intensity is on channel 24.
        let mut frame = control_frame(0, 3, 1);
        frame.set(23, 255);
        harness.tick_frame(SETTLE, frame);
        assert_eq!(Mode::StageEdit, harness.controller.mode());

        let frame = harness.tick(SETTLE, 0, 2, 1);
        assert_eq!(Mode::SceneEdit, harness.controller.mode());
        let scene = harness.controller.working().scene().ok_or("no scene")?;
        assert!(!scene.lights_on());
        assert!(!harness.controller.show().fixtures().any(Fixture::is_lit));
        assert_eq!(0, frame.get(23));
        Ok(())
    }
}
