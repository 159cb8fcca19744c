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

use glam::DVec3;
use tracing::{debug, error, info, warn};

use crate::config::store::SceneRecord;
use crate::config::{Store, StoreError};
use crate::controller::{Axis, Button, Debounce, Input, Trigger};
use crate::dmx::frame::Frame;
use crate::lighting::group::ALL;
use crate::lighting::{Show, Target};

pub const DEFAULT_SPEED: f64 = 40.0;
pub const DEFAULT_TARGET: DVec3 = DVec3::new(1.0, 1.0, 5.0);

const SPEED_STEP: f64 = 5.0;
const MIN_SPEED: f64 = 2.0;
const MAX_SPEED: f64 = 100.0;

const HEIGHT_STEP: f64 = 0.5;
const MIN_HEIGHT: f64 = 1.0;
const MAX_HEIGHT: f64 = 20.0;

/// The color the group lights up in while editing.
const LIGHT_COLOR: &str = "white";

/// A stored target and the group that follows it.
#[derive(Debug)]
pub struct Scene {
    id: u8,
    name: String,
    speed: f64,
    target: Target,
    group: String,
    /// Set while command handling applies during run.
    editing: bool,
    /// Set while the group has been lit from the controller.
    lights: bool,
    settle: Debounce,
}

impl Scene {
    /// Loads the scene from the store, falling back to defaults, and aims its group.
    pub fn new(show: &mut Show, store: &Store, id: u8, settle: Duration) -> Scene {
        let record = match store.scene(id) {
            Ok(Some(record)) => record,
            Ok(None) => {
                info!(scene = id, "New scene, using defaults.");
                Self::default_record(show, id)
            }
            Err(e) => {
                warn!(scene = id, err = e.to_string(), "Unable to read scenes, using defaults.");
                Self::default_record(show, id)
            }
        };

        let group = if show.group(&record.fixture_group).is_some() {
            record.fixture_group
        } else {
            warn!(
                scene = id,
                group = record.fixture_group,
                "Scene group no longer exists, using all fixtures."
            );
            ALL.to_string()
        };

        let scene = Scene {
            id,
            target: Target::new(&record.name, DVec3::new(record.x, record.y, record.z)),
            name: record.name,
            speed: record.speed.clamp(MIN_SPEED, MAX_SPEED),
            group,
            editing: false,
            lights: false,
            settle: Debounce::new(settle),
        };
        info!(
            scene = scene.id,
            name = scene.name,
            group = scene.group,
            "Scene loaded."
        );
        show.point_group(&scene.group, scene.target.pos());
        scene
    }

    fn default_record(show: &Show, id: u8) -> SceneRecord {
        SceneRecord {
            name: id.to_string(),
            speed: DEFAULT_SPEED,
            x: DEFAULT_TARGET.x,
            y: DEFAULT_TARGET.y,
            z: DEFAULT_TARGET.z,
            fixture_group: show
                .group_names()
                .first()
                .copied()
                .unwrap_or(ALL)
                .to_string(),
        }
    }

    /// Gets the scene id.
    pub fn id(&self) -> u8 {
        self.id
    }

    /// Gets the scene name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Gets the name of the active group.
    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn lights_on(&self) -> bool {
        self.lights
    }

    /// Plays the scene. Only position channels are written so the console keeps the looks.
    pub fn run(&mut self, show: &mut Show, store: &Store, input: &Input, frame: &mut Frame) {
        if input.pressed(Button::Start) {
            self.editing = !self.editing;
            debug!(scene = self.id, editing = self.editing, "Toggled scene editing.");
        }
        if self.editing {
            self.commands(show, store, input);
        }
        self.movement(show, input);
        show.encode_group_position(&self.group, frame);
    }

    /// Edits the scene, rendering every channel of the group.
    pub fn edit(&mut self, show: &mut Show, store: &Store, input: &Input, frame: &mut Frame) {
        self.commands(show, store, input);
        self.toggle_lights(show, input);
        self.movement(show, input);
        show.encode_group(&self.group, frame);
    }

    /// Releases the scene, turning off anything it lit.
    pub fn exit(&mut self, show: &mut Show) {
        if self.lights {
            show.group_off(&self.group);
            self.lights = false;
        }
        debug!(scene = self.id, "Scene released.");
    }

    /// Writes the scene to the store.
    pub fn save(&self, store: &Store) -> Result<(), StoreError> {
        store.save_scene(self.id, &self.record())
    }

    /// Gets the persisted form of the scene.
    pub fn record(&self) -> SceneRecord {
        let pos = self.target.pos();
        SceneRecord {
            name: self.name.clone(),
            speed: self.speed,
            x: pos.x,
            y: pos.y,
            z: pos.z,
            fixture_group: self.group.clone(),
        }
    }

    fn commands(&mut self, show: &mut Show, store: &Store, input: &Input) {
        if input.pressed(Button::B) {
            match self.save(store) {
                Ok(()) => info!(scene = self.id, "Saved scene."),
                Err(e) => error!(scene = self.id, err = e.to_string(), "Unable to save scene."),
            }
        } else if input.pressed(Button::RightBumper) {
            self.rotate_group(show, 1);
        } else if input.pressed(Button::LeftBumper) {
            self.rotate_group(show, -1);
        }
    }

    fn rotate_group(&mut self, show: &mut Show, step: isize) {
        let names = show.group_names();
        let Some(current) = names.iter().position(|name| *name == self.group) else {
            return;
        };
        let next = (current as isize + step).rem_euclid(names.len() as isize) as usize;
        let next = names[next].to_string();

        show.group_off(&self.group);
        self.lights = false;
        self.group = next;
        show.point_group(&self.group, self.target.pos());
        info!(scene = self.id, group = self.group, "Switched group.");
    }

    fn toggle_lights(&mut self, show: &mut Show, input: &Input) {
        if !input.pulled(Trigger::Right) {
            return;
        }
        self.lights = !self.lights;
        if self.lights {
            show.group_on(&self.group, LIGHT_COLOR);
        } else {
            show.group_off(&self.group);
        }
        debug!(scene = self.id, lights = self.lights, "Toggled lights.");
    }

    fn movement(&mut self, show: &mut Show, input: &Input) {
        let speed_step = if input.pressed(Button::DpadLeft) {
            SPEED_STEP
        } else if input.pressed(Button::DpadRight) {
            -SPEED_STEP
        } else {
            0.0
        };
        if speed_step != 0.0 && self.settle.accept(input.now()) {
            self.speed = (self.speed + speed_step).clamp(MIN_SPEED, MAX_SPEED);
            debug!(scene = self.id, speed = self.speed, "Speed changed.");
        }

        let mut pos = self.target.pos();
        if input.pressed(Button::DpadUp) {
            pos.z = (pos.z + HEIGHT_STEP).clamp(MIN_HEIGHT, MAX_HEIGHT);
        } else if input.pressed(Button::DpadDown) {
            pos.z = (pos.z - HEIGHT_STEP).clamp(MIN_HEIGHT, MAX_HEIGHT);
        }

        let (rx, ry) = (input.axis(Axis::RightX), input.axis(Axis::RightY));
        if rx != 0.0 || ry != 0.0 {
            pos.x += self.speed * rx / 100.0;
            pos.y += self.speed * ry / 100.0;
        }

        if self.target.move_to(pos) {
            debug!(scene = self.id, x = pos.x, y = pos.y, z = pos.z, "Target moved.");
            show.point_group(&self.group, pos);
        }
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pos = self.target.pos();
        write!(
            f,
            "scene {} ({}) {} at ({}, {}, {}) speed {}",
            self.id, self.name, self.group, pos.x, pos.y, pos.z, self.speed
        )
    }
}

#[cfg(test)]
mod test {
    use std::error::Error;
    use std::time::Instant;

    use crate::controller::ControllerState;
    use crate::lighting::{profile::Channel, Fixture};
    use crate::testutil::test_show;

    use super::*;

    const SETTLE: Duration = Duration::from_millis(200);

    fn input(now: Instant, current: &ControllerState) -> Input {
        Input::new(now, current.clone(), ControllerState::default())
    }

    fn pressing(buttons: &[Button]) -> ControllerState {
        let mut state = ControllerState::default();
        for button in buttons {
            state.set_pressed(*button, true);
        }
        state
    }

    fn frame_value(show: &Show, fixture: &str, channel: &Channel, frame: &Frame) -> Option<u8> {
        let fixture = show.fixture(fixture)?;
        let index = fixture.profile().index_of(channel)?;
        Some(frame.get(usize::from(fixture.id()) + index - 1))
    }

    #[test]
    fn test_new_scene_defaults() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let store = Store::new(dir.path());
        let mut show = test_show();
        let before = show.fixture("left-1").map(Fixture::pan);
        let scene = Scene::new(&mut show, &store, 4, SETTLE);

        assert_eq!("4", scene.name());
        assert_eq!(DEFAULT_SPEED, scene.speed());
        assert_eq!(DEFAULT_TARGET, scene.target().pos());
        assert_eq!(ALL, scene.group());
        assert!(!scene.is_editing());
        assert_ne!(before, show.fixture("left-1").map(Fixture::pan));
        Ok(())
    }

    #[test]
    fn test_missing_group_falls_back_to_all() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let store = Store::new(dir.path());
        store.save_scene(
            2,
            &SceneRecord {
                name: "gone".to_string(),
                speed: 20.0,
                x: 3.0,
                y: 3.0,
                z: 2.0,
                fixture_group: "balcony".to_string(),
            },
        )?;
        let scene = Scene::new(&mut test_show(), &store, 2, SETTLE);
        assert_eq!(ALL, scene.group());
        assert_eq!("gone", scene.name());
        assert_eq!(20.0, scene.speed());
        Ok(())
    }

    #[test]
    fn test_save_and_reload() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let store = Store::new(dir.path());
        store.save_scene(
            7,
            &SceneRecord {
                name: "7".to_string(),
                speed: 40.0,
                x: 1.0,
                y: 2.0,
                z: 5.0,
                fixture_group: "stage-left".to_string(),
            },
        )?;
        store.save_scene(
            9,
            &SceneRecord {
                name: "encore".to_string(),
                speed: 10.0,
                x: 0.0,
                y: 0.0,
                z: 1.0,
                fixture_group: ALL.to_string(),
            },
        )?;

        let mut show = test_show();
        let scene = Scene::new(&mut show, &store, 7, SETTLE);
        scene.save(&store)?;

        let reloaded = Scene::new(&mut show, &store, 7, SETTLE);
        assert_eq!(DVec3::new(1.0, 2.0, 5.0), reloaded.target().pos());
        assert_eq!("stage-left", reloaded.group());
        assert_eq!(Some("encore"), store.scene(9)?.as_ref().map(|s| s.name.as_str()));
        Ok(())
    }

    #[test]
    fn test_movement() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let store = Store::new(dir.path());
        let mut show = test_show();
        let mut scene = Scene::new(&mut show, &store, 1, SETTLE);
        let mut frame = Frame::new();
        let start = Instant::now();

        // Speed steps are held off until the settle delay passes.
        let left = pressing(&[Button::DpadLeft]);
        scene.run(&mut show, &store, &input(start, &left), &mut frame);
        assert_eq!(45.0, scene.speed());
        scene.run(&mut show, &store, &input(start + Duration::from_millis(50), &left), &mut frame);
        assert_eq!(45.0, scene.speed());
        let right = pressing(&[Button::DpadRight]);
        scene.run(&mut show, &store, &input(start + SETTLE, &right), &mut frame);
        assert_eq!(40.0, scene.speed());

        let up = pressing(&[Button::DpadUp]);
        scene.run(&mut show, &store, &input(start, &up), &mut frame);
        assert_eq!(5.5, scene.target().pos().z);

        let mut stick = ControllerState::default();
        stick.set_axis(Axis::RightX, 0.5);
        stick.set_axis(Axis::RightY, -1.0);
        scene.run(&mut show, &store, &input(start, &stick), &mut frame);
        assert_eq!(DVec3::new(1.2, 0.6, 5.5), scene.target().pos());
        Ok(())
    }

    #[test]
    fn test_limits() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let store = Store::new(dir.path());
        let mut show = test_show();
        let mut scene = Scene::new(&mut show, &store, 1, Duration::ZERO);
        let mut frame = Frame::new();
        let now = Instant::now();

        for _ in 0..50 {
            scene.run(&mut show, &store, &input(now, &pressing(&[Button::DpadRight])), &mut frame);
            scene.run(&mut show, &store, &input(now, &pressing(&[Button::DpadDown])), &mut frame);
        }
        assert_eq!(MIN_SPEED, scene.speed());
        assert_eq!(MIN_HEIGHT, scene.target().pos().z);

        for _ in 0..50 {
            scene.run(&mut show, &store, &input(now, &pressing(&[Button::DpadLeft])), &mut frame);
            scene.run(&mut show, &store, &input(now, &pressing(&[Button::DpadUp])), &mut frame);
        }
        assert_eq!(MAX_SPEED, scene.speed());
        assert_eq!(MAX_HEIGHT, scene.target().pos().z);
        Ok(())
    }

    #[test]
    fn test_run_writes_only_positions() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let store = Store::new(dir.path());
        let mut show = test_show();
        let mut scene = Scene::new(&mut show, &store, 1, SETTLE);
        let mut frame = Frame::from_slice(&[77; 512]);
        scene.run(&mut show, &store, &input(Instant::now(), &ControllerState::default()), &mut frame);

        let left = show.fixture("left-1").ok_or("missing left-1")?;
        let (coarse, _) = crate::lighting::codec::split_wide(left.pan());
        assert_eq!(Some(coarse), frame_value(&show, "left-1", &Channel::HCoarse, &frame));
        assert_eq!(Some(77), frame_value(&show, "left-1", &Channel::Intensity, &frame));
        assert_eq!(Some(77), frame_value(&show, "left-1", &Channel::Focus, &frame));
        Ok(())
    }

    #[test]
    fn test_run_start_toggles_commands() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let store = Store::new(dir.path());
        let mut show = test_show();
        let mut scene = Scene::new(&mut show, &store, 1, SETTLE);
        let mut frame = Frame::new();
        let now = Instant::now();

        // Commands are ignored until start is pressed.
        scene.run(&mut show, &store, &input(now, &pressing(&[Button::RightBumper])), &mut frame);
        assert_eq!(ALL, scene.group());

        scene.run(&mut show, &store, &input(now, &pressing(&[Button::Start])), &mut frame);
        assert!(scene.is_editing());
        scene.run(&mut show, &store, &input(now, &pressing(&[Button::RightBumper])), &mut frame);
        assert_eq!("stage-left", scene.group());

        scene.run(&mut show, &store, &input(now, &pressing(&[Button::Start])), &mut frame);
        assert!(!scene.is_editing());
        Ok(())
    }

    #[test]
    fn test_edit_rotates_groups_and_lights() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let store = Store::new(dir.path());
        let mut show = test_show();
        let mut scene = Scene::new(&mut show, &store, 1, SETTLE);
        let mut frame = Frame::new();
        let now = Instant::now();

        let mut pull = ControllerState::default();
        pull.set_trigger(Trigger::Right, 1.0);
        scene.edit(&mut show, &store, &input(now, &pull), &mut frame);
        assert!(scene.lights_on());
        assert_eq!(Some(255), frame_value(&show, "left-1", &Channel::Intensity, &frame));

        // Backwards from the first group wraps to the last.
        scene.edit(&mut show, &store, &input(now, &pressing(&[Button::LeftBumper])), &mut frame);
        assert_eq!("stage-right", scene.group());
        assert!(!scene.lights_on());
        assert!(!show.fixture("left-1").is_some_and(Fixture::is_lit));

        scene.edit(&mut show, &store, &input(now, &pressing(&[Button::RightBumper])), &mut frame);
        assert_eq!(ALL, scene.group());

        scene.edit(&mut show, &store, &input(now, &pressing(&[Button::B])), &mut frame);
        assert_eq!(Some(ALL.to_string()), store.scene(1)?.map(|s| s.fixture_group));
        Ok(())
    }
}
