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

use std::time::Duration;

use crate::config::Store;
use crate::controller::{Indicator, Input};
use crate::dmx::frame::Frame;
use crate::lighting::Show;
use crate::scene::Scene;
use crate::stage::Stage;

use super::Mode;

/// The component that owns the frame while a mode is active.
#[derive(Debug)]
pub enum Working {
    Passthrough,
    SceneRun(Scene),
    SceneEdit(Scene),
    StageEdit(Stage),
}

impl Working {
    /// Builds the component for the mode.
    pub fn enter(
        mode: Mode,
        show: &mut Show,
        store: &Store,
        scene: u8,
        stage: &str,
        frame: &Frame,
        settle: Duration,
    ) -> Working {
        match mode {
            Mode::Passthru => Working::Passthrough,
            Mode::SceneRun => Working::SceneRun(Scene::new(show, store, scene, settle)),
            Mode::SceneEdit => Working::SceneEdit(Scene::new(show, store, scene, settle)),
            Mode::StageEdit => Working::StageEdit(Stage::new(show, store, stage, frame, settle)),
        }
    }

    /// Releases the component.
    pub fn exit(&mut self, show: &mut Show) {
        match self {
            Working::Passthrough => {}
            Working::SceneRun(scene) | Working::SceneEdit(scene) => scene.exit(show),
            Working::StageEdit(stage) => stage.exit(show),
        }
    }

    /// Runs one tick against the frame.
    pub fn advance(&mut self, show: &mut Show, store: &Store, input: &Input, frame: &mut Frame) {
        match self {
            Working::Passthrough => {}
            Working::SceneRun(scene) => scene.run(show, store, input, frame),
            Working::SceneEdit(scene) => scene.edit(show, store, input, frame),
            Working::StageEdit(stage) => stage.edit(show, store, input, frame),
        }
    }

    /// Gets the mode this component serves.
    pub fn mode(&self) -> Mode {
        match self {
            Working::Passthrough => Mode::Passthru,
            Working::SceneRun(_) => Mode::SceneRun,
            Working::SceneEdit(_) => Mode::SceneEdit,
            Working::StageEdit(_) => Mode::StageEdit,
        }
    }

    /// Gets the scene, if a scene is active.
    pub fn scene(&self) -> Option<&Scene> {
        match self {
            Working::SceneRun(scene) | Working::SceneEdit(scene) => Some(scene),
            _ => None,
        }
    }

    /// Gets the stage, if one is active.
    pub fn stage(&self) -> Option<&Stage> {
        match self {
            Working::StageEdit(stage) => Some(stage),
            _ => None,
        }
    }

    /// Gets what the controller should show for this component.
    pub fn indicator(&self) -> Indicator {
        match self {
            Working::Passthrough => Indicator::Passthrough,
            Working::SceneRun(_) => Indicator::SceneRun,
            Working::SceneEdit(_) => Indicator::SceneEdit,
            Working::StageEdit(_) => Indicator::StageEdit,
        }
    }
}
