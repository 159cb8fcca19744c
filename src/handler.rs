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

use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{info, span, Instrument, Level};

use crate::config;
use crate::controller::{xboxdrv, Disconnected, Gamepad, InputTracker};
use crate::dmx::ola_client::RealOlaClient;
use crate::dmx::{Frame, Sender, Source};
use crate::mode::ModeController;

/// Frames buffered between the source and the tick loop.
const FRAME_BUFFER: usize = 16;

/// Runs every inbound frame through the mode controller and on to the output.
pub struct Handler {
    controller: ModeController,
    gamepad: Arc<dyn Gamepad>,
    tracker: InputTracker,
    sender: Sender,
}

impl Handler {
    pub fn new(controller: ModeController, gamepad: Arc<dyn Gamepad>, sender: Sender) -> Handler {
        Handler {
            controller,
            gamepad,
            tracker: InputTracker::new(),
            sender,
        }
    }

    /// Handles frames until the source closes.
    pub async fn run(mut self, mut frames: mpsc::Receiver<Frame>) {
        async move {
            info!(universe = self.sender.universe(), "Handler started.");
            while let Some(frame) = frames.recv().await {
                self.handle(frame);
            }
            info!("Frame source closed.");
        }
        .instrument(span!(Level::INFO, "handler"))
        .await
    }

    /// Ticks one frame and queues the result.
    pub fn handle(&mut self, frame: Frame) {
        let input = self.tracker.sample(self.gamepad.as_ref(), Instant::now());
        let frame = self.controller.tick(frame, &input);
        self.sender.send(frame);
    }
}

/// Loads the configuration and runs the engine until the frame source closes.
pub async fn start(
    path: &Path,
    show: Option<&str>,
    stage: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    let rig = config::load(path)?;
    let show = rig.show(show)?;
    let stage = stage.unwrap_or(rig.config().stage());
    let dmx = rig.config().dmx();

    let driver = Arc::new(xboxdrv::Driver::new(rig.config().controller()));
    let gamepad: Arc<dyn Gamepad> = match driver.start() {
        Some(_) => driver,
        None => {
            info!("No controller configured.");
            Arc::new(Disconnected {})
        }
    };

    let client = RealOlaClient::connect(dmx.ola_port())?;
    let sender = Sender::new(dmx.output().universe(), Box::new(client));

    let controller = ModeController::new(
        show,
        rig.store(),
        dmx.input().id(),
        stage,
        rig.settle(),
        Arc::clone(&gamepad),
    );

    let (frames_sender, frames) = mpsc::channel(FRAME_BUFFER);
    let source = Source::new(dmx.input().path().cloned()).start(frames_sender);
    Handler::new(controller, gamepad, sender).run(frames).await;
    source.await?;
    Ok(())
}
