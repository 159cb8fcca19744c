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

use std::thread::{self, JoinHandle};

use crossbeam_channel::Receiver;
use tracing::{error, info, span, Level};

use super::frame::Frame;
use super::ola_client::OlaClient;

/// Hands finished frames to a dedicated OLA thread so the tick never waits on the network.
pub struct Sender {
    universe: u32,
    sender: Option<crossbeam_channel::Sender<Frame>>,
    handle: Option<JoinHandle<()>>,
}

impl Sender {
    /// Starts the sender thread for the output universe.
    pub fn new(universe: u32, client: Box<dyn OlaClient>) -> Sender {
        let (sender, receiver) = crossbeam_channel::unbounded::<Frame>();
        let handle = thread::spawn(move || Self::ola_thread(universe, client, receiver));
        info!(universe, "DMX sender started.");

        Sender {
            universe,
            sender: Some(sender),
            handle: Some(handle),
        }
    }

    /// Gets the output universe.
    pub fn universe(&self) -> u32 {
        self.universe
    }

    /// Queues a frame for transmission.
    pub fn send(&self, frame: Frame) {
        let Some(sender) = self.sender.as_ref() else {
            return;
        };
        if sender.send(frame).is_err() {
            error!(universe = self.universe, "DMX sender thread has stopped");
        }
    }

    fn ola_thread(universe: u32, mut client: Box<dyn OlaClient>, receiver: Receiver<Frame>) {
        let span = span!(Level::INFO, "ola sender");
        let _enter = span.enter();

        let (mut sent, mut failed) = (0u64, 0u64);
        while let Ok(frame) = receiver.recv() {
            match client.send_dmx(universe, &frame.to_dmx_buffer()) {
                Ok(()) => sent += 1,
                Err(err) => {
                    failed += 1;
                    error!(universe, "error sending DMX to OLA: {}", err);
                }
            }
        }
        info!(universe, sent, failed, "DMX sender stopped.");
    }
}

impl Drop for Sender {
    fn drop(&mut self) {
        // Closing the channel ends the thread.
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Error joining DMX sender thread");
            }
        }
    }
}
