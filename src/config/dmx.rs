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

use std::path::PathBuf;

use serde::Deserialize;

/// The port OLA listens on unless configured otherwise.
pub const DEFAULT_OLA_PORT: u16 = 9010;

/// A YAML representation of the DMX configuration.
#[derive(Deserialize, Clone, Debug)]
pub struct Dmx {
    /// The universe frames arrive from.
    input: Input,

    /// The universe frames are sent to.
    output: Output,

    /// The port of the OLA daemon.
    ola_port: Option<u16>,
}

impl Dmx {
    /// Creates a new DMX configuration.
    pub fn new(input: Input, output: Output, ola_port: Option<u16>) -> Dmx {
        Dmx {
            input,
            output,
            ola_port,
        }
    }

    /// Gets the input configuration.
    pub fn input(&self) -> &Input {
        &self.input
    }

    pub(super) fn input_mut(&mut self) -> &mut Input {
        &mut self.input
    }

    /// Gets the output configuration.
    pub fn output(&self) -> &Output {
        &self.output
    }

    /// Gets the OLA port.
    pub fn ola_port(&self) -> u16 {
        self.ola_port.unwrap_or(DEFAULT_OLA_PORT)
    }
}

/// The inbound universe and where its control channels live.
#[derive(Deserialize, Clone, Debug)]
pub struct Input {
    /// The OpenLighting universe the console drives.
    universe: u32,

    /// The mode channel. Operation sits one channel below it and the scene one above.
    id: u16,

    /// Where raw frames are read from.
    path: Option<PathBuf>,
}

impl Input {
    /// Creates a new input configuration.
    pub fn new(universe: u32, id: u16, path: Option<PathBuf>) -> Input {
        Input { universe, id, path }
    }

    /// Gets the input universe.
    pub fn universe(&self) -> u32 {
        self.universe
    }

    /// Gets the control channel.
    pub fn id(&self) -> u16 {
        self.id
    }

    /// Gets the frame source path.
    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    pub(super) fn resolve(&mut self, base: &std::path::Path) {
        if let Some(path) = self.path.as_mut() {
            *path = super::resolve(base, path);
        }
    }
}

/// The outbound universe.
#[derive(Deserialize, Clone, Debug)]
pub struct Output {
    /// The OpenLighting universe to send to.
    universe: u32,
}

impl Output {
    /// Creates a new output configuration.
    pub fn new(universe: u32) -> Output {
        Output { universe }
    }

    /// Gets the output universe.
    pub fn universe(&self) -> u32 {
        self.universe
    }
}
