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

use ola::DmxBuffer;

/// A DMX universe is 512 channels.
pub const UNIVERSE_SIZE: usize = 512;

/// One tick's worth of channel values for a universe.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    data: [u8; UNIVERSE_SIZE],
}

impl Frame {
    /// Creates a frame with every channel at zero.
    pub fn new() -> Frame {
        Frame {
            data: [0; UNIVERSE_SIZE],
        }
    }

    /// Creates a frame from received data. Short input is zero padded and
    /// anything past the universe size is dropped.
    pub fn from_slice(data: &[u8]) -> Frame {
        let mut frame = Frame::new();
        let len = data.len().min(UNIVERSE_SIZE);
        frame.data[..len].copy_from_slice(&data[..len]);
        frame
    }

    /// Gets the value at the 0-based index. Out of range reads as zero.
    pub fn get(&self, index: usize) -> u8 {
        self.data.get(index).copied().unwrap_or(0)
    }

    /// Sets the value at the 0-based index. Returns false if the index is
    /// outside of the universe.
    pub fn set(&mut self, index: usize, value: u8) -> bool {
        match self.data.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Gets the raw channel data.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Copies the frame into an OLA buffer for transmission.
    pub fn to_dmx_buffer(&self) -> DmxBuffer {
        let mut buffer = DmxBuffer::new();
        for (channel, value) in self.data.iter().enumerate() {
            buffer.set_channel(channel, *value);
        }
        buffer
    }
}

impl Default for Frame {
    fn default() -> Self {
        Frame::new()
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let last = self
            .data
            .iter()
            .rposition(|value| *value != 0)
            .map_or(0, |i| i + 1);
        write!(f, "Frame({:?})", &self.data[..last])
    }
}
