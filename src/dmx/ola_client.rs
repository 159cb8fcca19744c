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
use std::net::TcpStream;
use std::thread;
use std::time::Duration;

use ola::client::StreamingClientConfig;
use ola::DmxBuffer;
use tracing::debug;

/// Connection attempts made before giving up on OLA.
const CONNECT_ATTEMPTS: usize = 10;

/// Something that can send a universe's worth of DMX.
pub trait OlaClient: Send {
    fn send_dmx(&mut self, universe: u32, buffer: &DmxBuffer) -> Result<(), Box<dyn Error>>;
}

/// An OLA streaming client over TCP.
pub struct RealOlaClient {
    client: ola::StreamingClient<TcpStream>,
}

impl RealOlaClient {
    /// Connects to the OLA daemon on the given port, retrying while it starts up.
    pub fn connect(port: u16) -> Result<RealOlaClient, Box<dyn Error>> {
        let config = StreamingClientConfig {
            server_port: port,
            ..Default::default()
        };

        for attempt in 0..CONNECT_ATTEMPTS {
            if attempt > 0 {
                thread::sleep(Duration::from_secs(5));
            }

            if let Ok(client) = ola::connect_with_config(config.clone()) {
                return Ok(RealOlaClient { client });
            }

            debug!(port, attempt, "Error connecting to OLA, waiting 5 seconds and trying again.");
        }
        Err(format!("unable to connect to OLA on port {}", port).into())
    }
}

impl OlaClient for RealOlaClient {
    fn send_dmx(&mut self, universe: u32, buffer: &DmxBuffer) -> Result<(), Box<dyn Error>> {
        self.client.send_dmx(universe, buffer)?;
        Ok(())
    }
}
