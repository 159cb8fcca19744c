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
use std::io::{self, ErrorKind, Read};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, span, warn, Level};

use super::frame::{Frame, UNIVERSE_SIZE};

/// Reads inbound universes as consecutive 512-byte records.
pub struct Source {
    path: Option<PathBuf>,
}

impl Source {
    /// Creates a source for the given pipe. Without a path, frames come from stdin.
    pub fn new(path: Option<PathBuf>) -> Source {
        Source { path }
    }

    /// Starts reading frames into the channel. The task ends once the receiver is gone
    /// or stdin closes.
    pub fn start(self, frames: mpsc::Sender<Frame>) -> JoinHandle<()> {
        tokio::task::spawn_blocking(move || {
            let span = span!(Level::INFO, "dmx source");
            let _enter = span.enter();

            let Some(path) = self.path else {
                info!("Reading frames from stdin.");
                if let Err(err) = read_frames(io::stdin().lock(), &frames) {
                    error!("Error reading frames from stdin: {}", err);
                }
                return;
            };

            info!(path = ?path, "Reading frames.");
            // A pipe reports end of file whenever the writer goes away, so keep reopening it.
            while !frames.is_closed() {
                match File::open(&path) {
                    Ok(file) => {
                        if let Err(err) = read_frames(file, &frames) {
                            warn!(path = ?path, "Error reading frames: {}", err);
                        }
                    }
                    Err(err) => debug!(path = ?path, "Unable to open frame source: {}", err),
                }
                thread::sleep(Duration::from_secs(1));
            }
        })
    }
}

/// Reads whole frames until end of input, returning early if the receiver is gone.
/// A trailing partial record is dropped.
pub fn read_frames<R: Read>(mut reader: R, frames: &mpsc::Sender<Frame>) -> io::Result<usize> {
    let mut buffer = [0u8; UNIVERSE_SIZE];
    let mut count = 0;
    loop {
        match reader.read_exact(&mut buffer) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => return Ok(count),
            Err(err) => return Err(err),
        }
        if frames.blocking_send(Frame::from_slice(&buffer)).is_err() {
            return Ok(count);
        }
        count += 1;
    }
}

#[cfg(test)]
mod test {
    use std::error::Error;
    use std::io::{Cursor, Write};

    use super::*;

    fn records(values: &[u8]) -> Vec<u8> {
        values
            .iter()
            .flat_map(|value| {
                let mut record = [0u8; UNIVERSE_SIZE];
                record[0] = *value;
                record[UNIVERSE_SIZE - 1] = *value;
                record
            })
            .collect()
    }

    #[test]
    fn test_read_frames() -> Result<(), Box<dyn Error>> {
        let (sender, mut receiver) = mpsc::channel(8);
        let mut data = records(&[1, 2, 3]);
        data.extend_from_slice(&[9; 100]);

        assert_eq!(3, read_frames(Cursor::new(data), &sender)?);
        for expected in [1, 2, 3] {
            let frame = receiver.try_recv()?;
            assert_eq!(expected, frame.get(0));
            assert_eq!(expected, frame.get(UNIVERSE_SIZE - 1));
        }
        assert!(receiver.try_recv().is_err());
        Ok(())
    }

    #[test]
    fn test_read_frames_stops_without_receiver() -> Result<(), Box<dyn Error>> {
        let (sender, receiver) = mpsc::channel(8);
        drop(receiver);
        assert_eq!(0, read_frames(Cursor::new(records(&[1, 2])), &sender)?);
        Ok(())
    }

    #[tokio::test]
    async fn test_source_reads_file() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("frames");
        File::create(&path)?.write_all(&records(&[7, 8]))?;

        let (sender, mut receiver) = mpsc::channel(8);
        let handle = Source::new(Some(path)).start(sender);

        assert_eq!(Some(7), receiver.recv().await.map(|frame| frame.get(0)));
        assert_eq!(Some(8), receiver.recv().await.map(|frame| frame.get(0)));
        drop(receiver);
        handle.await?;
        Ok(())
    }
}
