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
use std::io;

use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{info, span, warn, Level};

use crate::sounds::Sound;

use super::Event;

const TRIGGER: &str = "trigger";
const RELEASE: &str = "release";
const MAP: &str = "map";
const SELECT: &str = "select";

/// A controller that reads commands from stdin.
pub struct Driver {}

impl Driver {
    pub fn new() -> Driver {
        Driver {}
    }

    /// Parses a single command line.
    fn parse(input: &str) -> Option<Event> {
        let lowered = input.trim().to_lowercase();
        let words: Vec<&str> = lowered.split_whitespace().collect();

        match words.as_slice() {
            [TRIGGER, channel] => Some(Event::Trigger(channel.parse().ok()?)),
            [RELEASE, channel] => Some(Event::Release(channel.parse().ok()?)),
            [SELECT, channel] => Some(Event::Select(channel.parse().ok()?)),
            [MAP, channel, sound] => {
                let sound = match sound.parse::<Sound>() {
                    Ok(sound) => sound.index(),
                    Err(_) => sound.parse().ok()?,
                };
                Some(Event::Remap {
                    channel: channel.parse().ok()?,
                    sound,
                })
            }
            _ => None,
        }
    }

    fn monitor_io<R, W>(
        events_tx: &Sender<Event>,
        mut reader: R,
        mut writer: W,
    ) -> Result<(), io::Error>
    where
        R: io::BufRead,
        W: io::Write,
    {
        write!(
            writer,
            "Command ({} <ch>, {} <ch>, {} <ch> <sound>, {} <ch>): ",
            TRIGGER, RELEASE, MAP, SELECT,
        )?;
        writer.flush()?;
        let mut input: String = String::default();
        if reader.read_line(&mut input)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }

        match Self::parse(&input) {
            Some(event) => events_tx.blocking_send(event).map_err(io::Error::other),
            None => {
                warn!(input = input.trim(), "Unrecognized input");
                Ok(())
            }
        }
    }
}

impl super::Driver for Driver {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
        tokio::task::spawn_blocking(move || {
            let span = span!(Level::INFO, "keyboard driver");
            let _enter = span.enter();

            info!("Keyboard driver started.");

            loop {
                Self::monitor_io(&events_tx, io::stdin().lock(), io::stdout())?;
            }
        })
    }
}

#[cfg(test)]
mod test {
    use std::io::{self, BufReader, BufWriter};

    use tokio::sync::mpsc;

    use crate::controller::Event;

    use super::Driver;

    fn get_event(event: &str) -> Result<Option<Event>, io::Error> {
        let (sender, mut receiver) = mpsc::channel::<Event>(1);

        let reader = BufReader::new(event.as_bytes());
        let writer = BufWriter::new(Vec::new());
        Driver::monitor_io(&sender, reader, writer)?;

        // Force the sender to close.
        drop(sender);
        Ok(receiver.blocking_recv())
    }

    #[test]
    fn test_keyboard_events() -> Result<(), io::Error> {
        assert_eq!(Some(Event::Trigger(3)), get_event("trigger 3\n")?);
        assert_eq!(Some(Event::Release(0)), get_event("  RELEASE 0 \n")?);
        assert_eq!(Some(Event::Select(5)), get_event("select 5\n")?);
        assert_eq!(
            Some(Event::Remap {
                channel: 2,
                sound: 1
            }),
            get_event("map 2 snare\n")?
        );
        assert_eq!(
            Some(Event::Remap {
                channel: 2,
                sound: 12
            }),
            get_event("map 2 12\n")?
        );
        assert_eq!(None, get_event("trigger\n")?);
        assert_eq!(None, get_event("map 2 cowbell\n")?);
        assert_eq!(None, get_event("unrecognized\n")?);
        Ok(())
    }

    #[test]
    fn test_closed_input() {
        assert!(get_event("").is_err());
    }
}
