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
use std::path::PathBuf;
use std::time::Duration;

use clap::{crate_version, Parser, Subcommand};
use drumtrig::channel::Channel;
use drumtrig::config::Kit;
use drumtrig::engine::{self, Engine};
use drumtrig::sounds::Sound;
use tracing::{error, info};

/// The keyboard driver can sit in a blocking stdin read forever, so don't wait on it.
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(500);

const SYSTEMD_SERVICE: &str = r#"
[Unit]
Description=drum trigger controller

[Service]
Type=simple
Restart=on-failure
EnvironmentFile=-/etc/default/drumtrig
ExecStart=/usr/local/bin/drumtrig start "$DRUMTRIG_CONFIG"

[Install]
WantedBy=multi-user.target
Alias=drumtrig.service
"#;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A piezo drum trigger controller."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start will sample the pads and send OSC events until interrupted.
    Start {
        /// The path to the kit config.
        config_path: String,
    },
    /// Converts every channel once and prints the raw values.
    Probe {
        /// The path to the kit config.
        config_path: String,
    },
    /// Lists the sounds that channels can be mapped to.
    Sounds {},
    /// Prints a systemd service definition to stdout.
    Systemd {},
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(run(cli));
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);
    result
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Commands::Start { config_path } => {
            let kit = Kit::deserialize(&PathBuf::from(config_path))?;
            let engine = Engine::start(&kit)?;

            let shutdown = engine.shutdown_handle();
            tokio::spawn(async move {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!(err = %e, "Unable to listen for interrupts.");
                    return;
                }
                info!("Interrupted, shutting down.");
                shutdown.shut_down();
            });

            engine.join().await?;
        }
        Commands::Probe { config_path } => {
            let kit = Kit::deserialize(&PathBuf::from(config_path))?;
            let mut sequencer = engine::sequencer(kit.adc())?;

            println!("ADCs on {}:", sequencer);
            for channel in Channel::all() {
                match sequencer.convert(channel) {
                    Ok(value) => println!("- {}: {}", channel, value),
                    Err(e) => println!("- {}: {}", channel, e),
                }
            }
        }
        Commands::Sounds {} => {
            println!("Sounds:");
            for sound in Sound::ALL {
                println!("- {}: {}", sound.index(), sound);
            }
        }
        Commands::Systemd {} => {
            println!("{}", SYSTEMD_SERVICE)
        }
    }

    Ok(())
}
