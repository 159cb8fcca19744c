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

use clap::{crate_version, Parser, Subcommand};
use followspot::{config, handler};
use tracing_subscriber::EnvFilter;

const SYSTEMD_SERVICE: &str = r#"
[Unit]
Description=DMX follow spot
After=olad.service

[Service]
Type=simple
Restart=on-failure
EnvironmentFile=-/etc/default/followspot
ExecStart=/usr/local/bin/followspot start "$FOLLOWSPOT_CONFIG" -s "$FOLLOWSPOT_SHOW"

[Install]
WantedBy=multi-user.target
Alias=followspot.service
"#;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A DMX follow spot for moving lights."
)]
struct Cli {
    /// Log at info level.
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Log at debug level.
    #[arg(short, long, global = true)]
    debug: bool,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start will run the follow spot until the frame source closes.
    Start {
        /// The path to the followspot config.
        config_path: PathBuf,
        /// The show to run. Defaults to the first show.
        #[arg(short, long)]
        show: Option<String>,
        /// The stage calibration to use.
        #[arg(short = 'l', long)]
        stage: Option<String>,
    },
    /// Verifies the configuration and prints its shows.
    Check {
        /// The path to the followspot config.
        config_path: PathBuf,
        /// Only print this show.
        #[arg(short, long)]
        show: Option<String>,
    },
    /// Prints a systemd service definition to stdout.
    Systemd {},
}

fn init_logging(cli: &Cli) {
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(&cli);

    match cli.command {
        Commands::Start {
            config_path,
            show,
            stage,
        } => {
            handler::start(&config_path, show.as_deref(), stage.as_deref()).await?;
        }
        Commands::Check { config_path, show } => {
            let rig = config::load(&config_path)?;
            println!("Profiles (count: {}):", rig.profile_names().len());
            for name in rig.profile_names() {
                println!("- {}", name);
            }

            let names = match show.as_deref() {
                Some(show) => vec![show],
                None => rig.show_names(),
            };
            for name in names {
                println!("\n{}", rig.show(Some(name))?);
            }
        }
        Commands::Systemd {} => {
            println!("{}", SYSTEMD_SERVICE)
        }
    }

    Ok(())
}
