//! powerman: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │                                                              │
//! │  RpiGpio | SimGpio   ProcessExecutor   LogEventSink  signals │
//! │  (Gpio)              (Executor)        (EventSink)   (Term.) │
//! │                                                              │
//! │  ─────────────────── Port Trait Boundary ─────────────────── │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │  Daemon: ButtonMonitor · LedDriver · CommandRunner      │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Exit status: 0 when the button stream closes or a termination signal
//! arrives, 1 on any other fatal error, 2 on a usage error.
#![deny(unused_must_use)]

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, error, info};

use powerman::adapters::log_sink::LogEventSink;
use powerman::adapters::process::ProcessExecutor;
use powerman::adapters::sim_gpio::{self, SimGpio};
use powerman::app::ports::Gpio;
use powerman::app::service::Daemon;
use powerman::app::termination::Termination;
use powerman::cli::Cli;
use powerman::config::DaemonConfig;
use powerman::Error;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<Error>() {
            Some(Error::Terminated(signal)) => {
                info!("stopped by {}", signal);
                ExitCode::SUCCESS
            }
            _ => {
                error!("{:#}", e);
                ExitCode::FAILURE
            }
        },
    }
}

fn run(cli: Cli) -> Result<()> {
    info!(
        "powerman {} starting: {:?}",
        env!("CARGO_PKG_VERSION"),
        std::env::args().collect::<Vec<_>>()
    );

    let simulate = cli.simulate;
    let config = cli.into_config();
    debug!(
        "config: {}",
        serde_json::to_string(&config).context("serialising config")?
    );

    let termination = Termination::new();
    #[cfg(unix)]
    powerman::adapters::signals::install(&termination).context("installing signal handlers")?;

    if simulate {
        let gpio = SimGpio::new();
        let feeder = gpio.clone();
        let pin = config.button_pin;
        std::thread::Builder::new()
            .name("stdin".into())
            .spawn(move || sim_gpio::feed_lines(&feeder, pin, std::io::stdin().lock()))
            .context("starting stdin feeder")?;
        info!("simulating gpio{} from stdin", pin);
        serve(config, gpio, &termination)
    } else {
        serve(config, hardware_gpio()?, &termination)
    }
}

fn serve<G: Gpio>(config: DaemonConfig, gpio: G, termination: &Termination) -> Result<()> {
    Daemon::new(config, gpio, ProcessExecutor::new(), LogEventSink::new()).run(termination)?;
    Ok(())
}

#[cfg(target_os = "linux")]
fn hardware_gpio() -> Result<powerman::adapters::rpi_gpio::RpiGpio> {
    powerman::adapters::rpi_gpio::RpiGpio::new().context("opening GPIO controller")
}

#[cfg(not(target_os = "linux"))]
fn hardware_gpio() -> Result<SimGpio> {
    anyhow::bail!("no GPIO support on this platform, use --simulate")
}
