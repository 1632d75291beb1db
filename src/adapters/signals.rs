//! Process-signal adapter.
//!
//! A helper thread blocks on `signal-hook`'s iterator and forwards
//! SIGHUP, SIGINT, SIGTERM and SIGQUIT into the [`Termination`] source.

use std::io;
use std::thread;

use log::{debug, info};
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;

use crate::app::termination::{TermSignal, Termination};

const HANDLED: [i32; 4] = [SIGHUP, SIGINT, SIGTERM, SIGQUIT];

fn term_signal(raw: i32) -> Option<TermSignal> {
    match raw {
        SIGHUP => Some(TermSignal::Hangup),
        SIGINT => Some(TermSignal::Interrupt),
        SIGTERM => Some(TermSignal::Terminate),
        SIGQUIT => Some(TermSignal::Quit),
        _ => None,
    }
}

/// Register the handlers and start the forwarding thread.
///
/// The default actions are replaced for the lifetime of the process, so a
/// signal only ever reaches the daemon through `termination`.
pub fn install(termination: &Termination) -> io::Result<()> {
    let mut signals = Signals::new(HANDLED)?;
    let termination = termination.clone();

    thread::Builder::new()
        .name("signals".into())
        .spawn(move || {
            for raw in signals.forever() {
                match term_signal(raw) {
                    Some(signal) => {
                        info!("caught {}", signal);
                        termination.notify(signal);
                    }
                    None => debug!("ignoring signal {}", raw),
                }
            }
        })?;
    Ok(())
}
