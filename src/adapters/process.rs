//! Child-process executor adapter.
//!
//! Each command runs on its own short-lived thread: spawn, drain the
//! combined stdout/stderr pipe, reap. The result is handed back to the
//! executor through an `embassy-sync` [`Signal`], so the LED keeps
//! blinking while the child runs.

use std::future::Future;
use std::io::{self, Read};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::debug;

use crate::app::ports::{Executor, Outcome};

type Completion = Signal<CriticalSectionRawMutex, io::Result<Outcome>>;

/// Runs commands as child processes of the daemon.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Executor for ProcessExecutor {
    fn execute(&self, argv: &[String]) -> impl Future<Output = io::Result<Outcome>> {
        let argv = argv.to_vec();
        async move {
            let done = Arc::new(Completion::new());
            let tx = done.clone();
            thread::Builder::new()
                .name("command".into())
                .spawn(move || tx.signal(run_to_completion(&argv)))?;
            done.wait().await
        }
    }
}

fn run_to_completion(argv: &[String]) -> io::Result<Outcome> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty argv"))?;

    let (mut reader, writer) = io::pipe()?;
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(writer.try_clone()?)
        .stderr(writer);
    let mut child = cmd.spawn()?;
    // Our copies of the write end must go, or the read never sees EOF.
    drop(cmd);
    debug!("spawned pid {}", child.id());

    let mut output = Vec::new();
    let drained = reader.read_to_end(&mut output);
    let status = child.wait()?;
    drained?;

    debug!("pid {} exited: {}", child.id(), status);
    Ok(Outcome {
        code: status.code(),
        output,
    })
}
