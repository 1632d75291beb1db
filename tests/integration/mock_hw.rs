//! Mock adapters for integration tests.
//!
//! Both mocks share their state behind an `Arc`, so a test keeps a clone
//! and inspects it while the daemon owns the other one on its own thread.

use std::io;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_io_mini::Timer;
use powerman::adapters::sim_gpio::SimGpio;
use powerman::app::events::DaemonEvent;
use powerman::app::ports::{EventSink, Executor, Outcome};
use powerman::app::service::State;

// ── Event recording ───────────────────────────────────────────

#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<DaemonEvent>>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DaemonEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Target state of every transition, in order.
    pub fn transitions(&self) -> Vec<State> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                DaemonEvent::StateChanged { to, .. } => Some(to),
                _ => None,
            })
            .collect()
    }

    pub fn successes(&self) -> Vec<(String, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                DaemonEvent::CommandSucceeded { command, output } => Some((command, output)),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &DaemonEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// ── Scripted command executor ─────────────────────────────────

/// What the next invocation does.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum Script {
    Succeed(&'static str),
    Exit(i32, &'static str),
    Killed,
    LaunchFails,
}

struct ExecState {
    script: Vec<Script>,
    calls: Vec<Vec<String>>,
}

/// Executor that waits `delay` and then plays back `script` in order,
/// repeating the last entry once it runs out.
#[derive(Clone)]
pub struct ScriptedExecutor {
    delay: Duration,
    state: Arc<Mutex<ExecState>>,
}

#[allow(dead_code)]
impl ScriptedExecutor {
    pub fn new(delay: Duration, script: Vec<Script>) -> Self {
        Self {
            delay,
            state: Arc::new(Mutex::new(ExecState {
                script,
                calls: Vec::new(),
            })),
        }
    }

    pub fn succeeding(delay: Duration) -> Self {
        Self::new(delay, vec![Script::Succeed("")])
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().calls.clone()
    }

    fn next(&self, argv: &[String]) -> Script {
        let mut state = self.state.lock().unwrap();
        state.calls.push(argv.to_vec());
        if state.script.len() > 1 {
            state.script.remove(0)
        } else {
            state.script.first().cloned().unwrap_or(Script::Succeed(""))
        }
    }
}

impl Executor for ScriptedExecutor {
    async fn execute(&self, argv: &[String]) -> io::Result<Outcome> {
        let script = self.next(argv);
        Timer::after(self.delay).await;
        match script {
            Script::Succeed(out) => Ok(Outcome {
                code: Some(0),
                output: out.as_bytes().to_vec(),
            }),
            Script::Exit(code, out) => Ok(Outcome {
                code: Some(code),
                output: out.as_bytes().to_vec(),
            }),
            Script::Killed => Ok(Outcome {
                code: None,
                output: Vec::new(),
            }),
            Script::LaunchFails => Err(io::Error::new(io::ErrorKind::NotFound, "no such file")),
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────

/// Block until the daemon has subscribed to `pin`.
#[allow(dead_code)]
pub fn wait_for_subscription(gpio: &SimGpio, pin: u8) {
    let start = Instant::now();
    while !gpio.is_subscribed(pin) {
        assert!(
            start.elapsed() < Duration::from_secs(2),
            "daemon never subscribed to gpio{}",
            pin
        );
        std::thread::sleep(Duration::from_millis(2));
    }
}

#[allow(dead_code)]
pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}
