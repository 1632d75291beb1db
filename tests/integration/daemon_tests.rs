//! End-to-end daemon runs against the GPIO simulator.
//!
//! Button on gpio26 (active-low, so a press is `false`), LED on gpio19.
//! Durations are scaled down so each run takes well under a second.

use std::thread::{self, JoinHandle};

use crate::mock_hw::{RecordingSink, Script, ScriptedExecutor, ms, wait_for_subscription};

use powerman::adapters::sim_gpio::SimGpio;
use powerman::app::events::DaemonEvent;
use powerman::app::runner::{CommandError, Failure};
use powerman::app::service::{Daemon, State};
use powerman::app::termination::{TermSignal, Termination};
use powerman::config::{CommandSpec, DaemonConfig};
use powerman::{Error, PortRole};

const BUTTON: u8 = 26;
const LED: u8 = 19;

fn config() -> DaemonConfig {
    DaemonConfig {
        debounce_ms: 50,
        heartbeat_ms: 20,
        busy_pulse_ms: 10,
        command: CommandSpec::new(["poweroff", "--now"]),
        ..DaemonConfig::default()
    }
}

struct Run {
    gpio: SimGpio,
    sink: RecordingSink,
    exec: ScriptedExecutor,
    termination: Termination,
    handle: Option<JoinHandle<(powerman::Result<()>, State)>>,
}

impl Run {
    fn start(config: DaemonConfig, gpio: SimGpio, exec: ScriptedExecutor) -> Self {
        let sink = RecordingSink::new();
        let termination = Termination::new();
        let handle = {
            let (gpio, exec, sink, termination) =
                (gpio.clone(), exec.clone(), sink.clone(), termination.clone());
            thread::spawn(move || {
                let mut daemon = Daemon::new(config, gpio, exec, sink);
                let result = daemon.run(&termination);
                (result, daemon.state())
            })
        };
        Self {
            gpio,
            sink,
            exec,
            termination,
            handle: Some(handle),
        }
    }

    fn press(&self) {
        assert!(self.gpio.set_level(BUTTON, false));
    }

    fn release(&self) {
        assert!(self.gpio.set_level(BUTTON, true));
    }

    /// Wait for the daemon thread and return its result and final state.
    fn finish(&mut self) -> (powerman::Result<()>, State) {
        let handle = self.handle.take().expect("daemon already joined");
        handle.join().expect("daemon thread panicked")
    }
}

fn started(exec: ScriptedExecutor) -> Run {
    let run = Run::start(config(), SimGpio::new(), exec);
    wait_for_subscription(&run.gpio, BUTTON);
    run.release();
    run
}

#[test]
fn long_hold_runs_command_once_and_closed_stream_exits_cleanly() {
    let mut run = started(ScriptedExecutor::new(ms(30), vec![Script::Succeed("going down\n")]));

    run.press();
    thread::sleep(ms(200));
    run.release();
    thread::sleep(ms(30));
    run.gpio.close_input(BUTTON);

    let (result, state) = run.finish();
    assert!(result.is_ok(), "{:?}", result);
    assert_eq!(state, State::Terminating);

    assert_eq!(run.exec.calls(), vec![vec!["poweroff".to_string(), "--now".to_string()]]);
    assert_eq!(
        run.sink.transitions(),
        vec![State::CommandRunning, State::Idle, State::Terminating]
    );
    assert_eq!(
        run.sink.successes(),
        vec![("'poweroff' '--now'".to_string(), "going down\n".to_string())]
    );
    assert!(run.gpio.is_released(BUTTON));
    assert!(run.gpio.is_released(LED));
}

#[test]
fn started_event_reports_wiring() {
    let mut run = started(ScriptedExecutor::succeeding(ms(0)));
    run.gpio.close_input(BUTTON);
    let _ = run.finish();

    assert_eq!(
        run.sink.events().first(),
        Some(&DaemonEvent::Started {
            button_pin: BUTTON,
            led_pin: LED,
            target_level: false,
        })
    );
}

#[test]
fn short_press_never_triggers() {
    let mut run = started(ScriptedExecutor::succeeding(ms(0)));

    run.press();
    thread::sleep(ms(20));
    run.release();
    thread::sleep(ms(120));
    run.gpio.close_input(BUTTON);

    let (result, _) = run.finish();
    assert!(result.is_ok());
    assert!(run.exec.calls().is_empty());
    assert_eq!(run.sink.transitions(), vec![State::Terminating]);
}

#[test]
fn heartbeat_toggles_led_while_idle() {
    let mut run = started(ScriptedExecutor::succeeding(ms(0)));
    thread::sleep(ms(150));
    run.gpio.close_input(BUTTON);
    let _ = run.finish();

    let writes = run.gpio.writes(LED);
    assert!(!writes[0], "LED starts low");
    assert!(writes.len() >= 4, "only {} LED writes", writes.len());
    assert!(writes[1], "first toggle lights the LED");
    assert_eq!(writes.last(), Some(&false), "LED left low on exit");
    assert!(
        writes[1..writes.len() - 1].windows(2).all(|w| w[0] != w[1]),
        "toggles must alternate: {:?}",
        writes
    );
}

#[test]
fn failing_command_terminates_with_error() {
    let mut run = started(ScriptedExecutor::new(ms(10), vec![Script::Exit(1, "boom\n")]));

    run.press();
    let (result, state) = run.finish();

    match result {
        Err(Error::Command(CommandError::Failed {
            argv,
            failure,
            output,
        })) => {
            assert_eq!(argv, ["poweroff", "--now"]);
            assert!(matches!(failure, Failure::Exit(1)));
            assert_eq!(output, "boom\n");
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(state, State::Terminating);
    assert_eq!(
        run.sink.transitions(),
        vec![State::CommandRunning, State::Terminating]
    );
    assert!(run.gpio.is_released(BUTTON));
    assert!(run.gpio.is_released(LED));
}

#[test]
fn launch_failure_is_a_command_error() {
    let mut run = started(ScriptedExecutor::new(ms(0), vec![Script::LaunchFails]));
    run.press();
    let (result, _) = run.finish();
    assert!(matches!(
        result,
        Err(Error::Command(CommandError::Failed {
            failure: Failure::Launch(_),
            ..
        }))
    ));
}

#[test]
fn termination_signal_stops_the_daemon() {
    let mut run = started(ScriptedExecutor::succeeding(ms(0)));
    thread::sleep(ms(30));
    run.termination.notify(TermSignal::Terminate);

    let (result, state) = run.finish();
    assert!(matches!(result, Err(Error::Terminated(TermSignal::Terminate))));
    assert_eq!(state, State::Terminating);
    assert!(run.exec.calls().is_empty());
    assert!(run.gpio.is_released(BUTTON));
    assert!(run.gpio.is_released(LED));
}

#[test]
fn signal_during_command_waits_for_it_to_finish() {
    let mut run = started(ScriptedExecutor::succeeding(ms(150)));

    run.press();
    thread::sleep(ms(90));
    run.termination.notify(TermSignal::Interrupt);

    let (result, _) = run.finish();
    assert!(matches!(result, Err(Error::Terminated(TermSignal::Interrupt))));
    assert_eq!(run.exec.calls().len(), 1);
    assert_eq!(
        run.sink.transitions(),
        vec![State::CommandRunning, State::Idle, State::Terminating]
    );
}

#[test]
fn holds_during_a_command_are_buffered_once() {
    let mut run = started(ScriptedExecutor::succeeding(ms(300)));

    // First hold starts the command (~50 ms in).
    run.press();
    thread::sleep(ms(80));
    run.release();
    thread::sleep(ms(20));
    // Second hold qualifies mid-command and is buffered.
    run.press();
    thread::sleep(ms(80));
    run.release();
    thread::sleep(ms(20));
    // Third hold finds the buffer full and is dropped.
    run.press();
    thread::sleep(ms(80));
    run.release();

    thread::sleep(ms(600));
    run.gpio.close_input(BUTTON);

    let (result, _) = run.finish();
    assert!(result.is_ok());
    assert_eq!(run.exec.calls().len(), 2);
    assert_eq!(
        run.sink.transitions(),
        vec![
            State::CommandRunning,
            State::Idle,
            State::CommandRunning,
            State::Idle,
            State::Terminating,
        ]
    );
}

#[test]
fn busy_blink_is_faster_than_heartbeat() {
    let config = DaemonConfig {
        heartbeat_ms: 1_000,
        ..config()
    };
    let mut run = Run::start(config, SimGpio::new(), ScriptedExecutor::succeeding(ms(200)));
    wait_for_subscription(&run.gpio, BUTTON);
    run.release();

    run.press();
    thread::sleep(ms(300));
    run.gpio.close_input(BUTTON);
    let _ = run.finish();

    // Initial low, start pulse, ~20 busy ticks, final low. No heartbeat fired.
    let writes = run.gpio.writes(LED).len();
    assert!(writes >= 10, "only {} LED writes", writes);
}

#[test]
fn led_failure_touches_no_button() {
    let gpio = SimGpio::new();
    gpio.fail_acquire(LED);
    let mut run = Run::start(config(), gpio, ScriptedExecutor::succeeding(ms(0)));

    let (result, _) = run.finish();
    assert!(matches!(
        result,
        Err(Error::Port {
            role: PortRole::Led,
            pin: LED,
            ..
        })
    ));
    assert!(!run.gpio.is_claimed(BUTTON));
    assert!(run.sink.events().is_empty());
}

#[test]
fn button_failure_releases_the_led() {
    let gpio = SimGpio::new();
    gpio.fail_values(BUTTON);
    let mut run = Run::start(config(), gpio, ScriptedExecutor::succeeding(ms(0)));

    let (result, _) = run.finish();
    let err = result.unwrap_err();
    assert!(matches!(
        err,
        Error::Port {
            role: PortRole::Button,
            pin: BUTTON,
            ..
        }
    ));
    assert_eq!(
        err.to_string(),
        "unable to activate button listener on port 26: gpio26: values failed: simulated failure"
    );
    assert!(run.gpio.is_released(BUTTON));
    assert!(run.gpio.is_released(LED));
    assert_eq!(run.gpio.writes(LED).last(), Some(&false));
}

#[test]
fn empty_command_is_a_config_error() {
    let config = DaemonConfig {
        command: CommandSpec::default(),
        ..config()
    };
    let mut run = Run::start(config, SimGpio::new(), ScriptedExecutor::succeeding(ms(0)));
    let (result, _) = run.finish();
    let err = result.unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert_eq!(err.to_string(), "configuration: invalid command: cannot be empty");
    assert!(!run.gpio.is_claimed(LED));
}
