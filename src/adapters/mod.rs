//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements | Connects to                         |
//! |------------|------------|-------------------------------------|
//! | `log_sink` | EventSink  | `log` facade                        |
//! | `process`  | Executor   | Child process, combined output pipe |
//! | `rpi_gpio` | Gpio       | Raspberry Pi SoC GPIO (`rppal`)     |
//! | `sim_gpio` | Gpio       | In-memory lines, stdin feeder       |
//! | `signals`  | (source)   | POSIX signals into `Termination`    |

pub mod log_sink;
pub mod process;
#[cfg(target_os = "linux")]
pub mod rpi_gpio;
#[cfg(unix)]
pub mod signals;
pub mod sim_gpio;
