//! Inter-task queues.
//!
//! Every hand-off between the daemon's tasks is a bounded `embassy-sync`
//! channel wrapped in a [`Queue`] that can also be *closed*, so a consumer
//! observes end-of-stream instead of waiting forever.
//!
//! ```text
//! ┌──────────────┐  EdgeEvent  ┌───────────────┐  Trigger  ┌──────────────┐
//! │ GPIO adapter │────────────▶│ ButtonMonitor │──────────▶│ Orchestrator │
//! └──────────────┘  (100)      └───────────────┘   (1)     └──────┬───────┘
//!                                                                 │ Pulse
//!                          ┌───────────┐   Pulse (100)            │
//!                          │ LedDriver │◀─────────────────────────┤
//!                          └───────────┘                   CommandRunner
//! ```

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use futures_lite::future;
use log::warn;

/// Raw edge buffer depth between the GPIO adapter and the monitor.
pub const EDGE_DEPTH: usize = 100;

/// Debounced trigger buffer depth.
pub const TRIGGER_DEPTH: usize = 1;

/// Pulse request buffer depth.
pub const PULSE_DEPTH: usize = 100;

/// One level change reported by an input port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeEvent {
    /// Logical level after the change.
    pub value: bool,
    /// When the adapter observed it.
    pub at: Instant,
}

impl EdgeEvent {
    pub fn now(value: bool) -> Self {
        Self {
            value,
            at: Instant::now(),
        }
    }
}

/// Debounced "button held" signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger;

/// Request for one LED toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pulse;

/// Why a non-blocking send was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    Full,
    Closed,
}

/// The queue was closed before the item could be accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Closed;

/// Bounded multi-producer, single-consumer queue with end-of-stream.
///
/// Items already buffered when [`close`](Self::close) is called are still
/// delivered; [`recv`](Self::recv) returns `None` only once the buffer is
/// empty.
pub struct Queue<T, const N: usize> {
    items: Channel<CriticalSectionRawMutex, T, N>,
    closed: AtomicBool,
    wake: Signal<CriticalSectionRawMutex, ()>,
}

impl<T, const N: usize> Queue<T, N> {
    pub const fn new() -> Self {
        Self {
            items: Channel::new(),
            closed: AtomicBool::new(false),
            wake: Signal::new(),
        }
    }

    /// Enqueue, waiting for space if the buffer is full.
    pub async fn send(&self, item: T) -> Result<(), Closed> {
        if self.is_closed() {
            return Err(Closed);
        }
        self.items.send(item).await;
        Ok(())
    }

    /// Enqueue without waiting.
    pub fn try_send(&self, item: T) -> Result<(), Rejected> {
        if self.is_closed() {
            return Err(Rejected::Closed);
        }
        self.items.try_send(item).map_err(|_| Rejected::Full)
    }

    /// Next item, or `None` once the queue is closed and drained.
    pub async fn recv(&self) -> Option<T> {
        loop {
            if let Ok(item) = self.items.try_receive() {
                return Some(item);
            }
            if self.is_closed() {
                return None;
            }
            let item = future::or(async { Some(self.items.receive().await) }, async {
                self.wake.wait().await;
                None
            })
            .await;
            if item.is_some() {
                return item;
            }
        }
    }

    /// Mark end-of-stream and wake the consumer.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.wake.signal(());
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of buffered items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T, const N: usize> Default for Queue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

pub type EdgeQueue = Queue<EdgeEvent, EDGE_DEPTH>;
pub type TriggerQueue = Queue<Trigger, TRIGGER_DEPTH>;
pub type PulseQueue = Queue<Pulse, PULSE_DEPTH>;

// ── Edge stream ──────────────────────────────────────────────

/// Producer half of an input port's edge stream.
///
/// Lives in the adapter's interrupt context. Dropping it closes the stream.
pub struct EdgeSink(Arc<EdgeQueue>);

impl EdgeSink {
    /// Report a level change. Overflow drops the edge with a warning.
    pub fn push(&self, event: EdgeEvent) {
        if self.0.try_send(event) == Err(Rejected::Full) {
            warn!("edge buffer full, dropping {:?}", event.value);
        }
    }

    pub fn close(&self) {
        self.0.close();
    }
}

impl Drop for EdgeSink {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Consumer half of an input port's edge stream.
pub struct EdgeStream(Arc<EdgeQueue>);

impl EdgeStream {
    /// Next edge in arrival order, `None` at end-of-stream.
    pub async fn next(&mut self) -> Option<EdgeEvent> {
        self.0.recv().await
    }
}

/// Create a connected edge sink/stream pair.
pub fn edge_stream() -> (EdgeSink, EdgeStream) {
    let queue = Arc::new(EdgeQueue::new());
    (EdgeSink(queue.clone()), EdgeStream(queue))
}
