//! Live dashboard metrics
//!
//! A fixed-length window of randomly generated load/traffic samples and the
//! periodic task that advances it.

use parking_lot::Mutex;
use rand::Rng;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::trace;

/// One point on the live graph
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricSample {
    /// Monotonic sample index
    pub time: u64,
    /// CPU load percentage
    pub load: f64,
    /// Network traffic in arbitrary units
    pub traffic: f64,
}

#[derive(Debug)]
struct WindowState {
    samples: VecDeque<MetricSample>,
    closed: bool,
}

/// Shared ring of the most recent samples
///
/// Once closed the window stays empty; late ticks are ignored.
#[derive(Debug, Clone)]
pub struct MetricsWindow {
    capacity: usize,
    state: Arc<Mutex<WindowState>>,
}

impl MetricsWindow {
    /// Window pre-filled with `capacity` samples
    #[must_use]
    pub fn seeded(capacity: usize) -> Self {
        let mut rng = rand::rng();
        let samples = (0..capacity as u64)
            .map(|time| MetricSample {
                time,
                load: rng.random_range(40.0..60.0),
                traffic: rng.random_range(20.0..50.0),
            })
            .collect();
        Self {
            capacity,
            state: Arc::new(Mutex::new(WindowState {
                samples,
                closed: false,
            })),
        }
    }

    /// Drop the oldest sample and append a fresh one
    ///
    /// Returns `None` without touching the window after [`close`](Self::close).
    pub fn advance(&self) -> Option<MetricSample> {
        let mut state = self.state.lock();
        if state.closed {
            return None;
        }
        let mut rng = rand::rng();
        let next = MetricSample {
            time: state.samples.back().map_or(0, |s| s.time + 1),
            load: rng.random_range(35.0..70.0),
            traffic: rng.random_range(20.0..60.0),
        };
        while state.samples.len() >= self.capacity.max(1) {
            state.samples.pop_front();
        }
        state.samples.push_back(next);
        Some(next)
    }

    /// Copy of the current samples, oldest first
    #[must_use]
    pub fn snapshot(&self) -> Vec<MetricSample> {
        self.state.lock().samples.iter().copied().collect()
    }

    /// Most recent sample
    #[must_use]
    pub fn latest(&self) -> Option<MetricSample> {
        self.state.lock().samples.back().copied()
    }

    /// Number of samples held
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().samples.len()
    }

    /// Whether the window holds no samples
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().samples.is_empty()
    }

    /// Whether the window was closed
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Discard every sample and refuse further ones
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.samples.clear();
        state.closed = true;
    }
}

/// Owner of a running ticker task
///
/// Stopping or dropping the handle aborts the task.
#[derive(Debug)]
pub struct TickerHandle {
    task: JoinHandle<()>,
}

impl TickerHandle {
    /// Abort the ticker
    pub fn stop(&self) {
        self.task.abort();
    }

    /// Whether the task has exited
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Advance `window` every `period` until the handle is stopped or dropped
#[must_use]
pub fn spawn_ticker(window: MetricsWindow, period: Duration) -> TickerHandle {
    let task = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let Some(sample) = window.advance() else {
                return;
            };
            trace!(time = sample.time, load = sample.load, "metrics tick");
        }
    });
    TickerHandle { task }
}
