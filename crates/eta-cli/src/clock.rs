//! Clocks for the CLI host.

use std::future::Future;
use std::time::{Duration, Instant};

use futures_util::future::Either;

use eta_core::{Clock, ManualClock};

/// Wall clock backed by the tokio timer.
#[derive(Debug, Clone)]
pub struct TokioClock {
    origin: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn sleep(&self, ms: u64) -> impl Future<Output = ()> {
        tokio::time::sleep(Duration::from_millis(ms))
    }
}

/// Either real time or virtual time.
///
/// Saved sessions replay on virtual time by default; `--realtime` keeps
/// the portal's delays.
#[derive(Debug, Clone)]
pub enum HostClock {
    Real(TokioClock),
    Virtual(ManualClock),
}

impl HostClock {
    pub fn new(realtime: bool) -> Self {
        if realtime {
            HostClock::Real(TokioClock::new())
        } else {
            HostClock::Virtual(ManualClock::new())
        }
    }
}

impl Clock for HostClock {
    fn now_ms(&self) -> u64 {
        match self {
            HostClock::Real(clock) => clock.now_ms(),
            HostClock::Virtual(clock) => clock.now_ms(),
        }
    }

    fn sleep(&self, ms: u64) -> impl Future<Output = ()> {
        match self {
            HostClock::Real(clock) => Either::Left(clock.sleep(ms)),
            HostClock::Virtual(clock) => Either::Right(clock.sleep(ms)),
        }
    }
}
