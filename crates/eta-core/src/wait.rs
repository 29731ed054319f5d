//! Time source and wait primitives.
//!
//! Every wait in the engine goes through [`poll_until`] or [`with_timeout`]
//! so hosts only need to provide a [`Clock`]. Timeouts never raise: callers
//! get `false`/`None` and decide whether to proceed.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::{Pin, pin};
use std::rc::Rc;
use std::task::{Context, Poll};

use futures_util::future::{Either, select};

/// Monotonic time source with cooperative sleep.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin.
    fn now_ms(&self) -> u64;

    /// Suspend for `ms` milliseconds.
    fn sleep(&self, ms: u64) -> impl Future<Output = ()>;
}

impl<C: Clock> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }

    fn sleep(&self, ms: u64) -> impl Future<Output = ()> {
        (**self).sleep(ms)
    }
}

/// Poll `condition` every `interval_ms` until it holds or `timeout_ms` has
/// elapsed. Returns whether the condition was met.
pub async fn poll_until<C, F>(clock: &C, interval_ms: u64, timeout_ms: u64, mut condition: F) -> bool
where
    C: Clock,
    F: FnMut() -> bool,
{
    let start = clock.now_ms();
    while clock.now_ms().saturating_sub(start) < timeout_ms {
        if condition() {
            return true;
        }
        clock.sleep(interval_ms).await;
    }
    false
}

/// Run `future` for at most `timeout_ms`. On timeout the future is dropped
/// (running any cleanup it owns) and `None` is returned.
pub async fn with_timeout<C, F>(clock: &C, timeout_ms: u64, future: F) -> Option<F::Output>
where
    C: Clock,
    F: Future,
{
    let future = pin!(future);
    let timer = pin!(clock.sleep(timeout_ms));
    match select(future, timer).await {
        Either::Left((output, _)) => Some(output),
        Either::Right(((), _)) => None,
    }
}

/// Virtual clock: sleeping advances time instantly.
///
/// Used to replay saved sessions without real delays and to make waits
/// deterministic in tests. Clones share the same time line.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
    sleeps: Rc<RefCell<Vec<u64>>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward without sleeping.
    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    /// Every sleep requested so far, in milliseconds.
    pub fn sleeps(&self) -> Vec<u64> {
        self.sleeps.borrow().clone()
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn sleep(&self, ms: u64) -> impl Future<Output = ()> {
        ManualSleep {
            clock: self.clone(),
            ms,
        }
    }
}

/// Advances the clock when first polled, so a sleep that loses a race in
/// [`with_timeout`] leaves time untouched.
struct ManualSleep {
    clock: ManualClock,
    ms: u64,
}

impl Future for ManualSleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        self.clock.advance(self.ms);
        self.clock.sleeps.borrow_mut().push(self.ms);
        Poll::Ready(())
    }
}
