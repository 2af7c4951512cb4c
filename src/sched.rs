//! The deferred call scheduler.

use crate::callback::{Callback, Schedule};
use crate::context::QueueContext;
use crate::ring::Ring;
use crate::time::{elapsed, Clock, TimeContext, TimeUnit};

/// A queued call: what to run, when it was admitted, how long to wait and
/// against which counter.
///
/// `created` is stamped from the counter matching `unit` at admission and
/// the pairing never changes afterwards.
#[derive(Copy, Clone, Default)]
pub(crate) struct Deferred {
    pub(crate) callback: Callback,
    pub(crate) created: usize,
    pub(crate) delay: usize,
    pub(crate) unit: TimeUnit,
}

impl Deferred {
    pub(crate) fn new(callback: Callback, created: usize, delay: usize, unit: TimeUnit) -> Self {
        Self {
            callback,
            created,
            delay,
            unit,
        }
    }

    pub(crate) fn into_callback(self) -> Callback {
        self.callback
    }
}

/// Runs deferred calls out of a fixed capacity queue as the host loop
/// ticks.
///
/// The host builds it around a [`Clock`], admits calls through
/// [`Schedule::run_later`] and calls [`Scheduler::tick`] at least as often
/// as its tightest delay needs to be observed. There is no internal timer
/// and no background driver.
pub struct Scheduler<C>
where
    C: Clock,
{
    queue: Ring<Deferred>,
    overflow: Callback,
    clock: C,
}

impl<C> Scheduler<C>
where
    C: Clock,
{
    /// Queue capacity used by [`Scheduler::new`].
    pub const DEFAULT_CAPACITY: usize = 10;

    pub fn new(clock: C) -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY, clock)
    }

    /// A scheduler whose queue holds up to `capacity` pending calls.
    ///
    /// Zero is accepted and yields a queue that is already full: every
    /// admission reports overflow, none fails construction.
    pub fn with_capacity(capacity: usize, clock: C) -> Self {
        if capacity == 0 {
            log::debug!("zero capacity queue, every admission will overflow");
        }
        Self {
            queue: Ring::with_capacity(capacity),
            overflow: Callback::None,
            clock,
        }
    }

    /// Replace the overflow hook, called once per failed admission. A
    /// single slot: only the most recently set hook is kept, and
    /// [`Callback::None`] clears it.
    pub fn set_overflow(&mut self, callback: Callback) {
        self.overflow = callback;
    }

    /// Pending calls currently queued.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Capacity requested at construction.
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// One scan of the queue; fires at most one due callback.
    ///
    /// Walks the occupancy captured on entry, so the scan terminates even
    /// though not yet due entries go back on the queue and a firing
    /// callback may admit new ones mid-scan. Entries come off the tail
    /// oldest first and are re-queued at the head in arrival order, which
    /// keeps FIFO order among waiting entries across ticks. An entry
    /// fires only once its elapsed time strictly exceeds its delay.
    pub fn tick(&mut self) {
        let pending = self.queue.len();
        for _ in 0..pending {
            let deferred = match self.queue.pop() {
                Some(deferred) => deferred,
                None => return,
            };
            let now = self.clock.now(deferred.unit);
            if elapsed(now, deferred.created) > deferred.delay {
                log::trace!("firing deferred call after {} {:?}", deferred.delay, deferred.unit);
                let mut context = QueueContext::new(&mut self.queue, &self.clock);
                deferred.callback.call(&mut context);
                // at most one callback per tick; the fired entry is gone
                return;
            }
            // not yet due, back to the head; pop freed a slot so this
            // cannot fail
            let _ = self.queue.push(deferred);
        }
    }
}

impl<C> Schedule for Scheduler<C>
where
    C: Clock,
{
    fn run_later(
        &mut self,
        callback: Callback,
        delay: usize,
        unit: TimeUnit,
    ) -> Result<(), Callback> {
        let created = self.clock.now(unit);
        match self.queue.push(Deferred::new(callback, created, delay, unit)) {
            Ok(()) => Ok(()),
            Err(rejected) => {
                log::warn!("deferred call dropped, queue full");
                let hook = self.overflow;
                let mut context = QueueContext::new(&mut self.queue, &self.clock);
                hook.call(&mut context);
                Err(rejected.into_callback())
            }
        }
    }
}

impl<C> TimeContext for Scheduler<C>
where
    C: Clock,
{
    fn now(&self, unit: TimeUnit) -> usize {
        self.clock.now(unit)
    }
}
