//! Callback values and the seams they fire through.

extern crate alloc;

use crate::time::{TimeContext, TimeUnit};

/// Admission of deferred calls.
pub trait Schedule {
    /// Try to queue `callback` to run once `delay` units have strictly
    /// passed. The creation time is stamped from the counter matching
    /// `unit` at admission. On a full queue the callback is handed back
    /// and nothing is retried.
    fn run_later(
        &mut self,
        callback: Callback,
        delay: usize,
        unit: TimeUnit,
    ) -> Result<(), Callback>;

    /// [`Schedule::run_later`] in the default milliseconds unit.
    fn run_later_millis(&mut self, callback: Callback, delay: usize) -> Result<(), Callback> {
        self.run_later(callback, delay, TimeUnit::Millis)
    }

    /// [`Schedule::run_later`] against the microsecond counter. Worth it
    /// only when the host ticks often enough to observe tens of
    /// microseconds.
    fn run_later_micros(&mut self, callback: Callback, delay: usize) -> Result<(), Callback> {
        self.run_later(callback, delay, TimeUnit::Micros)
    }
}

impl Schedule for alloc::sync::Arc<spin::Mutex<dyn Schedule>> {
    fn run_later(
        &mut self,
        callback: Callback,
        delay: usize,
        unit: TimeUnit,
    ) -> Result<(), Callback> {
        self.lock().run_later(callback, delay, unit)
    }
}

/// What a firing callback gets to see: admission into the queue it came
/// from and the current counters.
pub trait DeferContext: Schedule + TimeContext {
    fn as_schedule(&mut self) -> &mut dyn Schedule;
    fn as_time_context(&self) -> &dyn TimeContext;
}

impl<T> DeferContext for T
where
    T: Schedule + TimeContext,
{
    fn as_schedule(&mut self) -> &mut dyn Schedule {
        self
    }
    fn as_time_context(&self) -> &dyn TimeContext {
        self
    }
}

/// A caller-managed receiver that a bound callback fires on.
///
/// Chained sequences are built here: the receiver can admit its next
/// stage through the context while it runs.
pub trait RunLater: Send {
    fn run_later(&mut self, context: &mut dyn DeferContext);
}

/// A deferred no-argument, no-return call.
///
/// Holds either a plain function or a method bound to a shared receiver.
/// The default value holds neither; calling it does nothing, so queue
/// slots can sit empty without being an error.
#[derive(Copy, Clone)]
pub enum Callback {
    None,
    Function(fn()),
    Bound(&'static spin::Mutex<dyn RunLater>),
}

impl Callback {
    /// Fire whatever is stored. An empty callback is a deliberate no-op.
    pub fn call(&self, context: &mut dyn DeferContext) {
        match self {
            Callback::None => (),
            Callback::Function(function) => function(),
            Callback::Bound(receiver) => receiver.lock().run_later(context),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Callback::None)
    }
}

impl Default for Callback {
    fn default() -> Self {
        Callback::None
    }
}

impl core::fmt::Debug for Callback {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Callback::None => write!(f, "Callback::None"),
            Callback::Function(_) => write!(f, "Callback::Function"),
            Callback::Bound(_) => write!(f, "Callback::Bound"),
        }
    }
}

impl From<fn()> for Callback {
    fn from(function: fn()) -> Self {
        Callback::Function(function)
    }
}

impl From<&'static spin::Mutex<dyn RunLater>> for Callback {
    fn from(receiver: &'static spin::Mutex<dyn RunLater>) -> Self {
        Callback::Bound(receiver)
    }
}
