//! The scheduling context handed to firing callbacks.

use crate::callback::{Callback, Schedule};
use crate::ring::Ring;
use crate::sched::Deferred;
use crate::time::{Clock, TimeContext, TimeUnit};

/// Admission into a queue the scheduler has opened up for a callback.
///
/// Admissions made through a context stamp their creation time from the
/// scheduler's clock, exactly like host-side admissions. A full queue
/// reports the failure straight to the caller without invoking the
/// overflow hook, so a hook that schedules cannot recurse into itself.
pub struct QueueContext<'a, C>
where
    C: Clock,
{
    queue: &'a mut Ring<Deferred>,
    clock: &'a C,
}

impl<'a, C> QueueContext<'a, C>
where
    C: Clock,
{
    pub(crate) fn new(queue: &'a mut Ring<Deferred>, clock: &'a C) -> Self {
        Self { queue, clock }
    }
}

impl<'a, C> Schedule for QueueContext<'a, C>
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
        self.queue
            .push(Deferred::new(callback, created, delay, unit))
            .map_err(|rejected| rejected.into_callback())
    }
}

impl<'a, C> TimeContext for QueueContext<'a, C>
where
    C: Clock,
{
    fn now(&self, unit: TimeUnit) -> usize {
        self.clock.now(unit)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::time::CounterClock;

    /// A context for exercising callbacks outside a scheduler. Counts
    /// admissions and reports fixed counter values.
    pub struct TestContext {
        pub admitted: usize,
        pub now_millis: usize,
        pub now_micros: usize,
    }

    impl TestContext {
        pub fn new() -> Self {
            Self {
                admitted: 0,
                now_millis: 0,
                now_micros: 0,
            }
        }
    }

    impl Schedule for TestContext {
        fn run_later(
            &mut self,
            _callback: Callback,
            _delay: usize,
            _unit: TimeUnit,
        ) -> Result<(), Callback> {
            self.admitted += 1;
            Ok(())
        }
    }

    impl TimeContext for TestContext {
        fn now(&self, unit: TimeUnit) -> usize {
            match unit {
                TimeUnit::Millis => self.now_millis,
                TimeUnit::Micros => self.now_micros,
            }
        }
    }

    #[test]
    fn admission_stamps_from_the_matching_source() {
        let clock = CounterClock::new();
        clock.set_millis(42);
        clock.set_micros(9000);

        let mut queue: Ring<Deferred> = Ring::with_capacity(2);
        {
            let mut context = QueueContext::new(&mut queue, &clock);
            context
                .run_later(Callback::None, 10, TimeUnit::Millis)
                .unwrap();
            context
                .run_later(Callback::None, 10, TimeUnit::Micros)
                .unwrap();
        }

        let by_millis = queue.pop().unwrap();
        assert_eq!(42, by_millis.created);
        assert_eq!(TimeUnit::Millis, by_millis.unit);

        let by_micros = queue.pop().unwrap();
        assert_eq!(9000, by_micros.created);
        assert_eq!(TimeUnit::Micros, by_micros.unit);
    }

    #[test]
    fn full_queue_hands_the_callback_back() {
        let clock = CounterClock::new();
        let mut queue: Ring<Deferred> = Ring::with_capacity(0);
        let mut context = QueueContext::new(&mut queue, &clock);
        let rejected = context.run_later(Callback::None, 0, TimeUnit::Millis);
        assert!(rejected.is_err());
    }

    #[test]
    fn context_reads_the_clock() {
        let clock = CounterClock::new();
        clock.set_millis(7);
        clock.set_micros(7000);

        let mut queue: Ring<Deferred> = Ring::with_capacity(1);
        let context = QueueContext::new(&mut queue, &clock);
        assert_eq!(7, context.now(TimeUnit::Millis));
        assert_eq!(7000, context.now(TimeUnit::Micros));
    }
}
