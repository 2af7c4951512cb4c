//! A simulated host loop driving a scheduler off the process clock.
//!
//! Run with `cargo run --example host-loop`.

use deferq::{Callback, DeferContext, RunLater, Schedule, Scheduler, StdClock, TimeUnit};

fn hello() {
    println!("hello from a deferred call");
}

fn report_overflow() {
    println!("queue full, admission dropped");
}

struct Countdown {
    remaining: usize,
}

static COUNTDOWN: spin::Mutex<Countdown> = spin::Mutex::new(Countdown { remaining: 3 });

impl RunLater for Countdown {
    fn run_later(&mut self, context: &mut dyn DeferContext) {
        println!(
            "countdown {} at {}ms",
            self.remaining,
            context.now(TimeUnit::Millis)
        );
        if self.remaining > 0 {
            self.remaining -= 1;
            context
                .run_later(Callback::Bound(&COUNTDOWN), 100, TimeUnit::Millis)
                .expect("the fired entry freed a slot");
        }
    }
}

fn main() {
    let mut sched = Scheduler::with_capacity(2, StdClock::new());
    sched.set_overflow(Callback::Function(report_overflow));

    sched
        .run_later_millis(Callback::Function(hello), 50)
        .expect("queue has room");
    sched
        .run_later_millis(Callback::Bound(&COUNTDOWN), 100)
        .expect("queue has room");

    // a third admission does not fit; the hook reports it and the call
    // is simply dropped
    if sched.run_later_millis(Callback::Function(hello), 50).is_err() {
        println!("third admission rejected");
    }

    // the host loop: everything fires from here, nothing blocks
    while !sched.is_empty() {
        sched.tick();
    }
    println!("all deferred calls have run");
}
