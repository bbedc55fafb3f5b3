//! Timeline scheduler demo: three tasks on a 100-tick major frame treated
//! as a single sub-frame — `HRT1` finishes comfortably inside its deadline,
//! `HRT2` is built to overrun its and gets killed, and `SRT1` runs in the
//! residual time as best-effort filler. Mirrors the task mix and timing of
//! the scheduler's original demo configuration.

use std::time::Duration;

use timeline_abi::{TaskSpec, TimelinePlan};
use timeline_core::Dispatcher;
use timeline_host::ThreadRuntime;
use timeline_lib::SystemClock;

fn hrt1() {
    println!("HRT1: running");
    std::thread::sleep(Duration::from_millis(20));
    println!("HRT1: completed");
}

fn hrt2_deadline_miss() {
    println!("HRT2: running (will miss its deadline)");
    std::thread::sleep(Duration::from_millis(50));
    println!("HRT2: should never print this — the dispatcher kills it first");
}

fn srt1() {
    println!("SRT1: running");
}

static TASKS: [TaskSpec; 3] = [
    TaskSpec::hard("HRT1", hrt1, 10, 40, 0),
    TaskSpec::hard("HRT2", hrt2_deadline_miss, 50, 80, 0),
    TaskSpec::soft("SRT1", srt1, 0),
];

static PLAN: TimelinePlan = TimelinePlan {
    major_frame_ticks: 100,
    n_subframes: 1,
    subframe_ticks: 100,
    tasks: &TASKS,
};

const DISPATCHER_PRIORITY: u8 = 5;

fn main() {
    println!("--- Timeline Scheduler Demo ---");

    let runtime = ThreadRuntime::new();
    let clock = SystemClock::with_millisecond_ticks();

    let dispatcher = match Dispatcher::init(&PLAN, runtime, clock, DISPATCHER_PRIORITY) {
        Ok(dispatcher) => dispatcher,
        Err(err) => {
            eprintln!("ERROR: failed to initialize timeline scheduler: {err}");
            std::process::exit(1);
        }
    };

    // Three major frames is enough to show the steady-state pattern
    // without running forever in a demo binary; a real host calls `run()`
    // and never returns.
    dispatcher.run_cycles(3);
}
