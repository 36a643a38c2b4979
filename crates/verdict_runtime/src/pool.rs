//! Fixed worker pool over a shared task queue.
//!
//! Workers pull tasks in submission order. A task is handed a flag telling
//! it whether the run has been stopped; a stopped task is expected to drain
//! itself (emit its bypass events) rather than execute. In-flight tasks are
//! never interrupted.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// A unit of pooled work; receives `stopped` and reports success
pub type PoolTask<'a> = Box<dyn FnOnce(bool) -> bool + Send + 'a>;

/// Run every task on `nb_threads` workers.
///
/// With `stop_after_failure`, a failing task flips the stop flag and every
/// task dequeued afterwards observes `stopped = true`. Returns whether all
/// tasks reported success.
pub fn run_tasks(tasks: Vec<PoolTask<'_>>, nb_threads: usize, stop_after_failure: bool) -> bool {
    let queue = Mutex::new(tasks.into_iter().collect::<VecDeque<_>>());
    let stop = AtomicBool::new(false);
    let all_ok = AtomicBool::new(true);

    std::thread::scope(|scope| {
        for _ in 0..nb_threads {
            scope.spawn(|| {
                loop {
                    let task = {
                        let mut queue = queue
                            .lock()
                            .unwrap_or_else(std::sync::PoisonError::into_inner);
                        queue.pop_front()
                    };
                    let Some(task) = task else {
                        break;
                    };
                    let stopped = stop.load(Ordering::SeqCst);
                    let ok = task(stopped);
                    if !ok {
                        all_ok.store(false, Ordering::SeqCst);
                        if stop_after_failure {
                            stop.store(true, Ordering::SeqCst);
                        }
                    }
                }
            });
        }
    });

    all_ok.load(Ordering::SeqCst)
}
