//! Fixed-size worker pool with a quiescence barrier.
//!
//! Workers pull jobs from one FIFO queue. [`Scheduler::wait_until_idle`]
//! blocks until the queue is empty and no job is running. A job that fails
//! or panics never takes its worker down: the failure is stored and handed
//! to the coordinator through [`Scheduler::take_failures`].

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Context, Result};

/// A unit of work run on a worker thread.
pub type Job = Box<dyn FnOnce() -> Result<()> + Send + 'static>;

/// Worker count used when available parallelism cannot be determined.
const FALLBACK_THREADS: usize = 4;

#[derive(Default)]
struct State {
    queue: VecDeque<Job>,
    in_flight: usize,
    stop: bool,
}

#[derive(Default)]
struct Shared {
    state: Mutex<State>,
    work_available: Condvar,
    idle: Condvar,
    failures: Mutex<Vec<anyhow::Error>>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record_failure(&self, error: anyhow::Error) {
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(error);
    }
}

/// Thread pool used for compile jobs.
pub struct Scheduler {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

/// Default worker count: available parallelism, or 4 when unknown.
pub fn default_threads() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(FALLBACK_THREADS)
}

impl Scheduler {
    /// Start a pool with `threads` workers. Zero means [`default_threads`].
    pub fn new(threads: usize) -> Result<Self> {
        let threads = if threads == 0 {
            default_threads()
        } else {
            threads
        };

        let shared = Arc::new(Shared::default());
        let mut workers = Vec::with_capacity(threads);

        for n in 0..threads {
            let shared = Arc::clone(&shared);
            let handle = thread::Builder::new()
                .name(format!("ymake-worker-{}", n))
                .spawn(move || worker_loop(&shared))
                .with_context(|| format!("failed to spawn worker thread {}", n))?;
            workers.push(handle);
        }

        tracing::debug!("started {} worker threads", threads);

        Ok(Scheduler { shared, workers })
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.workers.len()
    }

    /// Enqueue a job.
    pub fn submit<F>(&self, job: F)
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        {
            let mut state = self.shared.state();
            state.queue.push_back(Box::new(job));
            state.in_flight += 1;
        }
        self.shared.work_available.notify_one();
    }

    /// Block until every submitted job has finished.
    pub fn wait_until_idle(&self) {
        let mut state = self.shared.state();
        while !(state.queue.is_empty() && state.in_flight == 0) {
            state = self
                .shared
                .idle
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Drain the failures recorded since the last call.
    pub fn take_failures(&self) -> Vec<anyhow::Error> {
        std::mem::take(
            &mut *self
                .shared
                .failures
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }

    /// Stop the workers. Queued jobs that have not started are dropped.
    pub fn shutdown(&mut self) {
        {
            let mut state = self.shared.state();
            state.stop = true;
            let dropped = state.queue.len();
            state.queue.clear();
            state.in_flight -= dropped;
        }
        self.shared.work_available.notify_all();
        self.shared.idle.notify_all();

        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("worker thread panicked during shutdown");
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(shared: &Shared) {
    loop {
        let job = {
            let mut state = shared.state();
            loop {
                if state.stop {
                    return;
                }
                if let Some(job) = state.queue.pop_front() {
                    break job;
                }
                state = shared
                    .work_available
                    .wait(state)
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
            }
        };

        match panic::catch_unwind(AssertUnwindSafe(job)) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => shared.record_failure(e),
            Err(payload) => {
                shared.record_failure(anyhow!("job panicked: {}", panic_message(&*payload)))
            }
        }

        let mut state = shared.state();
        state.in_flight -= 1;
        if state.queue.is_empty() && state.in_flight == 0 {
            shared.idle.notify_all();
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
