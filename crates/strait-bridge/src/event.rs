//! The dedicated event thread.
//!
//! Classes tagged `ThreadAffinity::Event` have every operation marshaled
//! onto a single dedicated thread; the caller blocks on a one-shot
//! rendezvous until the event thread hands back the result (or the error,
//! which then re-raises on the calling thread). Calls that already run on
//! the event thread execute inline, so marshaled operations may nest.

use std::io;
use std::thread::{self, ThreadId};

use crossbeam::channel::{bounded, unbounded, Sender};

use crate::errors::{Error, Result};

type Job = Box<dyn FnOnce() + Send>;

pub(crate) struct EventExecutor {
    tx: Sender<Job>,
    thread_id: ThreadId,
}

impl EventExecutor {
    /// Spawn the event thread.
    pub(crate) fn start() -> io::Result<EventExecutor> {
        let (tx, rx) = unbounded::<Job>();
        let handle = thread::Builder::new()
            .name("strait-event".to_string())
            .spawn(move || {
                for job in rx {
                    job();
                }
            })?;
        Ok(EventExecutor {
            tx,
            thread_id: handle.thread().id(),
        })
    }

    /// Run `f` on the event thread and block for its result. Runs inline
    /// when already called from the event thread.
    pub(crate) fn run<R, F>(&self, f: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        if thread::current().id() == self.thread_id {
            return Ok(f());
        }

        let (done_tx, done_rx) = bounded::<R>(1);
        self.tx
            .send(Box::new(move || {
                let _ = done_tx.send(f());
            }))
            .map_err(|_| Error::Invocation("the event thread is not running".to_string()))?;
        done_rx
            .recv()
            .map_err(|_| Error::Invocation("the event thread dropped the operation".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs_on_dedicated_thread() {
        let executor = EventExecutor::start().unwrap();
        let caller = thread::current().id();
        let (first, second) = (
            executor.run(|| thread::current().id()).unwrap(),
            executor.run(|| thread::current().id()).unwrap(),
        );
        assert_ne!(first, caller);
        assert_eq!(first, second);
    }

    #[test]
    fn test_nested_run_executes_inline() {
        let executor = std::sync::Arc::new(EventExecutor::start().unwrap());
        let inner = executor.clone();
        let (outer_id, inner_id) = executor
            .run(move || {
                let outer = thread::current().id();
                let inner_id = inner.run(|| thread::current().id()).unwrap();
                (outer, inner_id)
            })
            .unwrap();
        assert_eq!(outer_id, inner_id);
    }

    #[test]
    fn test_result_values_cross_back() {
        let executor = EventExecutor::start().unwrap();
        let out: std::result::Result<i32, String> = executor.run(|| Err("boom".to_string())).unwrap();
        assert_eq!(out, Err("boom".to_string()));
    }
}
