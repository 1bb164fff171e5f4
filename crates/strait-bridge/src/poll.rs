//! Adapter from pull-based task handles to push-style future callbacks.
//!
//! A [`PolledFuture`] repeatedly checks a [`TaskHandle`] on one shared
//! background thread with a short fixed delay between checks. Once the
//! handle reports a terminal state, the matching future callback fires
//! exactly once and polling stops; cancellation flows through the failure
//! entry point as a rendered cancellation trace.
//!
//! The single shared thread caps throughput under many pending futures;
//! that simplicity is deliberate.

use std::thread;
use std::time::Duration;

use crossbeam::channel::{unbounded, Sender};
use log::error;
use once_cell::sync::Lazy;

use strait_core::{CallError, TaskHandle, TaskState, Value};

use crate::callback::FutureBridge;

/// Fixed delay between completion checks.
const POLL_INTERVAL: Duration = Duration::from_micros(250);

type Job = Box<dyn FnOnce() + Send>;

struct PollScheduler {
    tx: Sender<Job>,
}

impl PollScheduler {
    fn start() -> PollScheduler {
        let (tx, rx) = unbounded::<Job>();
        thread::Builder::new()
            .name("strait-poll".to_string())
            .spawn(move || {
                for job in rx {
                    thread::sleep(POLL_INTERVAL);
                    job();
                }
            })
            .expect("failed to spawn the shared poll thread");
        PollScheduler { tx }
    }

    fn schedule(&self, job: Job) {
        // The poll thread lives for the whole process; a send can only
        // fail during teardown, when nothing is left to complete.
        let _ = self.tx.send(job);
    }
}

static SCHEDULER: Lazy<PollScheduler> = Lazy::new(PollScheduler::start);

/// Bridges one task handle to the future callbacks of one target object.
pub struct PolledFuture;

impl PolledFuture {
    /// Start polling `task`; on completion, fire the future callback of
    /// `target` (whose future slot must already be armed).
    pub fn bridge(task: TaskHandle, target: Value) {
        Self::schedule(task, target);
    }

    fn schedule(task: TaskHandle, target: Value) {
        SCHEDULER.schedule(Box::new(move || Self::try_complete(task, target)));
    }

    fn try_complete(task: TaskHandle, target: Value) {
        let outcome = match task.poll() {
            TaskState::Pending => {
                Self::schedule(task, target);
                return;
            }
            TaskState::Completed(value) => {
                FutureBridge::of(&target).and_then(|bridge| bridge.succeed(Some(value)))
            }
            TaskState::Failed(call_error) => {
                FutureBridge::of(&target).and_then(|bridge| bridge.fail(&call_error))
            }
            TaskState::Cancelled => FutureBridge::of(&target)
                .and_then(|bridge| bridge.fail(&CallError::cancelled())),
        };
        if let Err(e) = outcome {
            // Nothing is synchronously waiting; the loss is only loggable.
            error!("polled future could not complete its callback: {}", e);
        }
    }
}
