//! Pull-based asynchronous task handles.
//!
//! A [`TaskHandle`] is the managed representation of an in-flight
//! asynchronous operation. It does not push completion anywhere; the
//! bridge polls it until it reports a terminal state. Managed method
//! bodies create one, hand it back wrapped in a `Value::Task`, and later
//! complete, fail, or cancel it from whatever thread finishes the work.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::CallError;
use crate::value::Value;

/// Observable state of a task. `Pending` is the only non-terminal state.
#[derive(Debug, Clone)]
pub enum TaskState {
    /// Still running.
    Pending,
    /// Finished with a value.
    Completed(Value),
    /// Finished with an error.
    Failed(CallError),
    /// Cancelled before completing.
    Cancelled,
}

impl TaskState {
    /// Whether this state ends the task.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskState::Pending)
    }
}

/// Shared handle to a task. Clones observe the same state.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    state: Arc<Mutex<TaskState>>,
}

impl TaskHandle {
    /// A new task in the `Pending` state.
    pub fn pending() -> Self {
        TaskHandle {
            state: Arc::new(Mutex::new(TaskState::Pending)),
        }
    }

    /// A task that is already completed with `value`.
    pub fn completed(value: Value) -> Self {
        TaskHandle {
            state: Arc::new(Mutex::new(TaskState::Completed(value))),
        }
    }

    /// Snapshot the current state without blocking on completion.
    pub fn poll(&self) -> TaskState {
        self.state.lock().clone()
    }

    /// Transition to `Completed`. Returns false if the task was already
    /// in a terminal state (the first terminal transition wins).
    pub fn complete(&self, value: Value) -> bool {
        self.transition(TaskState::Completed(value))
    }

    /// Transition to `Failed`. Returns false if already terminal.
    pub fn fail(&self, error: CallError) -> bool {
        self.transition(TaskState::Failed(error))
    }

    /// Transition to `Cancelled`. Returns false if already terminal.
    pub fn cancel(&self) -> bool {
        self.transition(TaskState::Cancelled)
    }

    /// Identity comparison: two handles are the same task if they share
    /// state.
    pub fn same_task(&self, other: &TaskHandle) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    fn transition(&self, next: TaskState) -> bool {
        let mut state = self.state.lock();
        if state.is_terminal() {
            return false;
        }
        *state = next;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_then_complete() {
        let task = TaskHandle::pending();
        assert!(matches!(task.poll(), TaskState::Pending));

        assert!(task.complete(Value::Int(7)));
        match task.poll() {
            TaskState::Completed(Value::Int(7)) => {}
            other => panic!("unexpected state: {:?}", other),
        }
    }

    #[test]
    fn test_first_terminal_transition_wins() {
        let task = TaskHandle::pending();
        assert!(task.fail(CallError::new("boom")));
        assert!(!task.complete(Value::Int(1)));
        assert!(!task.cancel());
        assert!(matches!(task.poll(), TaskState::Failed(_)));
    }

    #[test]
    fn test_clones_share_state() {
        let task = TaskHandle::pending();
        let clone = task.clone();
        assert!(task.same_task(&clone));

        clone.cancel();
        assert!(matches!(task.poll(), TaskState::Cancelled));
    }
}
