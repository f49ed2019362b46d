//! Designated single-threaded execution context
//!
//! Permission refreshes must run on one designated thread (the host's
//! main thread). [`MainThread`] implements [`ExecutionContext`] for that
//! thread in two flavors:
//!
//! - **Bound**: [`MainThread::bind_current`] binds to the calling thread
//!   and returns a [`TaskPump`] the host drives from its own tick loop
//! - **Spawned**: [`MainThread::spawn`] starts a dedicated worker thread
//!   that runs tasks as they arrive
//!
//! Tasks are queued on an unbounded channel and run in scheduling order.

use perms_subject::{ExecutionContext, Task};
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle, ThreadId};
use tokio::sync::mpsc;

use crate::error::{RuntimeError, RuntimeResult};

/// Handle to the designated context.
///
/// Shared by every publisher that dispatches onto it. A spawned worker
/// exits once every `MainThread` handle has been dropped.
#[derive(Debug)]
pub struct MainThread {
    thread_id: ThreadId,
    sender: mpsc::UnboundedSender<Task>,
}

impl MainThread {
    /// Bind the context to the calling thread.
    ///
    /// Scheduled tasks queue up until the host calls
    /// [`TaskPump::run_pending`] on this same thread.
    pub fn bind_current() -> (Self, TaskPump) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let thread_id = thread::current().id();
        (Self { thread_id, sender }, TaskPump { thread_id, receiver })
    }

    /// Start a dedicated worker thread named `name` as the context.
    pub fn spawn(name: &str) -> RuntimeResult<(Self, JoinHandle<()>)> {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Task>();

        let handle = thread::Builder::new().name(name.to_string()).spawn(move || {
            while let Some(task) = receiver.blocking_recv() {
                run_task(task);
            }
            tracing::debug!("Context worker drained and stopped");
        })?;

        let thread_id = handle.thread().id();
        Ok((Self { thread_id, sender }, handle))
    }

    /// The thread this context runs on.
    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }
}

impl ExecutionContext for MainThread {
    fn is_current(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    fn schedule(&self, task: Task) {
        if self.sender.send(task).is_err() {
            tracing::warn!("Context is closed; dropping scheduled task");
        }
    }
}

/// Receiving side of a bound [`MainThread`].
#[derive(Debug)]
pub struct TaskPump {
    thread_id: ThreadId,
    receiver: mpsc::UnboundedReceiver<Task>,
}

impl TaskPump {
    /// Run every task queued so far.
    ///
    /// # Returns
    ///
    /// The number of tasks run
    ///
    /// # Errors
    ///
    /// `WrongThread` if called from a thread other than the bound one
    pub fn run_pending(&mut self) -> RuntimeResult<usize> {
        if thread::current().id() != self.thread_id {
            return Err(RuntimeError::WrongThread);
        }

        let mut ran = 0;
        while let Ok(task) = self.receiver.try_recv() {
            run_task(task);
            ran += 1;
        }
        Ok(ran)
    }
}

/// Run one task, keeping the context alive if it panics.
fn run_task(task: Task) {
    if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
        tracing::error!("Scheduled task panicked");
    }
}
