//! Main thread work queue
//!
//! Allows background threads to queue work to execute on the main engine
//! thread. Registered as a built-in subsystem of every
//! [`Context`](crate::Context).

use std::thread::ThreadId;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

use crate::context::Subsystem;

/// A task to execute on the main thread
///
/// Receives the executing thread's ID and the queue it was posted to.
pub type MainThreadTask = Box<dyn FnOnce(ThreadId, &WorkQueue) + Send + 'static>;

/// Default capacity of the task queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Default number of tasks run per update
pub const DEFAULT_TASKS_PER_UPDATE: usize = 1024;

/// Errors posting a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TaskQueueError {
    #[error("Main thread task queue is full")]
    Full,
}

/// FIFO queue of callbacks run on the main thread
pub struct WorkQueue {
    sender: Sender<MainThreadTask>,
    receiver: Receiver<MainThreadTask>,
    main_thread: ThreadId,
    max_tasks_per_update: usize,
}

impl WorkQueue {
    /// Create a queue whose main thread is the calling thread
    ///
    /// A `capacity` of 0 makes the queue unbounded. A `max_tasks_per_update`
    /// of 0 drains the queue completely on every update.
    pub fn new(capacity: usize, max_tasks_per_update: usize) -> Self {
        let (sender, receiver) = if capacity == 0 {
            unbounded()
        } else {
            bounded(capacity)
        };

        Self {
            sender,
            receiver,
            main_thread: std::thread::current().id(),
            max_tasks_per_update,
        }
    }

    /// Override the thread considered the main thread
    pub fn with_main_thread(mut self, main_thread: ThreadId) -> Self {
        self.main_thread = main_thread;
        self
    }

    /// Queue a task to execute on the next update
    ///
    /// This is safe to call from any thread. Tasks run in the order they
    /// were posted.
    ///
    /// # Returns
    /// - `Ok(())` if the task was queued
    /// - `Err(TaskQueueError::Full)` if the queue is full (task is dropped)
    #[tracing::instrument(skip_all)]
    pub fn post_main_thread_task<F>(&self, task: F) -> Result<(), TaskQueueError>
    where
        F: FnOnce(ThreadId, &WorkQueue) + Send + 'static,
    {
        // The queue owns its receiver, so a send can only fail on capacity
        self.sender.try_send(Box::new(task)).map_err(|_| {
            tracing::warn!("Task queue full, dropping task");
            TaskQueueError::Full
        })
    }

    /// Process queued tasks
    ///
    /// Called by the engine on the main thread once per frame.
    /// Returns the number of tasks processed.
    #[tracing::instrument(skip(self))]
    pub fn process_main_thread_tasks(&self) -> usize {
        self.process_up_to(self.max_tasks_per_update)
    }

    /// Process at most `limit` queued tasks (0 = all)
    pub fn process_up_to(&self, limit: usize) -> usize {
        let thread = std::thread::current().id();
        if thread != self.main_thread {
            tracing::warn!("Main thread tasks processed from {:?}", thread);
        }

        let mut count = 0;
        while let Ok(task) = self.receiver.try_recv() {
            task(thread, self);
            count += 1;

            if limit != 0 && count >= limit {
                break;
            }
        }

        count
    }

    /// Check how many tasks are currently queued
    pub fn queued_task_count(&self) -> usize {
        self.receiver.len()
    }

    pub fn main_thread(&self) -> ThreadId {
        self.main_thread
    }

    pub fn is_main_thread(&self) -> bool {
        std::thread::current().id() == self.main_thread
    }
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY, DEFAULT_TASKS_PER_UPDATE)
    }
}

impl Subsystem for WorkQueue {
    const TYPE_NAME: &'static str = "WorkQueue";
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use parking_lot::Mutex;

    #[test]
    fn test_fifo_order() {
        let queue = WorkQueue::default();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5 {
            let seen = Arc::clone(&seen);
            queue
                .post_main_thread_task(move |_, _| seen.lock().push(i))
                .unwrap();
        }

        assert_eq!(queue.queued_task_count(), 5);
        assert_eq!(queue.process_main_thread_tasks(), 5);
        assert_eq!(*seen.lock(), [0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_callback_receives_thread_and_queue() {
        let queue = WorkQueue::default();
        let main = queue.main_thread();

        queue
            .post_main_thread_task(move |thread, q| {
                assert_eq!(thread, main);
                assert!(q.is_main_thread());
            })
            .unwrap();
        assert_eq!(queue.process_main_thread_tasks(), 1);
    }

    #[test]
    fn test_full_queue_rejects() {
        let queue = WorkQueue::new(1, 0);
        queue.post_main_thread_task(|_, _| {}).unwrap();
        assert_eq!(
            queue.post_main_thread_task(|_, _| {}),
            Err(TaskQueueError::Full)
        );
    }

    #[test]
    fn test_per_update_limit() {
        let queue = WorkQueue::new(0, 2);
        for _ in 0..5 {
            queue.post_main_thread_task(|_, _| {}).unwrap();
        }

        assert_eq!(queue.process_main_thread_tasks(), 2);
        assert_eq!(queue.process_main_thread_tasks(), 2);
        assert_eq!(queue.process_main_thread_tasks(), 1);
        assert_eq!(queue.process_main_thread_tasks(), 0);
    }

    #[test]
    fn test_posting_from_worker_thread() {
        let queue = Arc::new(WorkQueue::default());
        let worker = {
            let queue = Arc::clone(&queue);
            std::thread::spawn(move || {
                queue.post_main_thread_task(|_, _| {}).unwrap();
            })
        };
        worker.join().unwrap();

        assert_eq!(queue.process_main_thread_tasks(), 1);
    }

    #[test]
    fn test_tasks_posted_during_processing_run_later_in_same_update() {
        let queue = WorkQueue::new(0, 0);
        let ran = Arc::new(Mutex::new(0));

        let outer = Arc::clone(&ran);
        queue
            .post_main_thread_task(move |_, q| {
                *outer.lock() += 1;
                let inner = Arc::clone(&outer);
                q.post_main_thread_task(move |_, _| *inner.lock() += 1).unwrap();
            })
            .unwrap();

        assert_eq!(queue.process_main_thread_tasks(), 2);
        assert_eq!(*ran.lock(), 2);
    }
}
