//! Main thread dispatch
//!
//! [`Context::dispatch_to_main_thread`] posts a callback to the
//! [`WorkQueue`] and hands back a [`MainThreadOp`] that resolves to `true`
//! once the callback has run on the main thread.
//!
//! The operation is a single-producer/single-consumer signal: the posted
//! callback owns the [`Completion`] half and resolves it exactly once; the
//! caller observes the [`MainThreadOp`] half by awaiting it, blocking on it or
//! polling it. A continuation resumes on whichever thread polls the future,
//! which is not necessarily the thread that dispatched.
//!
//! # Limitations
//!
//! Operations cannot be cancelled. If the queue is torn down while the
//! callback is still pending, the completion is dropped unresolved and the
//! operation resolves to `false`.
//!
//! # Example
//!
//! ```ignore
//! let op = context.dispatch_to_main_thread()?;
//! // ... on a worker thread
//! assert!(op.wait());
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Poll, Waker};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::context::Context;
use crate::error::BridgeError;
use crate::tasks::WorkQueue;

#[derive(Default)]
struct OpState {
    result: Option<bool>,
    waker: Option<Waker>,
}

#[derive(Default)]
struct Shared {
    state: Mutex<OpState>,
    ready: Condvar,
}

impl Shared {
    fn resolve(&self, value: bool) {
        let waker = {
            let mut state = self.state.lock();
            if state.result.is_some() {
                return;
            }
            state.result = Some(value);
            state.waker.take()
        };

        self.ready.notify_all();
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

/// Create a linked pending operation and its completion token
pub fn pending_op() -> (MainThreadOp, Completion) {
    let shared = Arc::new(Shared::default());
    (
        MainThreadOp {
            shared: Arc::clone(&shared),
        },
        Completion {
            shared: Some(shared),
        },
    )
}

/// Caller side of a pending main thread operation
#[must_use = "a main thread operation does nothing unless awaited or waited on"]
pub struct MainThreadOp {
    shared: Arc<Shared>,
}

impl MainThreadOp {
    /// Poll without blocking
    pub fn try_result(&self) -> Option<bool> {
        self.shared.state.lock().result
    }

    pub fn is_resolved(&self) -> bool {
        self.try_result().is_some()
    }

    /// Block the calling thread until the operation resolves
    ///
    /// # Warning
    /// Never call from the main thread: the callback that resolves the
    /// operation runs there, so waiting on it would deadlock.
    pub fn wait(self) -> bool {
        let mut state = self.shared.state.lock();
        loop {
            if let Some(result) = state.result {
                return result;
            }
            self.shared.ready.wait(&mut state);
        }
    }

    /// Block until the operation resolves or `timeout` elapses
    pub fn wait_timeout(&self, timeout: Duration) -> Option<bool> {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock();
        while state.result.is_none() {
            if self
                .shared
                .ready
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                break;
            }
        }
        state.result
    }
}

impl Future for MainThreadOp {
    type Output = bool;

    fn poll(self: Pin<&mut Self>, cx: &mut std::task::Context<'_>) -> Poll<bool> {
        let mut state = self.shared.state.lock();
        match state.result {
            Some(result) => Poll::Ready(result),
            None => {
                state.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

/// Callback side of a pending operation
///
/// Resolving consumes the token, so it can only happen once. Dropping an
/// unresolved token resolves the operation to `false`.
pub struct Completion {
    shared: Option<Arc<Shared>>,
}

impl Completion {
    pub fn complete(mut self, value: bool) {
        if let Some(shared) = self.shared.take() {
            shared.resolve(value);
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            tracing::warn!("Main thread operation dropped before its callback ran");
            shared.resolve(false);
        }
    }
}

impl Context {
    /// Hop to the main thread
    ///
    /// Posts a callback to the [`WorkQueue`] subsystem; the returned
    /// operation resolves to `true` strictly after that callback has run.
    /// Each call posts its own callback and resolves independently.
    ///
    /// # Errors
    /// - [`BridgeError::SubsystemNotFound`] if the work queue was removed
    /// - [`BridgeError::Queue`] if the queue is full
    #[tracing::instrument(skip(self))]
    pub fn dispatch_to_main_thread(&self) -> Result<MainThreadOp, BridgeError> {
        let queue = self.get_subsystem::<WorkQueue>()?;
        let (op, completion) = pending_op();

        queue.post_main_thread_task(move |thread, _| {
            tracing::trace!("Main thread hop completed on {:?}", thread);
            completion.complete(true);
        })?;

        Ok(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::pin;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::task::Wake;
    use std::thread::{self, Thread};

    use crate::config::CoreConfig;
    use crate::native::NullRegistry;

    struct ThreadWaker(Thread);

    impl Wake for ThreadWaker {
        fn wake(self: Arc<Self>) {
            self.0.unpark();
        }
    }

    fn block_on<F: Future>(future: F) -> F::Output {
        let mut future = pin!(future);
        let waker = Waker::from(Arc::new(ThreadWaker(thread::current())));
        let mut cx = std::task::Context::from_waker(&waker);
        loop {
            match future.as_mut().poll(&mut cx) {
                Poll::Ready(output) => return output,
                Poll::Pending => thread::park(),
            }
        }
    }

    fn context() -> Arc<Context> {
        Context::new_detached(CoreConfig::default(), Box::new(NullRegistry))
    }

    #[test]
    fn test_completion_resolves_once() {
        let (op, completion) = pending_op();
        assert_eq!(op.try_result(), None);

        completion.complete(true);
        assert_eq!(op.try_result(), Some(true));
        assert!(op.wait());
    }

    #[test]
    fn test_dropped_completion_resolves_false() {
        let (op, completion) = pending_op();
        drop(completion);
        assert_eq!(op.try_result(), Some(false));
    }

    #[test]
    fn test_wait_timeout_without_resolution() {
        let (op, _completion) = pending_op();
        assert_eq!(op.wait_timeout(Duration::from_millis(10)), None);
    }

    #[test]
    fn test_resolves_only_after_callback_runs() {
        let context = context();
        let op = context.dispatch_to_main_thread().unwrap();

        // Nothing has run on the main thread yet
        assert!(!op.is_resolved());

        assert_eq!(context.process_main_thread_tasks(), 1);
        assert_eq!(op.try_result(), Some(true));
    }

    #[test]
    fn test_independent_resolutions() {
        let context = context();
        let ops: Vec<_> = (0..3)
            .map(|_| context.dispatch_to_main_thread().unwrap())
            .collect();

        let queue = context.get_subsystem::<WorkQueue>().unwrap();
        assert_eq!(queue.queued_task_count(), 3);

        // Run the callbacks one at a time and check each op flips on its own
        for (i, op) in ops.iter().enumerate() {
            assert!(!op.is_resolved());
            assert_eq!(queue.process_up_to(1), 1);
            assert_eq!(op.try_result(), Some(true));
            for later in &ops[i + 1..] {
                assert!(!later.is_resolved());
            }
        }
    }

    #[test]
    fn test_await_from_worker_thread() {
        let context = context();
        let op = context.dispatch_to_main_thread().unwrap();
        let observed_before = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&observed_before);
        let worker = thread::spawn(move || {
            let result = block_on(op);
            flag.store(true, Ordering::SeqCst);
            result
        });

        thread::sleep(Duration::from_millis(20));
        assert!(!observed_before.load(Ordering::SeqCst));

        context.process_main_thread_tasks();
        assert!(worker.join().unwrap());
    }

    #[test]
    fn test_queue_teardown_resolves_false() {
        let context = context();
        let op = context.dispatch_to_main_thread().unwrap();

        // Dropping the last reference to the queue drops the pending task
        assert!(context.remove_subsystem::<WorkQueue>());
        assert_eq!(op.try_result(), Some(false));
    }

    #[test]
    fn test_missing_queue() {
        let context = context();
        context.remove_subsystem::<WorkQueue>();
        assert!(matches!(
            context.dispatch_to_main_thread(),
            Err(BridgeError::SubsystemNotFound { .. })
        ));
    }
}
