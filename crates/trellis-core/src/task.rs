//! Deferred task queue for the UI thread.
//!
//! Listeners are notified while the component tree is being walked, so they
//! cannot mutate it directly. Instead they post a task; the owner of the
//! tree drains the queue once the current dispatch has finished.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::logging::targets;

type Task<C> = Box<dyn FnOnce(&mut C)>;

/// A cloneable handle to a FIFO queue of deferred tasks.
///
/// All clones share the same queue. The queue is single-threaded; work
/// finished on other threads must travel through a channel and be turned into
/// a task on the UI thread.
pub struct TaskQueue<C: ?Sized> {
    tasks: Rc<RefCell<VecDeque<Task<C>>>>,
}

impl<C: ?Sized> Clone for TaskQueue<C> {
    fn clone(&self) -> Self {
        Self {
            tasks: self.tasks.clone(),
        }
    }
}

impl<C: ?Sized> Default for TaskQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ?Sized> TaskQueue<C> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            tasks: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    /// Post a task to run after the current dispatch.
    pub fn post<F>(&self, task: F)
    where
        F: FnOnce(&mut C) + 'static,
    {
        let mut tasks = self.tasks.borrow_mut();
        tasks.push_back(Box::new(task));
        tracing::trace!(target: targets::TASK, pending = tasks.len(), "task posted");
    }

    /// Number of tasks waiting to run.
    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    /// Run queued tasks against `context` until the queue is empty.
    ///
    /// Tasks posted by running tasks are executed in the same call. Returns
    /// the number of tasks executed.
    pub fn run_pending(&self, context: &mut C) -> usize {
        let mut executed = 0;
        loop {
            // Release the borrow before running so tasks can post more work.
            let next = self.tasks.borrow_mut().pop_front();
            let Some(task) = next else {
                break;
            };
            task(context);
            executed += 1;
        }
        if executed > 0 {
            tracing::trace!(target: targets::TASK, executed, "tasks executed");
        }
        executed
    }
}

impl<C: ?Sized> fmt::Debug for TaskQueue<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("pending", &self.len())
            .finish()
    }
}
