// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Single-threaded task queue.
//!
//! The player runs entirely on the UI thread. Work that has to block
//! (HTTP requests) runs on a short-lived worker thread and its result is
//! handed back through a channel, the same way background image loading
//! used to be polled from `update`. Continuations that must not run
//! re-entrantly are queued as microtasks and drained at the end of every
//! turn.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::mpsc::{channel, Receiver, RecvError, TryRecvError};
use thiserror::Error;

type Microtask = Box<dyn FnOnce()>;

/// The worker thread ended without delivering a result (it panicked).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("background worker exited without a result")]
pub struct WorkerLost;

/// A blocking job whose result is awaited on the loop thread.
trait PendingJob {
    /// Try to deliver the job's result. Returns `true` once the
    /// continuation has run and the job can be dropped.
    fn poll(&mut self, block: bool) -> bool;
}

struct ChannelJob<T> {
    receiver: Receiver<T>,
    then: Option<Box<dyn FnOnce(Result<T, WorkerLost>)>>,
}

impl<T> PendingJob for ChannelJob<T> {
    fn poll(&mut self, block: bool) -> bool {
        let result = if block {
            match self.receiver.recv() {
                Ok(value) => Ok(value),
                Err(RecvError) => Err(WorkerLost),
            }
        } else {
            match self.receiver.try_recv() {
                Ok(value) => Ok(value),
                Err(TryRecvError::Empty) => return false,
                Err(TryRecvError::Disconnected) => Err(WorkerLost),
            }
        };

        if result.is_err() {
            log::error!("Background job lost its worker thread");
        }
        if let Some(then) = self.then.take() {
            then(result);
        }
        true
    }
}

#[derive(Default)]
struct Inner {
    microtasks: RefCell<VecDeque<Microtask>>,
    jobs: RefCell<Vec<Box<dyn PendingJob>>>,
}

/// Cloneable handle to the loop. All clones share the same queues.
#[derive(Clone, Default)]
pub struct EventLoop {
    inner: Rc<Inner>,
}

impl EventLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a continuation for the end of the current turn.
    pub fn queue_microtask(&self, task: impl FnOnce() + 'static) {
        self.inner.microtasks.borrow_mut().push_back(Box::new(task));
    }

    /// Run `work` on a worker thread and `then` on the loop thread with its
    /// result, during a later `turn`.
    pub fn spawn_blocking<T, W, F>(&self, work: W, then: F)
    where
        T: Send + 'static,
        W: FnOnce() -> T + Send + 'static,
        F: FnOnce(Result<T, WorkerLost>) + 'static,
    {
        let (sender, receiver) = channel();
        std::thread::spawn(move || {
            let _ = sender.send(work());
        });
        self.inner.jobs.borrow_mut().push(Box::new(ChannelJob {
            receiver,
            then: Some(Box::new(then)),
        }));
    }

    /// Number of blocking jobs still in flight.
    pub fn pending_jobs(&self) -> usize {
        self.inner.jobs.borrow().len()
    }

    /// Whether anything is queued or in flight.
    pub fn is_idle(&self) -> bool {
        self.pending_jobs() == 0 && self.inner.microtasks.borrow().is_empty()
    }

    /// Deliver every finished job, then drain the microtask queue.
    /// Never blocks. Returns the number of callbacks that ran.
    pub fn turn(&self) -> usize {
        let mut ran = self.poll_jobs(false);
        ran += self.drain_microtasks();
        ran
    }

    /// Keep turning, blocking on outstanding jobs, until nothing is left.
    pub fn run_until_idle(&self) {
        loop {
            self.drain_microtasks();
            if self.pending_jobs() == 0 {
                break;
            }
            self.poll_jobs(true);
        }
    }

    fn drain_microtasks(&self) -> usize {
        let mut ran = 0;
        loop {
            // The borrow must end before the task runs: tasks queue more tasks.
            let next = self.inner.microtasks.borrow_mut().pop_front();
            match next {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => break,
            }
        }
        ran
    }

    fn poll_jobs(&self, block: bool) -> usize {
        let jobs = std::mem::take(&mut *self.inner.jobs.borrow_mut());
        let mut still_pending = Vec::new();
        let mut ran = 0;
        let mut blocked_once = false;

        for mut job in jobs {
            // When blocking, wait on the oldest job only; the rest are polled.
            let wait = block && !blocked_once;
            blocked_once |= wait;
            if job.poll(wait) {
                ran += 1;
            } else {
                still_pending.push(job);
            }
        }

        // Continuations may have spawned new jobs in the meantime.
        let mut jobs = self.inner.jobs.borrow_mut();
        still_pending.append(&mut jobs);
        *jobs = still_pending;
        ran
    }
}
