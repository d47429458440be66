// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! One-shot load signals.
//!
//! A `LoadSignal` starts pending and settles exactly once, either resolved
//! with a value or rejected with an error. Continuations attached before
//! settlement are queued on the event loop at settlement time, in
//! attachment order. Continuations attached afterwards are queued
//! immediately with the stored outcome, so they still run on a later
//! microtask turn and never inside the caller.

use super::event_loop::EventLoop;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

type Continuation<T, E> = Box<dyn FnOnce(Result<T, E>)>;

/// Observable state of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalState {
    Pending,
    Resolved,
    Rejected,
}

struct Slot<T, E> {
    label: &'static str,
    outcome: Option<Result<T, E>>,
    continuations: Vec<Continuation<T, E>>,
}

/// A single-resolution future shared by cloning.
pub struct LoadSignal<T, E> {
    slot: Rc<RefCell<Slot<T, E>>>,
    event_loop: EventLoop,
}

impl<T, E> Clone for LoadSignal<T, E> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
            event_loop: self.event_loop.clone(),
        }
    }
}

impl<T, E> LoadSignal<T, E>
where
    T: Clone + 'static,
    E: Clone + fmt::Display + 'static,
{
    /// Create a pending signal. The label only shows up in logs.
    pub fn new(label: &'static str, event_loop: &EventLoop) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Slot {
                label,
                outcome: None,
                continuations: Vec::new(),
            })),
            event_loop: event_loop.clone(),
        }
    }

    pub fn state(&self) -> SignalState {
        match self.slot.borrow().outcome {
            None => SignalState::Pending,
            Some(Ok(_)) => SignalState::Resolved,
            Some(Err(_)) => SignalState::Rejected,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.state() != SignalState::Pending
    }

    /// The settled outcome, if any.
    pub fn outcome(&self) -> Option<Result<T, E>> {
        self.slot.borrow().outcome.clone()
    }

    /// Resolve the signal. Returns `false` if it had already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Reject the signal. Returns `false` if it had already settled.
    pub fn reject(&self, error: E) -> bool {
        self.settle(Err(error))
    }

    /// Settle with `outcome`; only the first call has any effect.
    pub fn settle(&self, outcome: Result<T, E>) -> bool {
        let (label, continuations) = {
            let mut slot = self.slot.borrow_mut();
            if slot.outcome.is_some() {
                log::debug!("Ignoring second settlement of {}", slot.label);
                return false;
            }
            slot.outcome = Some(outcome.clone());
            (slot.label, std::mem::take(&mut slot.continuations))
        };

        match &outcome {
            Ok(_) => log::debug!("{} resolved", label),
            Err(e) if continuations.is_empty() => {
                log::warn!("{} rejected with no handler attached: {}", label, e)
            }
            Err(e) => log::debug!("{} rejected: {}", label, e),
        }

        for continuation in continuations {
            let outcome = outcome.clone();
            self.event_loop
                .queue_microtask(move || continuation(outcome));
        }
        true
    }

    /// Attach a continuation that runs once with the settled outcome.
    pub fn then(&self, continuation: impl FnOnce(Result<T, E>) + 'static) {
        let settled = {
            let mut slot = self.slot.borrow_mut();
            if slot.outcome.is_none() {
                slot.continuations.push(Box::new(continuation));
                return;
            }
            slot.outcome.clone()
        };

        if let Some(outcome) = settled {
            self.event_loop
                .queue_microtask(move || continuation(outcome));
        }
    }

    /// Settle `target` with this signal's outcome once it is known.
    pub fn forward_to(&self, target: &LoadSignal<T, E>) {
        let target = target.clone();
        self.then(move |outcome| {
            target.settle(outcome);
        });
    }
}

/// Conjunction of two signals: resolves once both resolve, rejects as soon
/// as either rejects. No ordering between the two inputs is assumed.
pub fn join<A, B, E>(
    label: &'static str,
    first: &LoadSignal<A, E>,
    second: &LoadSignal<B, E>,
) -> LoadSignal<(A, B), E>
where
    A: Clone + 'static,
    B: Clone + 'static,
    E: Clone + fmt::Display + 'static,
{
    let joined = LoadSignal::new(label, &first.event_loop);
    let first_value: Rc<RefCell<Option<A>>> = Rc::new(RefCell::new(None));
    let second_value: Rc<RefCell<Option<B>>> = Rc::new(RefCell::new(None));

    {
        let joined = joined.clone();
        let first_value = first_value.clone();
        let second_value = second_value.clone();
        first.then(move |outcome| match outcome {
            Ok(a) => {
                let other = second_value.borrow_mut().take();
                match other {
                    Some(b) => {
                        joined.resolve((a, b));
                    }
                    None => *first_value.borrow_mut() = Some(a),
                }
            }
            Err(e) => {
                joined.reject(e);
            }
        });
    }

    {
        let joined = joined.clone();
        second.then(move |outcome| match outcome {
            Ok(b) => {
                let other = first_value.borrow_mut().take();
                match other {
                    Some(a) => {
                        joined.resolve((a, b));
                    }
                    None => *second_value.borrow_mut() = Some(b),
                }
            }
            Err(e) => {
                joined.reject(e);
            }
        });
    }

    joined
}
