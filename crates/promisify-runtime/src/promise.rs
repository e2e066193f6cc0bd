//! Deferred results
//!
//! A [`Promise`] is a cloneable future over a [`Settlement`]. Its paired
//! [`Resolver`] settles it at most once; the first call to `resolve` or
//! `reject` wins and later calls are ignored. There is no cancellation: a
//! promise whose resolver is dropped unsettled stays pending forever.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use futures::future::{self, BoxFuture, Either, FutureExt, Shared};
use parking_lot::Mutex;

use crate::value::Value;

/// Outcome of a promise: `Ok` is the fulfilled value, `Err` the rejection reason
pub type Settlement = Result<Value, Value>;

/// Global counter for promise identities
static NEXT_PROMISE_ID: AtomicU64 = AtomicU64::new(1);

/// Cloneable deferred result. Clones observe the same settlement.
#[derive(Clone)]
pub struct Promise {
    id: u64,
    inner: Shared<BoxFuture<'static, Settlement>>,
}

impl Promise {
    /// Wrap any future producing a settlement
    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = Settlement> + Send + 'static,
    {
        Self {
            id: NEXT_PROMISE_ID.fetch_add(1, Ordering::Relaxed),
            inner: future.boxed().shared(),
        }
    }

    /// Already-fulfilled promise
    pub fn resolved(value: Value) -> Self {
        Self::from_future(future::ready(Ok(value)))
    }

    /// Already-rejected promise
    pub fn rejected(reason: Value) -> Self {
        Self::from_future(future::ready(Err(reason)))
    }

    /// Unique promise identity
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Read the outcome without waiting. `None` while pending.
    pub fn settled(&self) -> Option<Settlement> {
        self.inner.clone().now_or_never()
    }

    /// Check if the promise has not settled yet
    pub fn is_pending(&self) -> bool {
        self.settled().is_none()
    }
}

impl Future for Promise {
    type Output = Settlement;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx)
    }
}

impl PartialEq for Promise {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.settled() {
            None => "pending",
            Some(Ok(_)) => "fulfilled",
            Some(Err(_)) => "rejected",
        };
        f.debug_struct("Promise")
            .field("id", &self.id)
            .field("state", &state)
            .finish()
    }
}

/// Settle handle for a [`Promise`]
#[derive(Clone)]
pub struct Resolver {
    sender: Arc<Mutex<Option<oneshot::Sender<Settlement>>>>,
}

impl Resolver {
    /// Fulfil with `value`. Returns true if this call settled the promise.
    pub fn resolve(&self, value: Value) -> bool {
        self.settle(Ok(value))
    }

    /// Reject with `reason`. Returns true if this call settled the promise.
    pub fn reject(&self, reason: Value) -> bool {
        self.settle(Err(reason))
    }

    /// Settle with an explicit outcome. Only the first call has an effect.
    pub fn settle(&self, outcome: Settlement) -> bool {
        match self.sender.lock().take() {
            Some(tx) => {
                // Every promise clone may already be gone; the outcome is then unobserved.
                let _ = tx.send(outcome);
                true
            }
            None => false,
        }
    }

    /// Check if a settlement has been delivered
    pub fn is_settled(&self) -> bool {
        self.sender.lock().is_none()
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("settled", &self.is_settled())
            .finish()
    }
}

/// A promise together with its resolver
#[derive(Debug, Clone)]
pub struct Deferred {
    /// Consumer side
    pub promise: Promise,
    /// Producer side
    pub resolver: Resolver,
}

impl Deferred {
    /// Create a pending promise and its resolver
    pub fn new() -> Self {
        let (tx, rx) = oneshot::channel::<Settlement>();
        let settlement = rx.then(|received| match received {
            Ok(outcome) => Either::Left(future::ready(outcome)),
            Err(oneshot::Canceled) => Either::Right(future::pending::<Settlement>()),
        });
        Self {
            promise: Promise::from_future(settlement),
            resolver: Resolver {
                sender: Arc::new(Mutex::new(Some(tx))),
            },
        }
    }
}

impl Default for Deferred {
    fn default() -> Self {
        Self::new()
    }
}
