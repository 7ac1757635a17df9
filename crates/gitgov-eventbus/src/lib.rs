// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
//! gitgov-eventbus
//!
//! An in-process, typed publish/subscribe bus. `publish` is non-blocking
//! for the caller: it enqueues the event onto each matching subscription's
//! own queue and returns. Handlers for a given subscription run serially,
//! FIFO; different subscriptions run independently, each on its own
//! background task. [`EventBus::wait_for_idle`] resolves once every queue is
//! drained and no handler is executing — the mechanism tests and
//! quiescence-sensitive handlers use instead of polling.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex, Notify};
use tracing::{debug, warn};
use uuid::Uuid;

/// A boxed, `Send` future with no output — what a handler invocation drives.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<(), String>> + Send>>;

/// A subscription's handler: takes an [`Event`], returns a future that
/// resolves to `Ok(())` or an error string. Errors are logged and isolated —
/// they never reach the publisher and never stop other subscriptions.
pub type Handler = Arc<dyn Fn(Event) -> HandlerFuture + Send + Sync>;

/// An event published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Dotted event type, e.g. `"feedback.created"`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Epoch-milliseconds timestamp.
    pub timestamp: i64,
    /// Free-form identifier of the publisher (an adapter name, or `"system"`).
    pub source: String,
    /// Event-specific payload.
    pub payload: serde_json::Value,
}

impl Event {
    /// Build an event stamped with the current time.
    #[must_use]
    pub fn new(event_type: impl Into<String>, source: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            timestamp: Utc::now().timestamp_millis(),
            source: source.into(),
            payload,
        }
    }
}

/// Well-known event type strings (spec.md §4.3).
pub mod event_types {
    /// Emitted by `IdentityAdapter::createActor`.
    pub const ACTOR_CREATED: &str = "identity.actor.created";
    /// Emitted by `IdentityAdapter::revokeActor`.
    pub const ACTOR_REVOKED: &str = "identity.actor.revoked";
    /// Emitted by the agent adapter on registration.
    pub const AGENT_REGISTERED: &str = "identity.agent.registered";
    /// Emitted by `FeedbackAdapter::create` and `FeedbackAdapter::resolve`.
    pub const FEEDBACK_CREATED: &str = "feedback.created";
    /// Emitted when a feedback's status changes (reserved for future use).
    pub const FEEDBACK_STATUS_CHANGED: &str = "feedback.status.changed";
    /// Emitted when a new execution record is appended.
    pub const EXECUTION_CREATED: &str = "execution.created";
    /// Emitted when a new changelog record is appended.
    pub const CHANGELOG_CREATED: &str = "changelog.created";
    /// Emitted when a cycle's status changes.
    pub const CYCLE_STATUS_CHANGED: &str = "cycle.status.changed";
    /// Emitted by the scheduler that drives daily health audits.
    pub const SYSTEM_DAILY_TICK: &str = "system.daily_tick";
}

/// Identifies a live subscription, returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub Uuid);

/// Read-only snapshot of a subscription, for [`EventBus::subscriptions`].
#[derive(Debug, Clone)]
pub struct SubscriptionInfo {
    /// The subscription id.
    pub id: SubscriptionId,
    /// The event type it listens for.
    pub event_type: String,
}

struct Subscription {
    event_type: String,
    sender: mpsc::UnboundedSender<Event>,
    /// Dropping this aborts the subscription's worker task.
    _worker: tokio::task::JoinHandle<()>,
}

struct Inner {
    subscriptions: Mutex<HashMap<SubscriptionId, Subscription>>,
    inflight: AtomicI64,
    idle: Notify,
}

/// The event bus itself. Cheaply cloneable (`Arc`-backed); share one
/// instance across every adapter that needs to publish or subscribe.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Inner>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Create an empty bus with no subscriptions.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                subscriptions: Mutex::new(HashMap::new()),
                inflight: AtomicI64::new(0),
                idle: Notify::new(),
            }),
        }
    }

    /// Register a handler for `event_type`. Returns a [`SubscriptionId`]
    /// usable with [`EventBus::unsubscribe`].
    pub async fn subscribe(&self, event_type: impl Into<String>, handler: Handler) -> SubscriptionId {
        let event_type = event_type.into();
        let id = SubscriptionId(Uuid::new_v4());
        let (tx, mut rx) = mpsc::unbounded_channel::<Event>();

        let inner = self.inner.clone();
        let sub_event_type = event_type.clone();
        let worker = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(reason) = handler(event).await {
                    warn!(
                        event_type = %sub_event_type,
                        %reason,
                        "event handler failed; isolating and continuing"
                    );
                }
                if inner.inflight.fetch_sub(1, Ordering::SeqCst) == 1 {
                    inner.idle.notify_waiters();
                }
            }
        });

        let mut subs = self.inner.subscriptions.lock().await;
        subs.insert(
            id,
            Subscription {
                event_type,
                sender: tx,
                _worker: worker,
            },
        );
        id
    }

    /// Remove a subscription. Its queue is dropped and its worker task ends.
    pub async fn unsubscribe(&self, id: SubscriptionId) {
        let mut subs = self.inner.subscriptions.lock().await;
        if let Some(sub) = subs.remove(&id) {
            sub._worker.abort();
        }
    }

    /// Snapshot of all live subscriptions.
    pub async fn subscriptions(&self) -> Vec<SubscriptionInfo> {
        let subs = self.inner.subscriptions.lock().await;
        subs.iter()
            .map(|(id, s)| SubscriptionInfo {
                id: *id,
                event_type: s.event_type.clone(),
            })
            .collect()
    }

    /// Remove every subscription.
    pub async fn clear_subscriptions(&self) {
        let mut subs = self.inner.subscriptions.lock().await;
        for (_, sub) in subs.drain() {
            sub._worker.abort();
        }
    }

    /// Enqueue `event` onto every subscription whose `event_type` matches.
    /// Returns immediately; handlers run asynchronously on their own
    /// subscription's worker task.
    pub async fn publish(&self, event: Event) {
        debug!(event_type = %event.event_type, source = %event.source, "publishing event");
        let subs = self.inner.subscriptions.lock().await;
        for sub in subs.values() {
            if sub.event_type != event.event_type {
                continue;
            }
            self.inner.inflight.fetch_add(1, Ordering::SeqCst);
            if sub.sender.send(event.clone()).is_err() {
                // Receiver's worker already gone; undo the increment.
                if self.inner.inflight.fetch_sub(1, Ordering::SeqCst) == 1 {
                    self.inner.idle.notify_waiters();
                }
            }
        }
    }

    /// Resolve once every subscription's queue is empty and no handler is
    /// currently executing. Race-safe: notifications sent between the
    /// reservation and the await are not lost.
    pub async fn wait_for_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.inner.inflight.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Mutex as TokioMutex;

    fn counting_handler(counter: Arc<AtomicUsize>) -> Handler {
        Arc::new(move |_event| {
            let counter = counter.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        })
    }

    #[tokio::test]
    async fn publish_is_delivered_and_idle_waits() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        bus.subscribe("feedback.created", counting_handler(count.clone()))
            .await;

        bus.publish(Event::new("feedback.created", "test", serde_json::json!({})))
            .await;
        bus.wait_for_idle().await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn non_matching_event_type_is_ignored() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        bus.subscribe("feedback.created", counting_handler(count.clone()))
            .await;

        bus.publish(Event::new("execution.created", "test", serde_json::json!({})))
            .await;
        bus.wait_for_idle().await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn handlers_for_one_subscription_run_in_fifo_order() {
        let bus = EventBus::new();
        let order = Arc::new(TokioMutex::new(Vec::new()));
        let order_clone = order.clone();
        let handler: Handler = Arc::new(move |event| {
            let order = order_clone.clone();
            Box::pin(async move {
                let n = event.payload["n"].as_i64().unwrap();
                // Simulate slightly variable work to stress FIFO ordering.
                tokio::task::yield_now().await;
                order.lock().await.push(n);
                Ok(())
            })
        });
        bus.subscribe("cycle.status.changed", handler).await;

        for n in 0..10 {
            bus.publish(Event::new(
                "cycle.status.changed",
                "test",
                serde_json::json!({ "n": n }),
            ))
            .await;
        }
        bus.wait_for_idle().await;

        let seen = order.lock().await.clone();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn handler_error_is_isolated() {
        let bus = EventBus::new();
        let failing: Handler = Arc::new(|_event| Box::pin(async move { Err("boom".to_string()) }));
        let count = Arc::new(AtomicUsize::new(0));
        bus.subscribe("feedback.created", failing).await;
        bus.subscribe("feedback.created", counting_handler(count.clone()))
            .await;

        bus.publish(Event::new("feedback.created", "test", serde_json::json!({})))
            .await;
        bus.wait_for_idle().await;

        // The second subscription still ran despite the first erroring.
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let id = bus
            .subscribe("feedback.created", counting_handler(count.clone()))
            .await;
        bus.unsubscribe(id).await;

        bus.publish(Event::new("feedback.created", "test", serde_json::json!({})))
            .await;
        bus.wait_for_idle().await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn clear_subscriptions_removes_all() {
        let bus = EventBus::new();
        bus.subscribe("a", counting_handler(Arc::new(AtomicUsize::new(0))))
            .await;
        bus.subscribe("b", counting_handler(Arc::new(AtomicUsize::new(0))))
            .await;
        assert_eq!(bus.subscriptions().await.len(), 2);
        bus.clear_subscriptions().await;
        assert_eq!(bus.subscriptions().await.len(), 0);
    }
}
