use crate::errors::ServiceError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use strum::{Display, EnumString};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, info, warn};

/// Business occurrences that produce an activity-log entry and notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PrecastStockCreated,
    StockReceived,
    DispatchCreated,
    DispatchInTransit,
    DispatchReceived,
    ErectionRequested,
    ErectionDecided,
    ErectionReceived,
    ElementsErected,
    WorkOrderCreated,
    WorkOrderRevised,
    InvoiceDraftCreated,
    InvoiceFinalized,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub actor_id: i32,
    pub project_id: Option<i32>,
    pub payload: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}

impl Event {
    pub fn new(kind: EventKind, actor_id: i32, payload: serde_json::Value) -> Self {
        Self {
            kind,
            actor_id,
            project_id: None,
            payload,
            occurred_at: Utc::now(),
        }
    }

    pub fn in_project(mut self, project_id: i32) -> Self {
        self.project_id = Some(project_id);
        self
    }
}

/// Producer half of the side-effect queue.
///
/// Only call [`EventSender::emit`] after the owning transaction has committed.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Creates a sender together with its bounded receiver.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    /// Enqueues an event without waiting. A full or closed queue drops the
    /// event with a warning; the committed business outcome is unaffected.
    pub fn emit(&self, event: Event) {
        let kind = event.kind;
        match self.sender.try_send(event) {
            Ok(()) => debug!(%kind, "Event enqueued"),
            Err(TrySendError::Full(_)) => {
                counter!("precast_events.dropped", 1, "reason" => "full");
                warn!(%kind, "Event queue full; dropping event");
            }
            Err(TrySendError::Closed(_)) => {
                counter!("precast_events.dropped", 1, "reason" => "closed");
                warn!(%kind, "Event queue closed; dropping event");
            }
        }
    }
}

/// Persists the activity trail for an event.
#[async_trait]
pub trait ActivitySink: Send + Sync {
    async fn record(&self, event: &Event) -> Result<(), ServiceError>;
}

/// Fans an event out to interested users.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, event: &Event) -> Result<(), ServiceError>;
}

/// Default activity sink: structured log lines.
#[derive(Debug, Default, Clone)]
pub struct TracingActivitySink;

#[async_trait]
impl ActivitySink for TracingActivitySink {
    async fn record(&self, event: &Event) -> Result<(), ServiceError> {
        info!(
            target: "activity",
            kind = %event.kind,
            actor_id = event.actor_id,
            project_id = ?event.project_id,
            payload = %event.payload,
            "activity"
        );
        Ok(())
    }
}

/// Default notification sink: structured log lines.
#[derive(Debug, Default, Clone)]
pub struct TracingNotificationSink;

#[async_trait]
impl NotificationSink for TracingNotificationSink {
    async fn notify(&self, event: &Event) -> Result<(), ServiceError> {
        info!(
            target: "notifications",
            kind = %event.kind,
            project_id = ?event.project_id,
            "notification queued"
        );
        Ok(())
    }
}

/// In-memory sink that keeps every event it sees, in arrival order.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<Event>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().into_iter().map(|e| e.kind).collect()
    }

    fn push(&self, event: &Event) -> Result<(), ServiceError> {
        self.events
            .lock()
            .map_err(|_| ServiceError::InternalError("memory sink poisoned".to_string()))?
            .push(event.clone());
        Ok(())
    }
}

#[async_trait]
impl ActivitySink for MemorySink {
    async fn record(&self, event: &Event) -> Result<(), ServiceError> {
        self.push(event)
    }
}

#[async_trait]
impl NotificationSink for MemorySink {
    async fn notify(&self, _event: &Event) -> Result<(), ServiceError> {
        Ok(())
    }
}

/// The consumers driven by [`process_events`].
#[derive(Clone)]
pub struct EventSinks {
    pub activity: Arc<dyn ActivitySink>,
    pub notifications: Arc<dyn NotificationSink>,
}

impl Default for EventSinks {
    fn default() -> Self {
        Self {
            activity: Arc::new(TracingActivitySink),
            notifications: Arc::new(TracingNotificationSink),
        }
    }
}

/// Single background worker draining the side-effect queue.
///
/// Sink failures are logged and swallowed. The loop ends once every
/// [`EventSender`] has been dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, sinks: EventSinks) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        debug!(kind = %event.kind, "Processing event");

        let (recorded, notified) = futures::join!(
            sinks.activity.record(&event),
            sinks.notifications.notify(&event)
        );
        if let Err(e) = recorded {
            counter!("precast_events.sink_failures", 1, "sink" => "activity");
            error!(kind = %event.kind, error = %e, "Failed to record activity");
        }
        if let Err(e) = notified {
            counter!("precast_events.sink_failures", 1, "sink" => "notifications");
            error!(kind = %event.kind, error = %e, "Failed to send notifications");
        }
    }

    info!("Event processing loop stopped");
}
