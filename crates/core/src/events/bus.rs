use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::events::{EnrichedEvent, SessionEvent, SharedEvent};

pub struct BusConfig {
    pub session_id: Uuid,
    /// Events a slow subscriber may fall behind before it starts losing the oldest.
    pub capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            capacity: 256,
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    inner: Arc<EventBusInner>,
}

struct EventBusInner {
    session_id: Uuid,
    next_ingest_seq: AtomicU64,
    sender: broadcast::Sender<SharedEvent>,
    unobserved_total: AtomicU64,
}

impl EventBus {
    pub fn new(cfg: BusConfig) -> Self {
        let (sender, _) = broadcast::channel(cfg.capacity.max(1));
        Self {
            inner: Arc::new(EventBusInner {
                session_id: cfg.session_id,
                next_ingest_seq: AtomicU64::new(0),
                sender,
                unobserved_total: AtomicU64::new(0),
            }),
        }
    }

    pub fn publish(&self, event: SessionEvent) -> SharedEvent {
        let ingest_seq = self.inner.next_ingest_seq.fetch_add(1, Ordering::Relaxed);

        let enriched_event = Arc::new(EnrichedEvent {
            event,
            event_id: Uuid::new_v4(),
            session_id: self.inner.session_id,
            ingest_seq,
            timestamp: Utc::now(),
        });

        if enriched_event.event.is_noisy() {
            trace!(event_type = enriched_event.event_type(), ingest_seq, "publish");
        } else {
            debug!(event_type = enriched_event.event_type(), ingest_seq, "publish");
        }

        if self.inner.sender.send(Arc::clone(&enriched_event)).is_err() {
            self.inner.unobserved_total.fetch_add(1, Ordering::Relaxed);
        }

        enriched_event
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SharedEvent> {
        self.inner.sender.subscribe()
    }

    pub fn session_id(&self) -> Uuid {
        self.inner.session_id
    }

    /// Events published while nobody was subscribed.
    pub fn unobserved_total(&self) -> u64 {
        self.inner.unobserved_total.load(Ordering::Relaxed)
    }
}
