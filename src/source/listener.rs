//! # Layer Listeners
//!
//! External subscribers on a layer's feature channel, e.g. a persistence
//! strategy waiting for `featuremodified`.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::event::LayerEvent;
use super::feature::FeatureId;
use super::layer::LayerId;

/// Subscriber on a layer's feature channel
pub trait FeatureListener {
    fn on_event(&mut self, layer: LayerId, event: &LayerEvent);
}

/// A delivered event with its delivery time
#[derive(Debug, Clone, Serialize)]
pub struct RecordedEvent {
    pub layer: LayerId,
    pub event: LayerEvent,
    pub at: DateTime<Utc>,
}

/// Listener that records every delivered event; clones share the same log
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    events: Arc<RwLock<Vec<RecordedEvent>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared log. A writer that panicked mid-push cannot leave the
    /// log half-written, so a poisoned lock still yields every event.
    fn log(&self) -> RwLockReadGuard<'_, Vec<RecordedEvent>> {
        self.events.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn log_mut(&self) -> RwLockWriteGuard<'_, Vec<RecordedEvent>> {
        self.events.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// All delivered events, oldest first
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.log().clone()
    }

    /// Number of delivered events with the given channel name
    pub fn count(&self, name: &str) -> usize {
        self.log().iter().filter(|r| r.event.name() == name).count()
    }

    /// Number of delivered events with the given channel name for one feature
    pub fn count_for(&self, name: &str, feature: FeatureId) -> usize {
        self.log()
            .iter()
            .filter(|r| r.event.name() == name && r.event.features().contains(&feature))
            .count()
    }

    pub fn clear(&self) {
        self.log_mut().clear();
    }
}

impl FeatureListener for EventRecorder {
    fn on_event(&mut self, layer: LayerId, event: &LayerEvent) {
        self.log_mut().push(RecordedEvent {
            layer,
            event: event.clone(),
            at: Utc::now(),
        });
    }
}
