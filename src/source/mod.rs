//! # Feature Sources
//!
//! The collaborators the sync engine works against: features, the layers
//! owning them, the map holding the layers, split tools, render requests
//! and external channel listeners.
//!
//! ## Ownership
//!
//! Layers own their features. Everything else refers to a feature by
//! `(LayerId, FeatureId)`.

mod event;
mod feature;
mod layer;
mod listener;
mod render;
mod split;

pub use event::{LayerEvent, MapEvent, SplitEvent};
pub use feature::{Feature, FeatureId, FeatureState, Modified};
pub use layer::{Layer, LayerId, LayerSet};
pub use listener::{EventRecorder, FeatureListener, RecordedEvent};
pub use render::{DrawCall, DrawRecorder, RenderIntent, RenderRequester};
pub use split::{SplitControl, SplitId};
