//! # Render Requests
//!
//! Fire-and-forget redraw requests towards the rendering engine.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use super::feature::{Feature, FeatureId};
use super::layer::LayerId;

/// Name of a style in the layer's style map
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenderIntent(String);

impl RenderIntent {
    /// Name of the committed, non-edit style
    pub const DEFAULT: &'static str = "default";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The committed, non-edit style
    pub fn default_style() -> Self {
        Self::new(Self::DEFAULT)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        self.0 == Self::DEFAULT
    }
}

impl fmt::Display for RenderIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Receives redraw requests for features
pub trait RenderRequester {
    fn draw_feature(&mut self, layer: LayerId, feature: &Feature, intent: &RenderIntent);
}

/// One recorded redraw request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawCall {
    pub layer: LayerId,
    pub feature: FeatureId,
    pub intent: RenderIntent,
}

/// Renderer that records every request; clones share the same log
#[derive(Debug, Clone, Default)]
pub struct DrawRecorder {
    calls: Arc<RwLock<Vec<DrawCall>>>,
}

impl DrawRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// All requests so far, oldest first
    pub fn calls(&self) -> Vec<DrawCall> {
        self.calls.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Requests made for one feature
    pub fn calls_for(&self, feature: FeatureId) -> Vec<DrawCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.feature == feature)
            .collect()
    }

    pub fn clear(&self) {
        self.calls.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl RenderRequester for DrawRecorder {
    fn draw_feature(&mut self, layer: LayerId, feature: &Feature, intent: &RenderIntent) {
        self.calls
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(DrawCall {
                layer,
                feature: feature.id,
                intent: intent.clone(),
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;

    #[test]
    fn test_default_intent() {
        assert!(RenderIntent::default_style().is_default());
        assert!(!RenderIntent::new("select").is_default());
    }

    #[test]
    fn test_recorder_clones_share_log() {
        let recorder = DrawRecorder::new();
        let mut renderer = recorder.clone();
        let feature = Feature::new(Geometry::line(vec![(0.0, 0.0), (1.0, 0.0)]));

        renderer.draw_feature(LayerId(1), &feature, &RenderIntent::new("select"));

        let calls = recorder.calls_for(feature.id);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].intent.as_str(), "select");

        recorder.clear();
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn test_poisoned_log_still_records() {
        let recorder = DrawRecorder::new();
        let calls = Arc::clone(&recorder.calls);
        let _ = std::thread::spawn(move || {
            let _held = calls.write().unwrap();
            panic!("renderer crashed");
        })
        .join();
        assert!(recorder.calls.is_poisoned());

        let feature = Feature::new(Geometry::line(vec![(0.0, 0.0), (1.0, 0.0)]));
        recorder.clone().draw_feature(LayerId(1), &feature, &RenderIntent::new("select"));
        assert_eq!(recorder.calls_for(feature.id).len(), 1);
    }
}
