//! Feature summary
//!
//! Counts a layer's features by edit state, geometry type and the `label`
//! and `cat` attributes, to check at a glance what an edit session left
//! behind.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::source::{Feature, Layer};

/// Per-layer feature counts; every map is keyed by a printable label
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeatureSummary {
    /// `"<STATE> fid:<bool>"`
    pub states: BTreeMap<String, usize>,
    /// `"<Type>[ len=0] \"<STATE>\""`
    pub types: BTreeMap<String, usize>,
    /// `"<label> \"<STATE>\""`
    pub labels: BTreeMap<String, usize>,
    /// `"<cat> \"<STATE>\""`
    pub categories: BTreeMap<String, usize>,
    pub total: usize,
}

impl FeatureSummary {
    /// Summarize every feature of `layer`
    pub fn collect(layer: &Layer) -> Self {
        let mut summary = Self::default();
        for feature in layer.features() {
            summary.add(feature);
        }
        summary
    }

    fn add(&mut self, feature: &Feature) {
        let state = feature.state.as_str();

        bump(&mut self.states, format!("{} fid:{}", state, feature.fid.is_some()));

        let kind = match &feature.geometry {
            Some(geometry) if geometry.length() == 0.0 => format!("{} len=0", geometry.type_name()),
            Some(geometry) => geometry.type_name().to_string(),
            None => "None".to_string(),
        };
        bump(&mut self.types, format!("{} \"{}\"", kind, state));

        bump(
            &mut self.labels,
            format!("{} \"{}\"", attribute(feature, "label"), state),
        );
        bump(
            &mut self.categories,
            format!("{} \"{}\"", attribute(feature, "cat"), state),
        );
        self.total += 1;
    }

    /// Report lines, sections in fixed order and keys sorted
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for (title, counts) in [
            ("States & has fid", &self.states),
            ("Types & States", &self.types),
            ("Attribute label & States", &self.labels),
            ("Attribute cat & States", &self.categories),
        ] {
            lines.push(format!("{}:", title));
            lines.extend(counts.iter().map(|(key, n)| format!("  {}: {}", key, n)));
        }
        lines.push(format!("Total: {}", self.total));
        lines
    }
}

impl fmt::Display for FeatureSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

fn bump(counts: &mut BTreeMap<String, usize>, key: String) {
    *counts.entry(key).or_insert(0) += 1;
}

/// Attribute rendered for a summary key; missing attributes read `null`
fn attribute(feature: &Feature, name: &str) -> String {
    match feature.attributes.get(name) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "null".to_string(),
    }
}
