//! Engine configuration.
//!
//! Every field has a default, so `{}` is a valid configuration.

use crate::error::RenderResult;
use quire_model::{DecoratorCategory, LayerTarget};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Collapse render requests onto the next frame instead of rendering
    /// each one immediately.
    pub coalesce_frames: bool,

    /// Surfaces that cannot place a layer decoration without geometry.
    pub geometry_required: Vec<LayerTarget>,

    /// Declarative pattern producers
    pub patterns: Vec<PatternConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            coalesce_frames: true,
            geometry_required: vec![],
            patterns: vec![],
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> RenderResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> RenderResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn requires_geometry(&self, layer: LayerTarget) -> bool {
        self.geometry_required.contains(&layer)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternConfig {
    pub name: String,

    /// Regular expression matched against each text-bearing node
    pub pattern: String,

    pub decoration_type: String,

    #[serde(default = "default_category")]
    pub category: DecoratorCategory,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_target: Option<LayerTarget>,

    #[serde(default)]
    pub priority: i32,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_category() -> DecoratorCategory {
    DecoratorCategory::Inline
}

fn default_enabled() -> bool {
    true
}
