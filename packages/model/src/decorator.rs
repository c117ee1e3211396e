use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Presentation-only annotation supplied by the application or a producer.
///
/// Decorators never change document content. Once handed to the prebuilder
/// they are treated as immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decorator {
    pub id: String,
    #[serde(rename = "type")]
    pub decorator_type: String,
    pub category: DecoratorCategory,
    #[serde(rename = "decoratorType", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<DecoratorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<DecoratorTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_target: Option<LayerTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<DecoratorPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Decorator {
    pub fn new(
        id: impl Into<String>,
        decorator_type: impl Into<String>,
        category: DecoratorCategory,
    ) -> Self {
        Self {
            id: id.into(),
            decorator_type: decorator_type.into(),
            category,
            kind: None,
            target: None,
            layer_target: None,
            position: None,
            data: None,
        }
    }

    pub fn inline(id: impl Into<String>, decorator_type: impl Into<String>) -> Self {
        Self::new(id, decorator_type, DecoratorCategory::Inline)
    }

    pub fn block(id: impl Into<String>, decorator_type: impl Into<String>) -> Self {
        Self::new(id, decorator_type, DecoratorCategory::Block)
    }

    pub fn layer(id: impl Into<String>, decorator_type: impl Into<String>) -> Self {
        Self::new(id, decorator_type, DecoratorCategory::Layer)
    }

    pub fn with_target(mut self, target: DecoratorTarget) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_range(mut self, node_id: impl Into<String>, start: usize, end: usize) -> Self {
        self.target = Some(DecoratorTarget::range(node_id, start, end));
        self
    }

    pub fn with_layer_target(mut self, layer_target: LayerTarget) -> Self {
        self.layer_target = Some(layer_target);
        self
    }

    pub fn with_position(mut self, position: DecoratorPosition) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_kind(mut self, kind: DecoratorKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Surface this decorator renders on.
    ///
    /// An explicit `layer_target` always wins. Otherwise inline and block
    /// decorators belong to the content surface when they have a target and
    /// to the decorator surface when they do not; layer decorators default
    /// to the decorator surface.
    pub fn resolved_layer_target(&self) -> LayerTarget {
        if let Some(layer_target) = self.layer_target {
            return layer_target;
        }
        match (self.category, &self.target) {
            (DecoratorCategory::Inline | DecoratorCategory::Block, None) => LayerTarget::Decorator,
            (category, _) => LayerTarget::default_for(category),
        }
    }
}

/// Where a decorator attaches in the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecoratorTarget {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_offset: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_offset: Option<usize>,
}

impl DecoratorTarget {
    pub fn node(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            start_offset: None,
            end_offset: None,
        }
    }

    pub fn range(id: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            id: id.into(),
            start_offset: Some(start),
            end_offset: Some(end),
        }
    }

    /// Covered char range, clamped to `len`. A target without offsets covers
    /// the whole text.
    pub fn resolve_range(&self, len: usize) -> (usize, usize) {
        let start = self.start_offset.unwrap_or(0).min(len);
        let end = self.end_offset.unwrap_or(len).min(len).max(start);
        (start, end)
    }

    pub fn has_range(&self) -> bool {
        self.start_offset.is_some() || self.end_offset.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecoratorCategory {
    Inline,
    Block,
    Layer,
}

impl DecoratorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecoratorCategory::Inline => "inline",
            DecoratorCategory::Block => "block",
            DecoratorCategory::Layer => "layer",
        }
    }
}

/// How a decorator came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecoratorKind {
    Pattern,
    Custom,
}

/// Splice side for inline/block decorators. Absent means "wrap".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecoratorPosition {
    Before,
    After,
}

impl DecoratorPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecoratorPosition::Before => "before",
            DecoratorPosition::After => "after",
        }
    }
}

/// One of the five parallel render surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerTarget {
    Content,
    Decorator,
    Selection,
    Context,
    Custom,
}

impl LayerTarget {
    pub const ALL: [LayerTarget; 5] = [
        LayerTarget::Content,
        LayerTarget::Decorator,
        LayerTarget::Selection,
        LayerTarget::Context,
        LayerTarget::Custom,
    ];

    /// Surfaces rendered by the layer router (everything but content).
    pub const OVERLAYS: [LayerTarget; 4] = [
        LayerTarget::Decorator,
        LayerTarget::Selection,
        LayerTarget::Context,
        LayerTarget::Custom,
    ];

    pub fn default_for(category: DecoratorCategory) -> Self {
        match category {
            DecoratorCategory::Inline | DecoratorCategory::Block => LayerTarget::Content,
            DecoratorCategory::Layer => LayerTarget::Decorator,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LayerTarget::Content => "content",
            LayerTarget::Decorator => "decorator",
            LayerTarget::Selection => "selection",
            LayerTarget::Context => "context",
            LayerTarget::Custom => "custom",
        }
    }
}

impl fmt::Display for LayerTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounding box in host pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Geometry {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    /// Reads an explicit `{top, left, width, height}` object.
    ///
    /// `top` and `left` are required; missing sizes read as zero.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let field = |name: &str| object.get(name).and_then(Value::as_f64);
        Some(Self {
            top: field("top")?,
            left: field("left")?,
            width: field("width").unwrap_or(0.0),
            height: field("height").unwrap_or(0.0),
        })
    }

    /// Translates into the coordinate space whose origin is `origin`.
    pub fn relative_to(&self, origin: &Geometry) -> Self {
        Self {
            top: self.top - origin.top,
            left: self.left - origin.left,
            width: self.width,
            height: self.height,
        }
    }

    /// Smallest box covering both.
    pub fn union(&self, other: &Geometry) -> Self {
        let top = self.top.min(other.top);
        let left = self.left.min(other.left);
        let bottom = (self.top + self.height).max(other.top + other.height);
        let right = (self.left + self.width).max(other.left + other.width);
        Self::new(top, left, right - left, bottom - top)
    }

    /// Absolute-position style rule, e.g.
    /// `position:absolute; top:7px; left:11px; width:33px; height:14px`.
    pub fn to_style(&self) -> String {
        format!(
            "position:absolute; top:{}px; left:{}px; width:{}px; height:{}px",
            px(self.top),
            px(self.left),
            px(self.width),
            px(self.height)
        )
    }
}

fn px(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Normalized decoration produced by the prebuilder.
///
/// `data` is always an owned copy, never shared with the source decorator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecorationRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub decoration_type: String,
    pub category: DecoratorCategory,
    pub layer_target: LayerTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<DecoratorPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default)]
    pub data: Map<String, Value>,
}
