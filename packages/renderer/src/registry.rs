//! # Registries
//!
//! Per-engine lookup tables supplied by application setup:
//!
//! - [`TemplateRegistry`]: semantic type → [`Template`]
//! - [`MarkRegistry`]: mark type → wrapper element
//! - [`DecoratorRegistry`]: decoration type → [`Template`]
//! - [`ComponentRegistry`]: component name → lifecycle hooks
//!
//! Nothing here is process-global; two engines in one process never share
//! registrations unless they share a [`Registries`] value.

use quire_model::ModelNode;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Shared closure wrapper so template descriptions stay `Clone` + `Debug`.
pub struct Func<F: ?Sized>(pub Arc<F>);

impl<F: ?Sized> Clone for Func<F> {
    fn clone(&self) -> Self {
        Func(Arc::clone(&self.0))
    }
}

impl<F: ?Sized> fmt::Debug for Func<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<fn>")
    }
}

pub type TagFn = dyn Fn(&Map<String, Value>) -> String + Send + Sync;
pub type AttrFn = dyn Fn(&ModelNode) -> Option<String> + Send + Sync;
pub type PredicateFn = dyn Fn(&ModelNode) -> bool + Send + Sync;
pub type TemplateFn = dyn Fn(&ModelNode, &TemplateContext<'_>) -> TemplateNode + Send + Sync;

/// What a dynamic template can see besides its own model node.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateContext<'a> {
    pub depth: usize,
    pub parent: Option<&'a ModelNode>,
}

#[derive(Debug, Clone)]
pub enum TagSpec {
    Static(String),
    /// Evaluated against the model's attributes, e.g. heading level → `h2`.
    Dynamic(Func<TagFn>),
}

#[derive(Debug, Clone)]
pub enum AttrValue {
    Static(String),
    /// Copies a model attribute; skipped when absent or null.
    Bind(String),
    Computed(Func<AttrFn>),
}

/// Declarative description of the visual shape of one model node.
#[derive(Debug, Clone)]
pub enum TemplateNode {
    Element {
        tag: TagSpec,
        attributes: Vec<(String, AttrValue)>,
        children: Vec<TemplateNode>,
        component: Option<String>,
    },
    /// Static text
    Text(String),
    /// Text bound to the model: `"text"` is the node's marked text, any
    /// other name reads that attribute.
    Data(String),
    /// Child model nodes: `"content"`/`"children"` are the node's children,
    /// any other name reads an array of model nodes from that attribute.
    Slot(String),
    When {
        predicate: Func<PredicateFn>,
        node: Box<TemplateNode>,
    },
}

pub fn element(tag: impl Into<String>) -> TemplateNode {
    TemplateNode::Element {
        tag: TagSpec::Static(tag.into()),
        attributes: Vec::new(),
        children: Vec::new(),
        component: None,
    }
}

pub fn dynamic_element(
    tag: impl Fn(&Map<String, Value>) -> String + Send + Sync + 'static,
) -> TemplateNode {
    TemplateNode::Element {
        tag: TagSpec::Dynamic(Func(Arc::new(tag))),
        attributes: Vec::new(),
        children: Vec::new(),
        component: None,
    }
}

pub fn text(content: impl Into<String>) -> TemplateNode {
    TemplateNode::Text(content.into())
}

pub fn data(name: impl Into<String>) -> TemplateNode {
    TemplateNode::Data(name.into())
}

pub fn slot(name: impl Into<String>) -> TemplateNode {
    TemplateNode::Slot(name.into())
}

pub fn when(
    predicate: impl Fn(&ModelNode) -> bool + Send + Sync + 'static,
    node: TemplateNode,
) -> TemplateNode {
    TemplateNode::When {
        predicate: Func(Arc::new(predicate)),
        node: Box::new(node),
    }
}

impl TemplateNode {
    pub fn attr(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_attr_value(name.into(), AttrValue::Static(value.into()))
    }

    pub fn bind(self, name: impl Into<String>, model_attribute: impl Into<String>) -> Self {
        self.with_attr_value(name.into(), AttrValue::Bind(model_attribute.into()))
    }

    pub fn attr_fn(
        self,
        name: impl Into<String>,
        f: impl Fn(&ModelNode) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.with_attr_value(name.into(), AttrValue::Computed(Func(Arc::new(f))))
    }

    pub fn child(mut self, child: TemplateNode) -> Self {
        if let TemplateNode::Element {
            ref mut children, ..
        } = self
        {
            children.push(child);
        }
        self
    }

    pub fn children(mut self, new_children: Vec<TemplateNode>) -> Self {
        if let TemplateNode::Element {
            ref mut children, ..
        } = self
        {
            children.extend(new_children);
        }
        self
    }

    pub fn component(mut self, name: impl Into<String>) -> Self {
        if let TemplateNode::Element {
            ref mut component, ..
        } = self
        {
            *component = Some(name.into());
        }
        self
    }

    fn with_attr_value(mut self, name: String, value: AttrValue) -> Self {
        if let TemplateNode::Element {
            ref mut attributes, ..
        } = self
        {
            attributes.retain(|(existing, _)| existing != &name);
            attributes.push((name, value));
        }
        self
    }
}

#[derive(Debug, Clone)]
pub enum Template {
    Static(TemplateNode),
    Dynamic(Func<TemplateFn>),
}

impl Template {
    pub fn dynamic(
        f: impl Fn(&ModelNode, &TemplateContext<'_>) -> TemplateNode + Send + Sync + 'static,
    ) -> Self {
        Template::Dynamic(Func(Arc::new(f)))
    }

    pub fn resolve(&self, model: &ModelNode, context: &TemplateContext<'_>) -> TemplateNode {
        match self {
            Template::Static(node) => node.clone(),
            Template::Dynamic(f) => (f.0)(model, context),
        }
    }
}

impl From<TemplateNode> for Template {
    fn from(node: TemplateNode) -> Self {
        Template::Static(node)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Template>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the template for a semantic type.
    pub fn define(&mut self, stype: impl Into<String>, template: impl Into<Template>) {
        self.templates.insert(stype.into(), template.into());
    }

    pub fn get(&self, stype: &str) -> Option<&Template> {
        self.templates.get(stype)
    }

    pub fn has(&self, stype: &str) -> bool {
        self.templates.contains_key(stype)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Element wrapped around text covered by a mark.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkWrapper {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    /// Copy the mark's own string attributes (e.g. `href`) onto the wrapper.
    pub bind_mark_attributes: bool,
}

impl MarkWrapper {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            bind_mark_attributes: false,
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn binding_mark_attributes(mut self) -> Self {
        self.bind_mark_attributes = true;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct MarkRegistry {
    wrappers: HashMap<String, MarkWrapper>,
}

impl MarkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, mark_type: impl Into<String>, wrapper: MarkWrapper) {
        self.wrappers.insert(mark_type.into(), wrapper);
    }

    /// Registered wrapper, or `span.mark-<type>` for unknown marks.
    pub fn wrapper_for(&self, mark_type: &str) -> MarkWrapper {
        self.wrappers.get(mark_type).cloned().unwrap_or_else(|| {
            MarkWrapper::new("span").with_attr("class", format!("mark-{}", mark_type))
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct DecoratorRegistry {
    templates: HashMap<String, Template>,
}

impl DecoratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, decoration_type: impl Into<String>, template: impl Into<Template>) {
        self.templates.insert(decoration_type.into(), template.into());
    }

    pub fn get(&self, decoration_type: &str) -> Option<&Template> {
        self.templates.get(decoration_type)
    }
}

/// Component-local state, keyed by the same id as the host node.
pub type ComponentState = Map<String, Value>;

/// Lifecycle hooks of a stateful component.
///
/// `mount` runs once when a key appears, `unmount` once when it disappears.
/// Updates under the same key never call either.
pub trait ComponentLifecycle: Send + Sync {
    fn mount(&self, _key: &str, _state: &mut ComponentState) {}

    fn unmount(&self, _key: &str, _state: &mut ComponentState) {}
}

#[derive(Clone, Default)]
pub struct ComponentRegistry {
    components: HashMap<String, Arc<dyn ComponentLifecycle>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: impl Into<String>, lifecycle: Arc<dyn ComponentLifecycle>) {
        self.components.insert(name.into(), lifecycle);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ComponentLifecycle>> {
        self.components.get(name)
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.components.keys().collect();
        names.sort();
        f.debug_struct("ComponentRegistry")
            .field("components", &names)
            .finish()
    }
}

/// All registrations of one engine instance.
#[derive(Debug, Clone, Default)]
pub struct Registries {
    pub templates: TemplateRegistry,
    pub marks: MarkRegistry,
    pub decorators: DecoratorRegistry,
    pub components: Arc<ComponentRegistry>,
}

impl Registries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Templates for a small rich-text schema: document, paragraph, heading
    /// (dynamic level), blockquote, list/listItem, plus bold/italic/code/link
    /// marks.
    pub fn basic() -> Self {
        let mut registries = Self::new();

        let templates = &mut registries.templates;
        templates.define("document", element("div").attr("class", "document").child(slot("content")));
        templates.define("paragraph", element("p").child(data("text")));
        templates.define(
            "heading",
            dynamic_element(|attributes| {
                let level = attributes
                    .get("level")
                    .and_then(Value::as_u64)
                    .unwrap_or(1)
                    .clamp(1, 6);
                format!("h{}", level)
            })
            .child(data("text")),
        );
        templates.define("blockquote", element("blockquote").child(slot("content")));
        templates.define(
            "list",
            dynamic_element(|attributes| {
                if attributes.get("ordered").and_then(Value::as_bool).unwrap_or(false) {
                    "ol".to_string()
                } else {
                    "ul".to_string()
                }
            })
            .child(slot("content")),
        );
        templates.define("listItem", element("li").child(data("text")).child(slot("content")));

        let marks = &mut registries.marks;
        marks.define("bold", MarkWrapper::new("strong"));
        marks.define("italic", MarkWrapper::new("em"));
        marks.define("code", MarkWrapper::new("code"));
        marks.define("link", MarkWrapper::new("a").binding_mark_attributes());

        registries
    }
}
