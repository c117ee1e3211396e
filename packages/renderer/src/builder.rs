//! # Visual-Node Builder
//!
//! Turns a model snapshot into a [`VNode`] tree by running each node's
//! template and splicing content-surface decorations into the result.
//!
//! ## Text segmentation
//!
//! Text bound with `data("text")` is partitioned at every mark boundary and
//! every inline-decoration boundary. Each segment is wrapped by the marks
//! covering it (first mark outermost), then by wrapping decorations covering
//! it (first decoration outermost). Spliced decorations (`before`/`after`)
//! are emitted as siblings at their anchor offset, in encounter order.
//!
//! A wrapping decoration that spans several segments renders one wrapper per
//! segment; the first keeps the decorator id as key, later pieces are keyed
//! `<id>~<n>`. The wrapped segment is always the wrapper's last child, after
//! whatever the decoration's own template emits.
//!
//! ## Errors
//!
//! A model node whose type has no template is fatal for the render. A
//! decoration whose type has no renderer degrades to a placeholder node.

use crate::attrs;
use crate::decorators::prebuilder::DecoratorPrebuilder;
use crate::error::{RenderError, RenderResult};
use crate::registry::{
    AttrValue, Registries, TagSpec, TemplateContext, TemplateNode,
};
use crate::segment::segment_text;
use crate::vdom::VNode;
use quire_model::{
    char_len, DecorationRecord, Decorator, DecoratorCategory, DecoratorPosition, DecoratorTarget,
    LayerTarget, Mark, ModelNode,
};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;
use tracing::{debug, error, instrument, warn};

/// Content-surface decoration with the target it was authored against.
#[derive(Debug, Clone)]
struct ContentDecoration {
    record: DecorationRecord,
    target: DecoratorTarget,
}

type ContentDecorations = HashMap<String, Vec<ContentDecoration>>;

/// A built model node plus the block decorations spliced around it.
#[derive(Debug)]
struct BuiltNode {
    before: Vec<VNode>,
    node: VNode,
    after: Vec<VNode>,
}

impl BuiltNode {
    fn into_nodes(self) -> Vec<VNode> {
        let mut nodes = self.before;
        nodes.push(self.node);
        nodes.extend(self.after);
        nodes
    }
}

pub struct VNodeBuilder<'a> {
    registries: &'a Registries,
}

impl<'a> VNodeBuilder<'a> {
    pub fn new(registries: &'a Registries) -> Self {
        Self { registries }
    }

    /// Builds the visual tree for `model`.
    ///
    /// Only decorators that resolve to the content surface and carry a
    /// target are used here; everything else belongs to the layer router.
    /// Block decorations spliced around the root become its first/last
    /// children since the root has no siblings.
    #[instrument(skip(self, model, decorators), fields(root = %model.id, decorators = decorators.len()))]
    pub fn build(&self, model: &ModelNode, decorators: &[Decorator]) -> RenderResult<VNode> {
        let prebuilder = DecoratorPrebuilder::new();
        let mut by_node: ContentDecorations = HashMap::new();
        for decorator in decorators {
            if decorator.resolved_layer_target() != LayerTarget::Content {
                continue;
            }
            let Some(target) = &decorator.target else {
                continue;
            };
            by_node
                .entry(target.id.clone())
                .or_default()
                .push(ContentDecoration {
                    record: prebuilder.content_record(decorator),
                    target: target.clone(),
                });
        }
        debug!(targets = by_node.len(), "Collected content decorations");

        let context = TemplateContext::default();
        let built = self.build_node(model, &context, &by_node)?;

        let mut root = built.node;
        if !built.before.is_empty() || !built.after.is_empty() {
            if let VNode::Element { children, .. } = &mut root {
                let original = std::mem::take(children);
                children.extend(built.before);
                children.extend(original);
                children.extend(built.after);
            }
        }
        Ok(root)
    }

    /// Renders one normalized decoration as a keyed, reconciliation-excluded
    /// node. Falls back to a placeholder when no renderer is registered.
    pub fn render_decoration(&self, record: &DecorationRecord) -> VNode {
        let mut synthetic = ModelNode::new(record.id.clone(), record.decoration_type.clone());
        synthetic.attributes = record.data.clone();

        let rendered = self
            .registries
            .decorators
            .get(&record.decoration_type)
            .and_then(|template| {
                let context = TemplateContext::default();
                let description = template.resolve(&synthetic, &context);
                match self.expand(&description, &synthetic, &context, &HashMap::new()) {
                    Ok(mut nodes) if nodes.len() == 1 && nodes[0].is_element() => {
                        Some(nodes.remove(0))
                    }
                    Ok(_) => {
                        warn!(
                            decoration = %record.id,
                            decoration_type = %record.decoration_type,
                            "Decoration template must produce one root element, using placeholder"
                        );
                        None
                    }
                    Err(e) => {
                        warn!(decoration = %record.id, error = %e, "Decoration template failed, using placeholder");
                        None
                    }
                }
            });

        let mut node = rendered.unwrap_or_else(|| {
            debug!(
                decoration = %record.id,
                decoration_type = %record.decoration_type,
                "No renderer registered for decoration type"
            );
            let tag = match record.category {
                DecoratorCategory::Block => "div",
                DecoratorCategory::Inline | DecoratorCategory::Layer => "span",
            };
            VNode::element(tag).with_attr(attrs::DECORATOR_PLACEHOLDER, "true")
        });

        node.set_attr(attrs::DECORATOR, "true");
        node.set_attr(attrs::DECORATOR_CATEGORY, record.category.as_str());
        node.set_attr(attrs::DECORATOR_STYPE, record.decoration_type.as_str());
        node.set_attr(attrs::DECORATOR_SID, record.id.as_str());
        node.set_attr(attrs::SKIP_RECONCILE, "true");
        if let Some(position) = record.position {
            node.set_attr(attrs::DECORATOR_POSITION, position.as_str());
        }
        if let Some(style) = &record.style {
            node.set_attr(attrs::STYLE, style.as_str());
        }
        node.set_key(record.id.as_str());
        node
    }

    fn build_node(
        &self,
        model: &ModelNode,
        context: &TemplateContext<'_>,
        decorations: &ContentDecorations,
    ) -> RenderResult<BuiltNode> {
        let template = self.registries.templates.get(&model.node_type).ok_or_else(|| {
            error!(node = %model.id, stype = %model.node_type, "Template not found");
            RenderError::TemplateNotFound {
                stype: model.node_type.clone(),
                node_id: model.id.clone(),
            }
        })?;

        let description = template.resolve(model, context);
        let mut expanded = self.expand(&description, model, context, decorations)?;
        if expanded.len() != 1 || !expanded[0].is_element() {
            return Err(RenderError::InvalidTemplateRoot {
                stype: model.node_type.clone(),
            });
        }

        let mut root = expanded.remove(0);
        root.set_attr(attrs::SID, model.id.as_str());
        root.set_attr(attrs::STYPE, model.node_type.as_str());
        root.set_key(model.id.as_str());

        let mut built = BuiltNode {
            before: Vec::new(),
            node: root,
            after: Vec::new(),
        };

        let mut wrappers = Vec::new();
        for decoration in decorations.get(&model.id).into_iter().flatten() {
            let node_level = decoration.record.category == DecoratorCategory::Block
                || !model.is_text_bearing();
            if !node_level {
                continue;
            }
            let vnode = self.render_decoration(&decoration.record);
            match decoration.record.position {
                Some(DecoratorPosition::Before) => built.before.push(vnode),
                Some(DecoratorPosition::After) => built.after.push(vnode),
                None => wrappers.push(vnode),
            }
        }
        for wrapper in wrappers.into_iter().rev() {
            built.node = wrapper.with_child(built.node);
        }

        Ok(built)
    }

    fn expand(
        &self,
        description: &TemplateNode,
        model: &ModelNode,
        context: &TemplateContext<'_>,
        decorations: &ContentDecorations,
    ) -> RenderResult<Vec<VNode>> {
        match description {
            TemplateNode::Element {
                tag,
                attributes,
                children,
                component,
            } => {
                let tag = match tag {
                    TagSpec::Static(tag) => tag.clone(),
                    TagSpec::Dynamic(f) => (f.0)(&model.attributes),
                };
                let mut vnode = VNode::element(tag);
                for (name, value) in attributes {
                    if let Some(value) = resolve_attribute(value, model) {
                        vnode.set_attr(name.as_str(), value);
                    }
                }
                for child in children {
                    for node in self.expand(child, model, context, decorations)? {
                        vnode.push_child(node);
                    }
                }
                if let Some(component) = component {
                    vnode = vnode.with_component(component.as_str());
                }
                Ok(vec![vnode])
            }
            TemplateNode::Text(content) => Ok(vec![VNode::text(content.as_str())]),
            TemplateNode::Data(name) => {
                if name == "text" && model.is_text_bearing() {
                    return Ok(self.build_text(model, decorations));
                }
                Ok(model
                    .attributes
                    .get(name)
                    .and_then(value_to_string)
                    .map(VNode::text)
                    .into_iter()
                    .collect())
            }
            TemplateNode::Slot(name) => {
                let children: Cow<'_, [ModelNode]> = if name == "content" || name == "children" {
                    Cow::Borrowed(&model.children)
                } else {
                    match model.attributes.get(name) {
                        Some(value) => {
                            match serde_json::from_value::<Vec<ModelNode>>(value.clone()) {
                                Ok(nodes) => Cow::Owned(nodes),
                                Err(e) => {
                                    warn!(node = %model.id, slot = %name, error = %e, "Slot attribute is not a list of nodes");
                                    Cow::Owned(Vec::new())
                                }
                            }
                        }
                        None => Cow::Owned(Vec::new()),
                    }
                };

                let child_context = TemplateContext {
                    depth: context.depth + 1,
                    parent: Some(model),
                };
                let mut nodes = Vec::new();
                for child in children.iter() {
                    nodes.extend(
                        self.build_node(child, &child_context, decorations)?
                            .into_nodes(),
                    );
                }
                Ok(nodes)
            }
            TemplateNode::When { predicate, node } => {
                if (predicate.0)(model) {
                    self.expand(node, model, context, decorations)
                } else {
                    Ok(Vec::new())
                }
            }
        }
    }

    fn build_text(&self, model: &ModelNode, decorations: &ContentDecorations) -> Vec<VNode> {
        let text = model.text.as_deref().unwrap_or_default();
        let len = char_len(text);

        let marks: Vec<(usize, usize, &Mark)> = model
            .marks
            .iter()
            .filter_map(|mark| mark.clamped(len).map(|(start, end)| (start, end, mark)))
            .collect();

        let mut wraps = Vec::new();
        let mut splices = Vec::new();
        for decoration in decorations.get(&model.id).into_iter().flatten() {
            // Layer-category decorations retargeted to content place like inline ones.
            if decoration.record.category == DecoratorCategory::Block {
                continue;
            }
            let (start, end) = decoration.target.resolve_range(len);
            match decoration.record.position {
                None if start < end => wraps.push((start, end, decoration)),
                // A collapsed wrap has nothing to wrap; it splices at its offset.
                None | Some(DecoratorPosition::Before) => {
                    splices.push((start, (start, end), decoration))
                }
                Some(DecoratorPosition::After) => splices.push((end, (start, end), decoration)),
            }
        }

        let cuts: Vec<(usize, usize)> = marks
            .iter()
            .map(|&(start, end, _)| (start, end))
            .chain(wraps.iter().map(|&(start, end, _)| (start, end)))
            .chain(splices.iter().map(|&(_, range, _)| range))
            .collect();

        let mut out = Vec::new();
        let mut pieces = vec![0usize; wraps.len()];
        let emit_splices = |anchor: usize, out: &mut Vec<VNode>| {
            for (_, _, decoration) in splices.iter().filter(|(at, _, _)| *at == anchor) {
                out.push(self.render_decoration(&decoration.record));
            }
        };

        for segment in segment_text(text, &cuts) {
            emit_splices(segment.start, &mut out);

            let mut node = VNode::text(segment.text.as_str());
            for &(_, _, mark) in marks
                .iter()
                .rev()
                .filter(|(start, end, _)| segment.is_covered_by(*start, *end))
            {
                node = self.mark_wrapper(mark).with_child(node);
            }
            for (index, &(start, end, decoration)) in wraps.iter().enumerate().rev() {
                if !segment.is_covered_by(start, end) {
                    continue;
                }
                let mut wrapper = self.render_decoration(&decoration.record);
                if pieces[index] > 0 {
                    wrapper.set_key(format!("{}~{}", decoration.record.id, pieces[index]));
                }
                pieces[index] += 1;
                node = wrapper.with_child(node);
            }
            out.push(node);
        }
        emit_splices(len, &mut out);

        out
    }

    fn mark_wrapper(&self, mark: &Mark) -> VNode {
        let wrapper = self.registries.marks.wrapper_for(&mark.mark_type);
        let mut node = VNode::element(wrapper.tag).with_attr(attrs::MARK, mark.mark_type.as_str());
        for (name, value) in wrapper.attributes {
            node.set_attr(name, value);
        }
        if wrapper.bind_mark_attributes {
            for (name, value) in &mark.attributes {
                if let Some(value) = value_to_string(value) {
                    node.set_attr(name.as_str(), value);
                }
            }
        }
        node
    }
}

fn resolve_attribute(value: &AttrValue, model: &ModelNode) -> Option<String> {
    match value {
        AttrValue::Static(value) => Some(value.clone()),
        AttrValue::Bind(name) => model.attributes.get(name).and_then(value_to_string),
        AttrValue::Computed(f) => (f.0)(model),
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}
