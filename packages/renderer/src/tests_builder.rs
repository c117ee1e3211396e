/// Tests for the visual-node builder: templates, marks and content decorations
use crate::attrs;
use crate::builder::VNodeBuilder;
use crate::error::RenderError;
use crate::registry::{data, element, slot, text, when, Registries};
use crate::vdom::VNode;
use quire_model::{Decorator, DecoratorPosition, DecoratorTarget, LayerTarget, Mark, ModelNode};
use serde_json::json;

fn build(registries: &Registries, model: &ModelNode, decorators: &[Decorator]) -> VNode {
    VNodeBuilder::new(registries).build(model, decorators).unwrap()
}

fn hello_world() -> ModelNode {
    ModelNode::text_node("p1", "paragraph", "Hello World")
}

#[test]
fn test_paragraph_carries_identity() {
    let registries = Registries::basic();
    let tree = build(&registries, &ModelNode::text_node("p1", "paragraph", "Hello"), &[]);

    assert_eq!(tree.tag(), Some("p"));
    assert_eq!(tree.attr(attrs::SID), Some("p1"));
    assert_eq!(tree.attr(attrs::STYPE), Some("paragraph"));
    assert_eq!(tree.key(), Some("p1"));
    assert_eq!(tree.children(), &[VNode::text("Hello")]);
}

#[test]
fn test_document_slot_renders_children_in_order() {
    let registries = Registries::basic();
    let model = ModelNode::new("doc", "document").with_children(vec![
        ModelNode::text_node("a", "paragraph", "one"),
        ModelNode::text_node("b", "heading", "two").with_attr("level", 3),
    ]);
    let tree = build(&registries, &model, &[]);

    assert_eq!(tree.tag(), Some("div"));
    assert_eq!(tree.attr("class"), Some("document"));
    let children = tree.children();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].key(), Some("a"));
    assert_eq!(children[1].tag(), Some("h3"));
    assert_eq!(children[1].text_content(), "two");
}

#[test]
fn test_missing_template_is_fatal() {
    let registries = Registries::basic();
    let result = VNodeBuilder::new(&registries).build(&ModelNode::new("x", "mystery"), &[]);

    match result {
        Err(RenderError::TemplateNotFound { stype, node_id }) => {
            assert_eq!(stype, "mystery");
            assert_eq!(node_id, "x");
        }
        other => panic!("Expected TemplateNotFound, got {:?}", other),
    }
}

#[test]
fn test_missing_template_deep_in_tree_fails_whole_render() {
    let registries = Registries::basic();
    let model = ModelNode::new("doc", "document")
        .with_child(ModelNode::text_node("ok", "paragraph", "fine"))
        .with_child(ModelNode::new("bad", "mystery"));

    let result = VNodeBuilder::new(&registries).build(&model, &[]);
    assert!(matches!(result, Err(RenderError::TemplateNotFound { .. })));
}

#[test]
fn test_template_root_must_be_element() {
    let mut registries = Registries::basic();
    registries.templates.define("bare", text("just text"));

    let result = VNodeBuilder::new(&registries).build(&ModelNode::new("b", "bare"), &[]);
    assert!(matches!(result, Err(RenderError::InvalidTemplateRoot { .. })));
}

#[test]
fn test_nested_marks_wrap_first_mark_outermost() {
    let registries = Registries::basic();
    let model = ModelNode::text_node("p1", "paragraph", "Red Bold")
        .with_mark(Mark::new("bold", 0, 8))
        .with_mark(Mark::new("italic", 4, 8));
    let tree = build(&registries, &model, &[]);

    let children = tree.children();
    assert_eq!(children.len(), 2);

    assert_eq!(children[0].tag(), Some("strong"));
    assert_eq!(children[0].attr(attrs::MARK), Some("bold"));
    assert_eq!(children[0].children(), &[VNode::text("Red ")]);

    assert_eq!(children[1].tag(), Some("strong"));
    let inner = &children[1].children()[0];
    assert_eq!(inner.tag(), Some("em"));
    assert_eq!(inner.attr(attrs::MARK), Some("italic"));
    assert_eq!(inner.children(), &[VNode::text("Bold")]);
    assert_eq!(tree.text_content(), "Red Bold");
}

#[test]
fn test_link_mark_binds_attributes() {
    let registries = Registries::basic();
    let model = ModelNode::text_node("p1", "paragraph", "see docs")
        .with_mark(Mark::new("link", 4, 8).with_attr("href", "https://example.com"));
    let tree = build(&registries, &model, &[]);

    let link = &tree.children()[1];
    assert_eq!(link.tag(), Some("a"));
    assert_eq!(link.attr("href"), Some("https://example.com"));
}

#[test]
fn test_unknown_mark_uses_span_class() {
    let registries = Registries::basic();
    let model = ModelNode::text_node("p1", "paragraph", "abc").with_mark(Mark::new("underline", 0, 3));
    let tree = build(&registries, &model, &[]);

    let wrapper = &tree.children()[0];
    assert_eq!(wrapper.tag(), Some("span"));
    assert_eq!(wrapper.attr("class"), Some("mark-underline"));
}

#[test]
fn test_before_splice_precedes_target_segment() {
    let registries = Registries::basic();
    let decorator = Decorator::inline("d1", "comment")
        .with_range("p1", 0, 5)
        .with_position(DecoratorPosition::Before);
    let tree = build(&registries, &hello_world(), &[decorator]);

    let children = tree.children();
    assert_eq!(children.len(), 3);
    assert_eq!(children[0].attr(attrs::DECORATOR_SID), Some("d1"));
    assert_eq!(children[0].attr(attrs::DECORATOR_POSITION), Some("before"));
    assert_eq!(children[1], VNode::text("Hello"));
    assert_eq!(children[2], VNode::text(" World"));
}

#[test]
fn test_after_splice_follows_target_segment() {
    let registries = Registries::basic();
    let decorator = Decorator::inline("d2", "comment")
        .with_range("p1", 6, 11)
        .with_position(DecoratorPosition::After);
    let tree = build(&registries, &hello_world(), &[decorator]);

    let children = tree.children();
    assert_eq!(children.len(), 3);
    assert_eq!(children[0], VNode::text("Hello "));
    assert_eq!(children[1], VNode::text("World"));
    assert_eq!(children[2].attr(attrs::DECORATOR_SID), Some("d2"));
    assert_eq!(children[2].attr(attrs::DECORATOR_POSITION), Some("after"));
}

#[test]
fn test_splices_at_same_anchor_keep_encounter_order() {
    let registries = Registries::basic();
    let decorators = vec![
        Decorator::inline("first", "pin")
            .with_range("p1", 6, 6)
            .with_position(DecoratorPosition::Before),
        Decorator::inline("second", "pin")
            .with_range("p1", 6, 6)
            .with_position(DecoratorPosition::Before),
    ];
    let tree = build(&registries, &hello_world(), &decorators);

    let keys: Vec<_> = tree.children().iter().map(|c| c.key()).collect();
    assert_eq!(keys, vec![None, Some("first"), Some("second"), None]);
}

#[test]
fn test_wrap_split_across_mark_boundary() {
    let registries = Registries::basic();
    let model = hello_world().with_mark(Mark::new("bold", 0, 5));
    let decorator = Decorator::inline("h1", "highlight").with_range("p1", 3, 8);
    let tree = build(&registries, &model, &[decorator]);

    let children = tree.children();
    assert_eq!(children.len(), 4);

    assert_eq!(children[0].tag(), Some("strong"));
    assert_eq!(children[0].text_content(), "Hel");

    assert_eq!(children[1].key(), Some("h1"));
    assert_eq!(children[1].attr(attrs::DECORATOR_PLACEHOLDER), Some("true"));
    assert_eq!(children[1].attr(attrs::DECORATOR_POSITION), None);
    assert_eq!(children[1].children()[0].tag(), Some("strong"));
    assert_eq!(children[1].text_content(), "lo");

    assert_eq!(children[2].key(), Some("h1~1"));
    assert_eq!(children[2].children(), &[VNode::text(" Wo")]);

    assert_eq!(children[3], VNode::text("rld"));
}

#[test]
fn test_block_decoration_splices_around_node() {
    let registries = Registries::basic();
    let model = ModelNode::new("doc", "document").with_child(ModelNode::text_node("p1", "paragraph", "x"));
    let decorators = vec![
        Decorator::block("above", "divider")
            .with_target(DecoratorTarget::node("p1"))
            .with_position(DecoratorPosition::Before),
        Decorator::block("below", "divider")
            .with_target(DecoratorTarget::node("p1"))
            .with_position(DecoratorPosition::After),
    ];
    let tree = build(&registries, &model, &decorators);

    let children = tree.children();
    assert_eq!(children.len(), 3);
    assert_eq!(children[0].tag(), Some("div"));
    assert_eq!(children[0].key(), Some("above"));
    assert_eq!(children[0].attr(attrs::DECORATOR_CATEGORY), Some("block"));
    assert_eq!(children[1].key(), Some("p1"));
    assert_eq!(children[2].key(), Some("below"));
}

#[test]
fn test_block_decoration_without_position_wraps_node() {
    let registries = Registries::basic();
    let model = ModelNode::new("doc", "document").with_child(ModelNode::text_node("p1", "paragraph", "x"));
    let decorator = Decorator::block("frame", "frame").with_target(DecoratorTarget::node("p1"));
    let tree = build(&registries, &model, &[decorator]);

    let wrapper = &tree.children()[0];
    assert_eq!(wrapper.key(), Some("frame"));
    assert_eq!(wrapper.children()[0].key(), Some("p1"));
}

#[test]
fn test_root_block_splice_becomes_first_child() {
    let registries = Registries::basic();
    let model = ModelNode::new("doc", "document").with_child(ModelNode::text_node("p1", "paragraph", "x"));
    let decorator = Decorator::block("banner", "banner")
        .with_target(DecoratorTarget::node("doc"))
        .with_position(DecoratorPosition::Before);
    let tree = build(&registries, &model, &[decorator]);

    assert_eq!(tree.key(), Some("doc"));
    assert_eq!(tree.children()[0].key(), Some("banner"));
    assert_eq!(tree.children()[1].key(), Some("p1"));
}

#[test]
fn test_registered_decoration_renderer_reads_data() {
    let mut registries = Registries::basic();
    registries
        .decorators
        .define("badge", element("span").attr("class", "badge").child(data("label")));
    let decorator = Decorator::inline("b", "badge")
        .with_range("p1", 5, 5)
        .with_position(DecoratorPosition::After)
        .with_data(json!({ "label": "new" }));
    let tree = build(&registries, &ModelNode::text_node("p1", "paragraph", "Hello"), &[decorator]);

    let children = tree.children();
    assert_eq!(children[0], VNode::text("Hello"));
    let badge = &children[1];
    assert_eq!(badge.attr("class"), Some("badge"));
    assert_eq!(badge.attr(attrs::DECORATOR), Some("true"));
    assert_eq!(badge.attr(attrs::SKIP_RECONCILE), Some("true"));
    assert_eq!(badge.attr(attrs::DECORATOR_CATEGORY), Some("inline"));
    assert_eq!(badge.attr(attrs::DECORATOR_STYPE), Some("badge"));
    assert_eq!(badge.attr(attrs::DECORATOR_SID), Some("b"));
    assert_eq!(badge.attr(attrs::DECORATOR_PLACEHOLDER), None);
    assert_eq!(badge.text_content(), "new");
}

#[test]
fn test_content_decoration_never_gets_style() {
    let registries = Registries::basic();
    let decorator = Decorator::inline("d", "note")
        .with_range("p1", 0, 5)
        .with_position(DecoratorPosition::Before)
        .with_data(json!({ "position": { "top": 1, "left": 2, "width": 3, "height": 4 } }));
    let tree = build(&registries, &hello_world(), &[decorator]);

    assert_eq!(tree.children()[0].attr(attrs::STYLE), None);
}

#[test]
fn test_layer_decoration_retargeted_to_content_wraps_text() {
    let registries = Registries::basic();
    let decorator = Decorator::layer("hl", "highlight")
        .with_range("p1", 0, 5)
        .with_layer_target(LayerTarget::Content);
    let tree = build(&registries, &hello_world(), &[decorator]);

    let children = tree.children();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].key(), Some("hl"));
    assert_eq!(children[0].attr(attrs::DECORATOR_CATEGORY), Some("layer"));
    assert_eq!(children[0].attr(attrs::STYLE), None);
    assert_eq!(children[0].children(), &[VNode::text("Hello")]);
    assert_eq!(children[1], VNode::text(" World"));
}

#[test]
fn test_layer_decoration_retargeted_to_content_splices() {
    let registries = Registries::basic();
    let decorator = Decorator::layer("pin", "pin")
        .with_range("p1", 6, 11)
        .with_layer_target(LayerTarget::Content)
        .with_position(DecoratorPosition::After);
    let tree = build(&registries, &hello_world(), &[decorator]);

    let keys: Vec<_> = tree.children().iter().map(|c| c.key()).collect();
    assert_eq!(keys, vec![None, None, Some("pin")]);
}

#[test]
fn test_wrap_template_text_precedes_wrapped_segment() {
    let mut registries = Registries::basic();
    registries
        .decorators
        .define("shout", element("mark").child(text("!")));
    let decorator = Decorator::inline("s", "shout").with_range("p1", 0, 5);
    let tree = build(&registries, &hello_world(), &[decorator]);

    let wrapper = &tree.children()[0];
    assert_eq!(wrapper.tag(), Some("mark"));
    assert_eq!(wrapper.children(), &[VNode::text("!"), VNode::text("Hello")]);
}

#[test]
fn test_overlay_decorators_are_not_spliced() {
    let registries = Registries::basic();
    let decorators = vec![
        Decorator::layer("l", "cursor").with_range("p1", 0, 1),
        Decorator::inline("s", "hint")
            .with_range("p1", 0, 1)
            .with_layer_target(LayerTarget::Selection),
    ];
    let tree = build(&registries, &hello_world(), &decorators);

    assert_eq!(tree.children(), &[VNode::text("Hello World")]);
}

#[test]
fn test_decorator_for_unknown_node_is_ignored() {
    let registries = Registries::basic();
    let decorator = Decorator::inline("ghost", "comment")
        .with_range("missing", 0, 3)
        .with_position(DecoratorPosition::Before);
    let tree = build(&registries, &hello_world(), &[decorator]);

    assert_eq!(tree.children(), &[VNode::text("Hello World")]);
}

#[test]
fn test_named_slot_reads_nodes_from_attribute() {
    let mut registries = Registries::basic();
    registries
        .templates
        .define("callout", element("aside").child(slot("body")));
    let model = ModelNode::new("c", "callout").with_attr(
        "body",
        json!([{ "id": "inner", "type": "paragraph", "text": "Hi" }]),
    );
    let tree = build(&registries, &model, &[]);

    assert_eq!(tree.tag(), Some("aside"));
    let inner = &tree.children()[0];
    assert_eq!(inner.attr(attrs::SID), Some("inner"));
    assert_eq!(inner.text_content(), "Hi");
}

#[test]
fn test_when_and_bound_attributes() {
    let mut registries = Registries::basic();
    registries.templates.define(
        "task",
        element("li")
            .bind("data-owner", "owner")
            .attr_fn("data-length", |model| Some(model.text_len().to_string()))
            .child(when(
                |model| model.attributes.get("done") == Some(&json!(true)),
                element("input").attr("type", "checkbox"),
            ))
            .child(data("text")),
    );

    let open = build(&registries, &ModelNode::text_node("t1", "task", "write").with_attr("owner", "ana"), &[]);
    assert_eq!(open.attr("data-owner"), Some("ana"));
    assert_eq!(open.attr("data-length"), Some("5"));
    assert_eq!(open.children(), &[VNode::text("write")]);

    let done = build(&registries, &ModelNode::text_node("t2", "task", "ship").with_attr("done", true), &[]);
    assert_eq!(done.attr("data-owner"), None);
    assert_eq!(done.children()[0].tag(), Some("input"));
    assert_eq!(done.children()[1], VNode::text("ship"));
}
