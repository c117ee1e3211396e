//! # Quire Renderer
//!
//! Rendering and decoration engine for a structured-document editor.
//!
//! A read-only [`ModelNode`](quire_model::ModelNode) snapshot goes through
//! per-type templates into a [`VNode`] tree, which the [`Reconciler`]
//! applies to any [`HostTree`] while preserving node identity by key.
//! Decorations (highlights, badges, overlays) are normalized by the
//! [`DecoratorPrebuilder`] and either spliced into content or mounted on one
//! of four overlay surfaces by the [`LayerRouter`]. [`RenderEngine`] runs the
//! whole pass.

pub mod attrs;
pub mod builder;
pub mod config;
pub mod decorators;
pub mod edit_analyzer;
pub mod engine;
pub mod error;
pub mod host;
pub mod memory_host;
pub mod reconciler;
pub mod registry;
pub mod scheduler;
pub mod segment;
pub mod text_runs;
pub mod vdom;

#[cfg(test)]
mod tests_builder;

#[cfg(test)]
mod tests_reconciler;



pub use builder::VNodeBuilder;
pub use config::{EngineConfig, PatternConfig};
pub use decorators::{
    normalize_data, DecoratorPrebuilder, DecoratorProducers, GeneratorContext, GeneratorProducer,
    GeometrySource, HostGeometry, LayerRouter, Matcher, PatternMatch, PatternProducer,
    ProducerError, RouteReport,
};
pub use edit_analyzer::analyze_text_changes;
pub use engine::{RenderEngine, RenderReport, RenderRequest};
pub use error::{RenderError, RenderResult};
pub use host::HostTree;
pub use memory_host::{MemoryHost, NodeId};
pub use reconciler::{ReconcileReport, Reconciler};
pub use registry::{
    ComponentLifecycle, ComponentRegistry, ComponentState, DecoratorRegistry, MarkRegistry,
    MarkWrapper, Registries, Template, TemplateContext, TemplateNode, TemplateRegistry,
};
pub use scheduler::{FrameClock, FrameHandle, FrameScheduler, HostDrivenClock, ManualClock};
pub use text_runs::{TextRun, TextRunIndex};
pub use vdom::VNode;
