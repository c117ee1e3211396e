//! # Render Engine
//!
//! Runs one render pass end to end:
//!
//! 1. producers synthesize decorators from the model text;
//! 2. the builder produces the content tree with content decorations
//!    spliced in;
//! 3. the content reconciler patches the content root;
//! 4. every text-bearing node's host element is indexed;
//! 5. the prebuilder normalizes all decorators, measuring targets in the
//!    freshly reconciled host tree;
//! 6. the layer router mounts overlay records on their surfaces.
//!
//! Passes are synchronous and run to completion. Requests can also be
//! coalesced onto the next frame through [`FrameScheduler`].

use crate::builder::VNodeBuilder;
use crate::config::EngineConfig;
use crate::decorators::{
    DecoratorPrebuilder, DecoratorProducers, HostGeometry, LayerRouter, RouteReport,
};
use crate::error::RenderResult;
use crate::host::{find_by_sid, HostTree};
use crate::reconciler::{ReconcileReport, Reconciler};
use crate::registry::Registries;
use crate::scheduler::{FrameClock, FrameHandle, FrameScheduler, HostDrivenClock};
use crate::text_runs::TextRunIndex;
use quire_common::text_nodes;
use quire_model::{DecorationRecord, Decorator, LayerTarget, ModelNode};
use std::collections::HashMap;
use std::slice;
use tracing::{debug, info, instrument};

/// State parked on a pending frame.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub model: ModelNode,
    pub decorators: Vec<Decorator>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RenderReport {
    pub content: ReconcileReport,
    pub layers: RouteReport,
    /// Decorators synthesized by producers this pass
    pub generated: usize,
    pub records: usize,
}

pub struct RenderEngine<H: HostTree> {
    registries: Registries,
    config: EngineConfig,
    producers: DecoratorProducers,
    content_root: H::Node,
    content: Reconciler<H::Node>,
    router: LayerRouter<H::Node>,
    scheduler: FrameScheduler<RenderRequest>,
    indexes: HashMap<String, TextRunIndex<H::Node>>,
    records: Vec<DecorationRecord>,
}

impl<H: HostTree> RenderEngine<H> {
    /// Engine rendering into `content_root`. Fails when a configured
    /// pattern does not compile.
    ///
    /// The default clock is a [`HostDrivenClock`]: with `coalesceFrames`
    /// on, [`request_render`](Self::request_render) only parks the request,
    /// and nothing renders until the host passes
    /// [`pending_frame`](Self::pending_frame) back to
    /// [`on_frame`](Self::on_frame). Hosts with a real frame source install
    /// it with [`with_clock`](Self::with_clock).
    pub fn new(registries: Registries, config: EngineConfig, content_root: H::Node) -> RenderResult<Self> {
        let producers = DecoratorProducers::from_configs(&config.patterns)?;
        let components = registries.components.clone();
        let router = LayerRouter::new(components.clone())
            .with_geometry_required(config.geometry_required.iter().copied());

        Ok(Self {
            content: Reconciler::with_components(components),
            router,
            producers,
            scheduler: FrameScheduler::new(Box::new(HostDrivenClock::default())),
            indexes: HashMap::new(),
            records: Vec::new(),
            registries,
            config,
            content_root,
        })
    }

    /// Replaces the frame clock; any pending frame is dropped.
    pub fn with_clock(mut self, clock: Box<dyn FrameClock>) -> Self {
        self.scheduler = FrameScheduler::new(clock);
        self
    }

    pub fn attach_layer(&mut self, layer: LayerTarget, root: H::Node) -> bool {
        self.router.attach(layer, root)
    }

    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn producers(&self) -> &DecoratorProducers {
        &self.producers
    }

    pub fn producers_mut(&mut self) -> &mut DecoratorProducers {
        &mut self.producers
    }

    pub fn content_root(&self) -> H::Node {
        self.content_root
    }

    pub fn layer_root(&self, layer: LayerTarget) -> Option<H::Node> {
        match layer {
            LayerTarget::Content => Some(self.content_root),
            overlay => self.router.root(overlay),
        }
    }

    /// Renders `model` with `decorators` right now.
    #[instrument(skip_all, fields(root = %model.id, decorators = decorators.len()))]
    pub fn render(
        &mut self,
        host: &mut H,
        model: &ModelNode,
        decorators: &[Decorator],
    ) -> RenderResult<RenderReport> {
        let generated = self.producers.generate(model);
        let mut all = Vec::with_capacity(decorators.len() + generated.len());
        all.extend_from_slice(decorators);
        all.extend(generated.iter().cloned());

        let builder = VNodeBuilder::new(&self.registries);
        let tree = builder.build(model, &all)?;
        let content = self
            .content
            .reconcile(host, self.content_root, slice::from_ref(&tree));

        self.indexes = index_text_nodes(host, self.content_root, model);

        let geometry = HostGeometry::new(&*host, self.content_root, &self.indexes);
        self.records = DecoratorPrebuilder::new().build_all(&all, model, Some(&geometry));

        let layers = self.router.route(host, &builder, &self.records);

        let report = RenderReport {
            content,
            layers,
            generated: generated.len(),
            records: self.records.len(),
        };
        info!(
            created = report.content.created,
            updated = report.content.updated,
            records = report.records,
            "Render pass complete"
        );
        Ok(report)
    }

    /// Renders now, or parks the request on the next frame when frames are
    /// coalesced. Returns the report only for immediate renders.
    pub fn request_render(
        &mut self,
        host: &mut H,
        model: ModelNode,
        decorators: Vec<Decorator>,
    ) -> RenderResult<Option<RenderReport>> {
        if self.config.coalesce_frames {
            let handle = self.scheduler.schedule(RenderRequest { model, decorators });
            debug!(frame = handle.0, "Render scheduled");
            return Ok(None);
        }
        self.render(host, &model, &decorators).map(Some)
    }

    /// Host callback for a fired frame; renders the latest pending request.
    pub fn on_frame(&mut self, host: &mut H, handle: FrameHandle) -> RenderResult<Option<RenderReport>> {
        match self.scheduler.on_frame(handle) {
            Some(request) => self.render(host, &request.model, &request.decorators).map(Some),
            None => Ok(None),
        }
    }

    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.scheduler.pending_handle()
    }

    pub fn cancel_scheduled(&mut self) -> bool {
        self.scheduler.cancel_scheduled().is_some()
    }

    /// Records produced by the last pass, in decorator order.
    pub fn records(&self) -> &[DecorationRecord] {
        &self.records
    }

    pub fn text_index(&self, node_id: &str) -> Option<&TextRunIndex<H::Node>> {
        self.indexes.get(node_id)
    }

    /// Model node id and logical offset for a host caret.
    pub fn model_offset_at(&self, fragment: H::Node, local: usize) -> Option<(&str, usize)> {
        self.indexes.iter().find_map(|(node_id, index)| {
            index
                .offset_of(fragment, local)
                .map(|offset| (node_id.as_str(), offset))
        })
    }

    /// Host fragment and local offset for a model position.
    pub fn host_position_at(&self, node_id: &str, offset: usize) -> Option<(H::Node, usize)> {
        self.indexes.get(node_id)?.locate(offset)
    }

    /// Empties the content root and every overlay surface.
    pub fn clear(&mut self, host: &mut H) -> ReconcileReport {
        let mut report = self.content.clear(host, self.content_root);
        report.merge(&self.router.clear(host));
        self.indexes.clear();
        self.records.clear();
        report
    }
}

fn index_text_nodes<H: HostTree>(
    host: &H,
    content_root: H::Node,
    model: &ModelNode,
) -> HashMap<String, TextRunIndex<H::Node>> {
    text_nodes(model)
        .into_iter()
        .filter_map(|node| {
            let element = find_by_sid(host, content_root, &node.id)?;
            Some((node.id.clone(), TextRunIndex::build(host, element)))
        })
        .collect()
}
