//! # Layer Router
//!
//! Mounts decoration records onto the overlay surfaces (decorator,
//! selection, context, custom). Content records were already spliced into
//! the document tree by the builder and are ignored here.
//!
//! Each surface owns its own [`Reconciler`], so surfaces are diffed
//! independently and in a fixed order. A record without geometry still
//! mounts (unpositioned) unless it is a `layer` record and the surface
//! requires geometry.

use crate::builder::VNodeBuilder;
use crate::host::HostTree;
use crate::reconciler::{ReconcileReport, Reconciler};
use crate::registry::ComponentRegistry;
use quire_model::{DecorationRecord, DecoratorCategory, LayerTarget};
use std::collections::{BTreeMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

struct Surface<N> {
    root: N,
    reconciler: Reconciler<N>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RouteReport {
    /// Records mounted per surface
    pub routed: BTreeMap<LayerTarget, usize>,
    /// Ids of records that could not be placed
    pub dropped: Vec<String>,
    pub reconcile: ReconcileReport,
}

impl RouteReport {
    pub fn routed_to(&self, layer: LayerTarget) -> usize {
        self.routed.get(&layer).copied().unwrap_or(0)
    }
}

pub struct LayerRouter<N> {
    surfaces: BTreeMap<LayerTarget, Surface<N>>,
    geometry_required: HashSet<LayerTarget>,
    components: Arc<ComponentRegistry>,
}

impl<N: Copy + Eq + Hash + Debug> LayerRouter<N> {
    pub fn new(components: Arc<ComponentRegistry>) -> Self {
        Self {
            surfaces: BTreeMap::new(),
            geometry_required: HashSet::new(),
            components,
        }
    }

    pub fn with_geometry_required(mut self, layers: impl IntoIterator<Item = LayerTarget>) -> Self {
        self.geometry_required.extend(layers);
        self
    }

    /// Binds an overlay surface to a host root. Re-attaching a surface
    /// starts it over with a fresh reconciler.
    pub fn attach(&mut self, layer: LayerTarget, root: N) -> bool {
        if layer == LayerTarget::Content {
            warn!("The content surface is reconciled by the engine, not the router");
            return false;
        }
        self.surfaces.insert(
            layer,
            Surface {
                root,
                reconciler: Reconciler::with_components(self.components.clone()),
            },
        );
        true
    }

    pub fn is_attached(&self, layer: LayerTarget) -> bool {
        self.surfaces.contains_key(&layer)
    }

    pub fn root(&self, layer: LayerTarget) -> Option<N> {
        self.surfaces.get(&layer).map(|surface| surface.root)
    }

    pub fn requires_geometry(&self, layer: LayerTarget) -> bool {
        self.geometry_required.contains(&layer)
    }

    /// Reconciles every attached overlay surface against the records
    /// targeting it, in encounter order.
    #[instrument(skip_all, fields(records = records.len()))]
    pub fn route<H: HostTree<Node = N>>(
        &mut self,
        host: &mut H,
        builder: &VNodeBuilder<'_>,
        records: &[DecorationRecord],
    ) -> RouteReport {
        let mut report = RouteReport::default();
        let mut lists: BTreeMap<LayerTarget, Vec<_>> = LayerTarget::OVERLAYS
            .iter()
            .map(|layer| (*layer, Vec::new()))
            .collect();

        for record in records {
            if record.layer_target == LayerTarget::Content {
                continue;
            }
            if !self.surfaces.contains_key(&record.layer_target) {
                debug!(decoration = %record.id, layer = %record.layer_target, "No surface attached, dropping");
                report.dropped.push(record.id.clone());
                continue;
            }
            if record.geometry.is_none()
                && record.category == DecoratorCategory::Layer
                && self.requires_geometry(record.layer_target)
            {
                warn!(decoration = %record.id, layer = %record.layer_target, "Layer decoration has no geometry, dropping");
                report.dropped.push(record.id.clone());
                continue;
            }
            if let Some(list) = lists.get_mut(&record.layer_target) {
                list.push(builder.render_decoration(record));
            }
        }

        for (layer, surface) in self.surfaces.iter_mut() {
            let next = lists.remove(layer).unwrap_or_default();
            report.routed.insert(*layer, next.len());
            let pass = surface.reconciler.reconcile(host, surface.root, &next);
            report.reconcile.merge(&pass);
        }
        report
    }

    /// Empties every surface.
    pub fn clear<H: HostTree<Node = N>>(&mut self, host: &mut H) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        for surface in self.surfaces.values_mut() {
            report.merge(&surface.reconciler.clear(host, surface.root));
        }
        report
    }
}
