//! # Decorator Prebuilder
//!
//! Normalizes raw [`Decorator`]s into [`DecorationRecord`]s.
//!
//! ## Geometry precedence
//!
//! 1. An explicit `data.geometry` or `data.position` object, used verbatim.
//! 2. Otherwise the bounding box of the target in the live host tree.
//! 3. Otherwise no geometry and no style.
//!
//! Records on the content surface never carry geometry or style; they are
//! spliced into the document tree by the builder.
//!
//! ## Purity
//!
//! Input decorators are only read. `data` is deep-copied into each record,
//! and output order equals input order.
//!
//! ## Unresolvable targets
//!
//! A decorator whose `target.id` is absent from the model is still
//! normalized (content surface by default, data normalized as usual). It is
//! not spliced anywhere because no host node renders its target.

use crate::host::{find_by_sid, HostTree};
use crate::text_runs::TextRunIndex;
use quire_model::{
    DecorationRecord, Decorator, DecoratorKind, DecoratorTarget, Geometry, LayerTarget, ModelNode,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

/// Resolves the on-screen box of a decorator target.
pub trait GeometrySource {
    fn target_geometry(&self, target: &DecoratorTarget) -> Option<Geometry>;
}

/// Geometry measured in a live host tree, relative to the content root.
///
/// Ranged targets are measured through the node's text-run index, so the
/// box covers only the targeted characters.
pub struct HostGeometry<'a, H: HostTree> {
    host: &'a H,
    content_root: H::Node,
    indexes: &'a HashMap<String, TextRunIndex<H::Node>>,
}

impl<'a, H: HostTree> HostGeometry<'a, H> {
    pub fn new(
        host: &'a H,
        content_root: H::Node,
        indexes: &'a HashMap<String, TextRunIndex<H::Node>>,
    ) -> Self {
        Self {
            host,
            content_root,
            indexes,
        }
    }
}

impl<'a, H: HostTree> GeometrySource for HostGeometry<'a, H> {
    fn target_geometry(&self, target: &DecoratorTarget) -> Option<Geometry> {
        let element = find_by_sid(self.host, self.content_root, &target.id)?;

        let ranged = match (target.has_range(), self.indexes.get(&target.id)) {
            (true, Some(index)) => {
                let (start, end) = target.resolve_range(index.total);
                index
                    .runs_in(start, end)
                    .into_iter()
                    .filter_map(|(fragment, local_start, local_end)| {
                        self.host.text_range_rect(fragment, local_start, local_end)
                    })
                    .reduce(|acc, rect| acc.union(&rect))
            }
            _ => None,
        };

        let absolute = ranged.or_else(|| self.host.bounding_rect(element))?;
        Some(match self.host.bounding_rect(self.content_root) {
            Some(origin) => absolute.relative_to(&origin),
            None => absolute,
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DecoratorPrebuilder;

impl DecoratorPrebuilder {
    pub fn new() -> Self {
        Self
    }

    /// Normalizes every decorator, preserving input order.
    #[instrument(skip_all, fields(decorators = decorators.len(), root = %model.id))]
    pub fn build_all(
        &self,
        decorators: &[Decorator],
        model: &ModelNode,
        geometry: Option<&dyn GeometrySource>,
    ) -> Vec<DecorationRecord> {
        decorators
            .iter()
            .map(|decorator| self.build(decorator, model, geometry))
            .collect()
    }

    pub fn build(
        &self,
        decorator: &Decorator,
        model: &ModelNode,
        geometry: Option<&dyn GeometrySource>,
    ) -> DecorationRecord {
        let layer_target = decorator.resolved_layer_target();
        if let Some(target) = &decorator.target {
            if model.find(&target.id).is_none() {
                debug!(
                    decoration = %decorator.id,
                    target = %target.id,
                    "Decorator target not in model, keeping record"
                );
            }
        }
        if decorator.kind == Some(DecoratorKind::Custom) {
            debug!(decoration = %decorator.id, "Custom decorator carries materialized data only");
        }

        let data = normalize_data(decorator.data.as_ref());
        let resolved = if layer_target == LayerTarget::Content {
            None
        } else {
            explicit_geometry(&data).or_else(|| {
                let target = decorator.target.as_ref()?;
                geometry?.target_geometry(target)
            })
        };

        DecorationRecord {
            id: decorator.id.clone(),
            decoration_type: decorator.decorator_type.clone(),
            category: decorator.category,
            layer_target,
            position: decorator.position,
            geometry: resolved,
            style: resolved.map(|g| g.to_style()),
            data,
        }
    }

    /// Record for a decorator the builder splices into the content tree.
    pub fn content_record(&self, decorator: &Decorator) -> DecorationRecord {
        DecorationRecord {
            id: decorator.id.clone(),
            decoration_type: decorator.decorator_type.clone(),
            category: decorator.category,
            layer_target: LayerTarget::Content,
            position: decorator.position,
            geometry: None,
            style: None,
            data: normalize_data(decorator.data.as_ref()),
        }
    }
}

/// Owned copy of decorator data; absent or null data becomes `{}`.
pub fn normalize_data(data: Option<&Value>) -> Map<String, Value> {
    match data {
        Some(Value::Object(map)) => map.clone(),
        None | Some(Value::Null) => Map::new(),
        Some(other) => {
            warn!(data = %other, "Decorator data is not an object, using empty data");
            Map::new()
        }
    }
}

fn explicit_geometry(data: &Map<String, Value>) -> Option<Geometry> {
    data.get("geometry")
        .and_then(Geometry::from_value)
        .or_else(|| data.get("position").and_then(Geometry::from_value))
}
