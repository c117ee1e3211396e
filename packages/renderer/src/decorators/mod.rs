//! Decoration pipeline: producers synthesize decorators, the prebuilder
//! normalizes them into records, and the router mounts records onto their
//! overlay surfaces.

pub mod prebuilder;
pub mod producers;
pub mod router;

pub use prebuilder::{normalize_data, DecoratorPrebuilder, GeometrySource, HostGeometry};
pub use producers::{
    DecoratorProducers, GeneratorContext, GeneratorProducer, Matcher, PatternMatch,
    PatternProducer, ProducerError,
};
pub use router::{LayerRouter, RouteReport};
