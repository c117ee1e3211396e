//! # Quire Model
//!
//! Value types shared by every stage of the rendering engine.
//!
//! The document store owns [`ModelNode`] snapshots; the engine only reads
//! them. [`Decorator`]s are supplied by the host application (or synthesized
//! by producers) and normalized into [`DecorationRecord`]s. All offsets are
//! counted in `char`s of the node's logical text.
//!
//! Every type serializes to camelCase JSON so snapshots can be exchanged with
//! non-Rust collaborators.

pub mod decorator;
pub mod edit;
pub mod error;
pub mod node;

pub use decorator::{
    DecorationRecord, Decorator, DecoratorCategory, DecoratorKind, DecoratorPosition,
    DecoratorTarget, Geometry, LayerTarget,
};
pub use edit::{EditKind, EditOperation, TextChange};
pub use error::{ModelError, ModelResult};
pub use node::{char_len, char_slice, Mark, ModelNode};
