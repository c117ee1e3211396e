//! Attribute names written onto host nodes.
//!
//! Tooling and tests match on these names exactly.

/// Semantic id of the model node a host element renders.
pub const SID: &str = "data-sid";
/// Semantic type of the model node a host element renders.
pub const STYPE: &str = "data-stype";
/// Mark type on a mark wrapper element.
pub const MARK: &str = "data-mark";

pub const DECORATOR: &str = "data-decorator";
pub const DECORATOR_CATEGORY: &str = "data-decorator-category";
pub const DECORATOR_STYPE: &str = "data-decorator-stype";
pub const DECORATOR_SID: &str = "data-decorator-sid";
pub const DECORATOR_POSITION: &str = "data-decorator-position";
pub const DECORATOR_PLACEHOLDER: &str = "data-decorator-placeholder";
/// Marks host nodes that content reconciliation must leave alone.
pub const SKIP_RECONCILE: &str = "data-skip-reconcile";

pub const STYLE: &str = "style";
