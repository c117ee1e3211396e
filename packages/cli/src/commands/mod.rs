pub mod diff;
pub mod render;

pub use diff::{diff, DiffArgs};
pub use render::{render, RenderArgs};
