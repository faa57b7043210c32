//! Graph model built from search results or backend graph payloads.

pub mod builder;
pub mod color;
pub mod model;

pub use builder::GraphModelBuilder;
pub use color::ColorTier;
pub use model::{Anchor, EdgeKey, GraphEdge, GraphMode, GraphModel, GraphNode, Position};
