//! Animated force-directed scene used for exploration views.

mod component;
mod render;
mod state;

pub use component::ForceGraphCanvas;
pub use state::{ForceGraphState, NodeInfo};
