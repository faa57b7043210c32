//! Node placement.
//!
//! Radial and linear placement are pure functions of their inputs, so
//! re-rendering the same result set lands every node in the same spot.
//! Force-directed placement lives in [`force`] and is not deterministic
//! across fresh layouts; it persists positions per node id instead.

pub mod force;

use std::f64::consts::PI;

use crate::config::LayoutConfig;
use crate::graph::{GraphModel, Position};

pub use force::ForceLayout;

/// Node `i` of `n` on a circle of `radius` around `anchor`.
pub fn radial_position(anchor: Position, n: usize, i: usize, radius: f64) -> Position {
	if n == 0 {
		return anchor;
	}
	let theta = (i as f64 / n as f64) * 2.0 * PI;
	Position {
		x: anchor.x + radius * theta.cos(),
		y: anchor.y + radius * theta.sin(),
		z: anchor.z,
	}
}

/// Node `i` on a horizontal row starting at `anchor`.
pub fn linear_position(anchor: Position, i: usize, spacing: f64) -> Position {
	Position {
		x: anchor.x + i as f64 * spacing,
		y: anchor.y,
		z: anchor.z,
	}
}

#[derive(Clone, Debug)]
pub struct LayoutEngine {
	radius: f64,
	spacing: f64,
	row_offset: f64,
}

impl LayoutEngine {
	pub fn new(config: &LayoutConfig) -> Self {
		Self {
			radius: config.radius,
			spacing: config.spacing,
			row_offset: config.row_offset,
		}
	}

	pub fn radius(&self) -> f64 {
		self.radius
	}

	/// Places every node of an enrichment view around its anchor.
	pub fn apply_radial(&self, model: &mut GraphModel) {
		let center = anchor_position(model);
		let n = model.nodes.len();
		for (i, node) in model.nodes.iter_mut().enumerate() {
			node.position = radial_position(center, n, i, self.radius);
		}
	}

	/// Places every node of a "related nodes" view in a row below the
	/// anchor, so the first node never covers it.
	pub fn apply_linear(&self, model: &mut GraphModel) {
		let anchor = anchor_position(model);
		let start = Position {
			y: anchor.y + self.row_offset,
			..anchor
		};
		for (i, node) in model.nodes.iter_mut().enumerate() {
			node.position = linear_position(start, i, self.spacing);
		}
	}
}

fn anchor_position(model: &GraphModel) -> Position {
	model.anchor.as_ref().map(|a| a.position).unwrap_or(Position::ORIGIN)
}
