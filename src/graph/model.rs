use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::color::ColorTier;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
	pub x: f64,
	pub y: f64,
	pub z: Option<f64>,
}

impl Position {
	pub const ORIGIN: Position = Position {
		x: 0.0,
		y: 0.0,
		z: None,
	};

	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y, z: None }
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
	pub id: String,
	pub label: String,
	pub score: f64,
	pub tier: ColorTier,
	pub url: String,
	pub category: Option<String>,
	pub position: Position,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
	pub source: String,
	pub target: String,
	pub weight: f64,
}

impl GraphEdge {
	/// Unordered identity of the pair.
	pub fn key(&self) -> EdgeKey {
		EdgeKey::new(&self.source, &self.target)
	}

	pub fn touches(&self, id: &str) -> bool {
		self.source == id || self.target == id
	}

	pub fn other(&self, id: &str) -> Option<&str> {
		if self.source == id {
			Some(&self.target)
		} else if self.target == id {
			Some(&self.source)
		} else {
			None
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeKey(pub String, pub String);

impl EdgeKey {
	pub fn new(a: &str, b: &str) -> Self {
		if a <= b {
			EdgeKey(a.to_string(), b.to_string())
		} else {
			EdgeKey(b.to_string(), a.to_string())
		}
	}
}

/// The item an enrichment view is centered on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
	pub id: String,
	pub label: String,
	pub position: Position,
	/// Set when the anchor already exists on the canvas, so no label
	/// primitive is created for it.
	pub existing_shape: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphMode {
	Enrichment,
	Exploration,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphModel {
	pub mode: GraphMode,
	pub anchor: Option<Anchor>,
	pub nodes: Vec<GraphNode>,
	pub edges: Vec<GraphEdge>,
	pub dropped_duplicates: usize,
	pub dropped_edges: usize,
}

impl GraphModel {
	pub fn empty(mode: GraphMode) -> Self {
		Self {
			mode,
			anchor: None,
			nodes: Vec::new(),
			edges: Vec::new(),
			dropped_duplicates: 0,
			dropped_edges: 0,
		}
	}

	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.nodes.iter().find(|n| n.id == id)
	}

	/// Whether `id` names a node or the anchor of this view.
	pub fn contains(&self, id: &str) -> bool {
		self.anchor.as_ref().is_some_and(|a| a.id == id) || self.node(id).is_some()
	}

	/// Exactly one hop away from `id`.
	pub fn neighbors(&self, id: &str) -> BTreeSet<String> {
		self.edges
			.iter()
			.filter_map(|e| e.other(id))
			.filter(|other| *other != id)
			.map(str::to_string)
			.collect()
	}

	pub fn degree(&self, id: &str) -> usize {
		self.edges.iter().filter(|e| e.touches(id)).count()
	}

	pub fn position_of(&self, id: &str) -> Option<Position> {
		match &self.anchor {
			Some(a) if a.id == id => Some(a.position),
			_ => self.node(id).map(|n| n.position),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}
}
