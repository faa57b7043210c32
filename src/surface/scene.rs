use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use super::scale::{edge_width, node_size};
use crate::graph::{GraphModel, GraphNode, Position};

#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
	pub id: String,
	pub label: String,
	pub color: String,
	pub size: f64,
	pub score: f64,
	/// Starting point; the scene keeps its own position for ids it already
	/// shows.
	pub position: Position,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneLink {
	pub source: String,
	pub target: String,
	pub weight: f64,
	pub width: f64,
}

/// A force-graph scene fed whole node and link arrays.
pub trait SceneSurface {
	/// Replace the data; nodes already shown keep their place.
	fn set_graph_data(&mut self, nodes: Vec<SceneNode>, links: Vec<SceneLink>);
	fn set_highlight(&mut self, focus: Option<&str>, neighbors: &BTreeSet<String>);
	fn clear(&mut self);
}

impl<S: SceneSurface> SceneSurface for Rc<RefCell<S>> {
	fn set_graph_data(&mut self, nodes: Vec<SceneNode>, links: Vec<SceneLink>) {
		self.borrow_mut().set_graph_data(nodes, links);
	}

	fn set_highlight(&mut self, focus: Option<&str>, neighbors: &BTreeSet<String>) {
		self.borrow_mut().set_highlight(focus, neighbors);
	}

	fn clear(&mut self) {
		self.borrow_mut().clear();
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SizeMetric {
	#[default]
	Uniform,
	Score,
	Degree,
}

pub struct SceneAdapter {
	surface: Box<dyn SceneSurface>,
	size_metric: SizeMetric,
}

impl SceneAdapter {
	pub fn new(surface: Box<dyn SceneSurface>, size_metric: SizeMetric) -> Self {
		Self {
			surface,
			size_metric,
		}
	}

	pub fn set_size_metric(&mut self, size_metric: SizeMetric) {
		self.size_metric = size_metric;
	}

	pub fn render(&mut self, model: &GraphModel) {
		let max_degree = model
			.nodes
			.iter()
			.map(|n| model.degree(&n.id))
			.max()
			.unwrap_or(0)
			.max(1);
		let nodes = model
			.nodes
			.iter()
			.map(|node| SceneNode {
				id: node.id.clone(),
				label: node.label.clone(),
				color: node_color(node).to_string(),
				size: self.size_of(model, node, max_degree),
				score: node.score,
				position: node.position,
			})
			.collect();
		let links = model
			.edges
			.iter()
			.map(|edge| SceneLink {
				source: edge.source.clone(),
				target: edge.target.clone(),
				weight: edge.weight,
				width: edge_width(edge.weight),
			})
			.collect();
		self.surface.set_graph_data(nodes, links);
	}

	pub fn highlight(&mut self, model: &GraphModel, focus: Option<&str>) {
		let neighbors = focus.map(|id| model.neighbors(id)).unwrap_or_default();
		self.surface.set_highlight(focus, &neighbors);
	}

	pub fn clear(&mut self) {
		self.surface.clear();
	}

	fn size_of(&self, model: &GraphModel, node: &GraphNode, max_degree: usize) -> f64 {
		match self.size_metric {
			SizeMetric::Uniform => node_size(0.5),
			SizeMetric::Score => node_size(node.score),
			SizeMetric::Degree => node_size(model.degree(&node.id) as f64 / max_degree as f64),
		}
	}
}

/// Same tiers as the board.
pub fn node_color(node: &GraphNode) -> &'static str {
	node.tier.hex()
}
