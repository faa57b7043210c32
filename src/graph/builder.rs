use std::collections::{HashMap, HashSet};

use log::debug;

use super::color::ColorTier;
use super::model::{Anchor, EdgeKey, GraphEdge, GraphMode, GraphModel, GraphNode, Position};
use crate::client::{BackendNode, GraphPayload, SearchResult};
use crate::config::Config;

const LABEL_CHARS: usize = 60;

/// Turns backend responses into a [`GraphModel`].
#[derive(Clone, Debug)]
pub struct GraphModelBuilder {
	enrichment_threshold: f64,
}

impl GraphModelBuilder {
	pub fn new(config: &Config) -> Self {
		Self {
			enrichment_threshold: config.enrichment_threshold,
		}
	}

	pub fn enrichment_threshold(&self) -> f64 {
		self.enrichment_threshold
	}

	/// Anchor-centered view: one node per result, one edge from the anchor to
	/// each result scoring at or above the enrichment threshold.
	pub fn enrichment(&self, anchor: Anchor, results: &[SearchResult]) -> GraphModel {
		self.anchored(anchor, results, self.enrichment_threshold)
	}

	/// Row of related results, every one connected to the anchor. The hits
	/// already passed the backend's score threshold.
	pub fn related(&self, anchor: Anchor, results: &[SearchResult]) -> GraphModel {
		self.anchored(anchor, results, 0.0)
	}

	fn anchored(&self, anchor: Anchor, results: &[SearchResult], min_weight: f64) -> GraphModel {
		let mut model = GraphModel::empty(GraphMode::Enrichment);
		let mut seen: HashSet<&str> = HashSet::new();
		seen.insert(&anchor.id);

		for result in results {
			if !seen.insert(&result.id) {
				model.dropped_duplicates += 1;
				continue;
			}
			let score = clamp_score(result.score);
			model.nodes.push(GraphNode {
				id: result.id.clone(),
				label: label_for(&result.title, &result.text, &result.id),
				score,
				tier: ColorTier::for_score(score),
				url: result.url.clone(),
				category: category_of(result),
				position: Position::ORIGIN,
			});
			if score >= min_weight {
				model.edges.push(GraphEdge {
					source: anchor.id.clone(),
					target: result.id.clone(),
					weight: score,
				});
			} else {
				model.dropped_edges += 1;
			}
		}

		debug!(
			"enrichment view for {}: {} nodes, {} edges, {} duplicates dropped",
			anchor.id,
			model.nodes.len(),
			model.edges.len(),
			model.dropped_duplicates
		);
		model.anchor = Some(anchor);
		model
	}

	/// Full-corpus view. Edges below `threshold` are removed, never hidden.
	pub fn exploration(&self, payload: &GraphPayload, threshold: f64) -> GraphModel {
		let mut model = GraphModel::empty(GraphMode::Exploration);
		let mut index: HashMap<&str, usize> = HashMap::new();

		for node in &payload.nodes {
			if index.contains_key(node.id.as_str()) {
				model.dropped_duplicates += 1;
				continue;
			}
			index.insert(&node.id, model.nodes.len());
			model.nodes.push(exploration_node(node));
		}

		let mut seen: HashSet<EdgeKey> = HashSet::new();
		let mut strongest: Vec<f64> = vec![0.0; model.nodes.len()];
		for edge in &payload.edges {
			let weight = clamp_score(edge.weight);
			let (Some(&a), Some(&b)) = (index.get(edge.source.as_str()), index.get(edge.target.as_str())) else {
				model.dropped_edges += 1;
				continue;
			};
			if a == b || weight < threshold {
				model.dropped_edges += 1;
				continue;
			}
			let key = EdgeKey::new(&edge.source, &edge.target);
			if !seen.insert(key.clone()) {
				model.dropped_edges += 1;
				continue;
			}
			strongest[a] = strongest[a].max(weight);
			strongest[b] = strongest[b].max(weight);
			model.edges.push(GraphEdge {
				source: key.0,
				target: key.1,
				weight,
			});
		}

		let scores = payload_scores(payload, &index);
		for (i, node) in model.nodes.iter_mut().enumerate() {
			node.score = scores[i].unwrap_or(strongest[i]);
			node.tier = ColorTier::for_score(node.score);
		}

		debug!(
			"exploration view: {} nodes, {} edges kept, {} edges dropped",
			model.nodes.len(),
			model.edges.len(),
			model.dropped_edges
		);
		model
	}
}

/// Backend-provided scores, aligned with the deduplicated node list.
fn payload_scores(payload: &GraphPayload, index: &HashMap<&str, usize>) -> Vec<Option<f64>> {
	let mut scores = vec![None; index.len()];
	let mut filled: HashSet<usize> = HashSet::new();
	for node in &payload.nodes {
		let i = index[node.id.as_str()];
		if filled.insert(i) {
			scores[i] = node.score.map(clamp_score);
		}
	}
	scores
}

fn exploration_node(node: &BackendNode) -> GraphNode {
	GraphNode {
		id: node.id.clone(),
		label: label_for(&node.title, &node.text, &node.id),
		score: 0.0,
		tier: ColorTier::Weakest,
		url: node.url.clone(),
		category: node.category.clone().or_else(|| node.tags.first().cloned()),
		position: Position::ORIGIN,
	}
}

fn clamp_score(score: f64) -> f64 {
	if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) }
}

fn label_for(title: &str, text: &str, id: &str) -> String {
	let title = title.trim();
	if !title.is_empty() {
		return title.to_string();
	}
	let text = text.trim();
	if !text.is_empty() {
		return text.chars().take(LABEL_CHARS).collect();
	}
	id.to_string()
}

fn category_of(result: &SearchResult) -> Option<String> {
	for key in ["category", "source"] {
		if let Some(value) = result.metadata.get(key).and_then(|v| v.as_str()) {
			return Some(value.to_string());
		}
	}
	None
}
