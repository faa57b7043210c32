//! Search backend contract: wire types and the [`SearchBackend`] trait.

mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

pub use http::SearchClient;

/// Backend-side bounds on request parameters.
pub const SEARCH_LIMIT_RANGE: (usize, usize) = (1, 100);
pub const GRAPH_LIMIT_RANGE: (usize, usize) = (10, 300);
pub const GRAPH_THRESHOLD_RANGE: (f64, f64) = (0.3, 0.95);

/// A ranked hit, immutable once received.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
	pub id: String,
	#[serde(default)]
	pub text: String,
	#[serde(default)]
	pub url: String,
	#[serde(default)]
	pub title: String,
	pub score: f64,
	#[serde(default)]
	pub metadata: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchOptions {
	pub limit: usize,
	pub score_threshold: f64,
	pub use_exa: bool,
	pub filter_metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SearchRequest<'a> {
	pub query: &'a str,
	pub limit: usize,
	pub score_threshold: f64,
	pub use_exa: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub filter_metadata: Option<&'a Map<String, Value>>,
}

impl<'a> SearchRequest<'a> {
	pub fn new(query: &'a str, options: &'a SearchOptions) -> Self {
		Self {
			query,
			limit: options.limit.clamp(SEARCH_LIMIT_RANGE.0, SEARCH_LIMIT_RANGE.1),
			score_threshold: options.score_threshold.clamp(0.0, 1.0),
			use_exa: options.use_exa,
			filter_metadata: options.filter_metadata.as_ref(),
		}
	}
}

/// A document submitted for indexing.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct IndexDocument {
	pub text: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub metadata: Option<Map<String, Value>>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct IndexResponse {
	pub id: String,
	pub status: String,
	#[serde(default)]
	pub indexed_at: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct BatchIndexResponse {
	pub indexed_count: usize,
	pub ids: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Stats {
	pub total_documents: u64,
	pub collection_name: String,
	#[serde(default)]
	pub embedding_dimension: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Health {
	pub status: String,
	#[serde(default, rename = "qdrant_connected")]
	pub store_connected: bool,
	#[serde(default)]
	pub embedding_service: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct DeleteResponse {
	pub status: String,
	pub id: String,
}

/// Parameters of a full-corpus graph request.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GraphOptions {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub query: Option<String>,
	pub limit: usize,
	pub similarity_threshold: f64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub filter_metadata: Option<Map<String, Value>>,
}

impl GraphOptions {
	/// Clamp to what the backend accepts.
	pub fn clamped(&self) -> Self {
		Self {
			query: self.query.clone().filter(|q| !q.trim().is_empty()),
			limit: self.limit.clamp(GRAPH_LIMIT_RANGE.0, GRAPH_LIMIT_RANGE.1),
			similarity_threshold: self
				.similarity_threshold
				.clamp(GRAPH_THRESHOLD_RANGE.0, GRAPH_THRESHOLD_RANGE.1),
			filter_metadata: self.filter_metadata.clone(),
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct BackendNode {
	pub id: String,
	#[serde(default)]
	pub title: String,
	#[serde(default)]
	pub text: String,
	#[serde(default)]
	pub url: String,
	#[serde(default)]
	pub tags: Vec<String>,
	#[serde(default)]
	pub category: Option<String>,
	#[serde(default)]
	pub file_path: Option<String>,
	#[serde(default)]
	pub score: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct BackendEdge {
	pub source: String,
	pub target: String,
	#[serde(rename = "similarity", alias = "weight")]
	pub weight: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct GraphPayload {
	#[serde(default)]
	pub nodes: Vec<BackendNode>,
	#[serde(default)]
	pub edges: Vec<BackendEdge>,
	#[serde(default)]
	pub node_count: usize,
	#[serde(default)]
	pub edge_count: usize,
}

/// Operations the search backend exposes.
///
/// No caching: every call is one round trip. Futures are not `Send`; the
/// crate runs on a single-threaded event loop.
#[async_trait(?Send)]
pub trait SearchBackend {
	/// Ranked hits, in backend order.
	async fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchResult>>;
	async fn index(&self, doc: &IndexDocument) -> Result<IndexResponse>;
	async fn index_batch(&self, docs: &[IndexDocument]) -> Result<BatchIndexResponse>;
	async fn stats(&self) -> Result<Stats>;
	async fn graph(&self, options: &GraphOptions) -> Result<GraphPayload>;
	async fn health(&self) -> Result<Health>;
	async fn delete_document(&self, id: &str) -> Result<DeleteResponse>;
}
