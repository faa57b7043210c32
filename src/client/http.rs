use async_trait::async_trait;
use log::debug;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use super::{
	BatchIndexResponse, DeleteResponse, GraphOptions, GraphPayload, Health, IndexDocument,
	IndexResponse, SearchBackend, SearchOptions, SearchRequest, SearchResult, Stats,
};
use crate::config::Config;
use crate::error::{Error, Result};

/// HTTP implementation of [`SearchBackend`].
#[derive(Clone, Debug)]
pub struct SearchClient {
	http: Client,
	base_url: String,
}

impl SearchClient {
	pub fn new(config: &Config) -> Self {
		Self::with_base_url(&config.base_url)
	}

	pub fn with_base_url(base_url: &str) -> Self {
		Self {
			http: Client::new(),
			base_url: base_url.trim_end_matches('/').to_string(),
		}
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	pub(crate) fn endpoint(&self, path: &str) -> String {
		format!("{}/{}", self.base_url, path.trim_start_matches('/'))
	}

	async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
		let response = request.send().await?;
		let status = response.status();
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			return Err(Error::status(status.as_u16(), status.canonical_reason(), &body));
		}
		response.json::<T>().await.map_err(|e| Error::Decode(e.to_string()))
	}
}

fn require_text(what: &str, value: &str) -> Result<()> {
	if value.trim().is_empty() {
		return Err(Error::Validation(format!("{what} must not be empty")));
	}
	Ok(())
}

#[async_trait(?Send)]
impl SearchBackend for SearchClient {
	async fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchResult>> {
		require_text("query", query)?;
		debug!("search {:?} limit={} threshold={}", query, options.limit, options.score_threshold);
		let body = SearchRequest::new(query, options);
		self.send(self.http.post(self.endpoint("search")).json(&body)).await
	}

	async fn index(&self, doc: &IndexDocument) -> Result<IndexResponse> {
		require_text("document text", &doc.text)?;
		self.send(self.http.post(self.endpoint("index")).json(doc)).await
	}

	async fn index_batch(&self, docs: &[IndexDocument]) -> Result<BatchIndexResponse> {
		if docs.is_empty() {
			return Err(Error::Validation("batch must contain at least one document".into()));
		}
		for doc in docs {
			require_text("document text", &doc.text)?;
		}
		self.send(self.http.post(self.endpoint("index/batch")).json(docs)).await
	}

	async fn stats(&self) -> Result<Stats> {
		self.send(self.http.get(self.endpoint("stats"))).await
	}

	async fn graph(&self, options: &GraphOptions) -> Result<GraphPayload> {
		let body = options.clamped();
		debug!("graph limit={} threshold={}", body.limit, body.similarity_threshold);
		self.send(self.http.post(self.endpoint("graph")).json(&body)).await
	}

	async fn health(&self) -> Result<Health> {
		self.send(self.http.get(self.endpoint("health"))).await
	}

	async fn delete_document(&self, id: &str) -> Result<DeleteResponse> {
		require_text("document id", id)?;
		self.send(self.http.delete(self.endpoint(&format!("documents/{id}")))).await
	}
}
