//! Runtime configuration, injected at construction.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Id of the `<script type="application/json">` block the browser build reads.
pub const CONFIG_ELEMENT_ID: &str = "semantic-canvas-config";

/// Service and presentation settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
	/// Base URL of the search backend, without trailing slash.
	pub base_url: String,
	/// Result count for searches when the user has not changed it.
	pub default_limit: usize,
	/// Backend-side score cutoff for searches.
	pub default_score_threshold: f64,
	/// Minimum score for an anchor-to-result edge in enrichment views.
	pub enrichment_threshold: f64,
	/// Minimum similarity for an edge in exploration views.
	pub exploration_threshold: f64,
	/// Node count requested for exploration views.
	pub exploration_limit: usize,
	/// Ask the backend to top up results from Exa.
	pub use_exa: bool,
	/// Layout parameters.
	pub layout: LayoutConfig,
}

/// Geometry and simulation parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
	/// Radius of the radial enrichment layout.
	pub radius: f64,
	/// Spacing between nodes in the linear layout.
	pub spacing: f64,
	/// How far below its anchor the linear row sits.
	pub row_offset: f64,
	/// Charge (repulsion) strength between every node pair.
	pub repulsion: f64,
	/// Rest length of a full-weight link.
	pub link_distance: f64,
	/// Spring strength of the simulation.
	pub spring: f64,
	/// Simulation steps run before the first render.
	pub settle_steps: usize,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			base_url: "http://localhost:8000".into(),
			default_limit: 10,
			default_score_threshold: 0.5,
			enrichment_threshold: 0.6,
			exploration_threshold: 0.6,
			exploration_limit: 100,
			use_exa: false,
			layout: LayoutConfig::default(),
		}
	}
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			radius: 300.0,
			spacing: 250.0,
			row_offset: 150.0,
			repulsion: 150.0,
			link_distance: 80.0,
			spring: 0.05,
			settle_steps: 300,
		}
	}
}

impl Config {
	/// Parse a JSON document; missing keys fall back to defaults.
	pub fn from_json(raw: &str) -> Result<Self> {
		let config: Config = serde_json::from_str(raw)?;
		config.validate()?;
		Ok(config)
	}

	/// Same configuration pointed at another backend.
	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = base_url.into();
		self
	}

	/// Read the JSON block embedded in the host page, if any.
	pub fn from_document() -> Self {
		let raw = web_sys::window()
			.and_then(|w| w.document())
			.and_then(|d| d.get_element_by_id(CONFIG_ELEMENT_ID))
			.and_then(|el| el.text_content());
		match raw {
			Some(raw) => Self::from_json(&raw).unwrap_or_else(|e| {
				log::warn!("ignoring page configuration: {e}");
				Self::default()
			}),
			None => Self::default(),
		}
	}

	/// Check ranges.
	pub fn validate(&self) -> Result<()> {
		if self.base_url.trim().is_empty() {
			return Err(Error::Config("baseUrl must not be empty".into()));
		}
		for (name, value) in [
			("defaultScoreThreshold", self.default_score_threshold),
			("enrichmentThreshold", self.enrichment_threshold),
			("explorationThreshold", self.exploration_threshold),
		] {
			if !(0.0..=1.0).contains(&value) {
				return Err(Error::Config(format!("{name} must be within [0, 1], got {value}")));
			}
		}
		if self.default_limit == 0 || self.exploration_limit == 0 {
			return Err(Error::Config("limits must be at least 1".into()));
		}
		if self.layout.radius <= 0.0 || self.layout.spacing <= 0.0 {
			return Err(Error::Config("layout radius and spacing must be positive".into()));
		}
		Ok(())
	}
}
