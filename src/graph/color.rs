use serde::{Deserialize, Serialize};

/// Four fixed score tiers shared by the board and the scene.
///
/// Declared weakest first so the derived ordering follows score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ColorTier {
	Weakest,
	Moderate,
	Strong,
	Strongest,
}

impl ColorTier {
	pub fn for_score(score: f64) -> Self {
		if score > 0.8 {
			ColorTier::Strongest
		} else if score > 0.6 {
			ColorTier::Strong
		} else if score > 0.4 {
			ColorTier::Moderate
		} else {
			ColorTier::Weakest
		}
	}

	/// Fill used by the force scene.
	pub fn hex(self) -> &'static str {
		match self {
			ColorTier::Strongest => "#2ca02c",
			ColorTier::Strong => "#1f77b4",
			ColorTier::Moderate => "#ff7f0e",
			ColorTier::Weakest => "#7f7f7f",
		}
	}

	/// Named color for canvas shapes.
	pub fn canvas_color(self) -> &'static str {
		match self {
			ColorTier::Strongest => "green",
			ColorTier::Strong => "blue",
			ColorTier::Moderate => "orange",
			ColorTier::Weakest => "grey",
		}
	}
}
