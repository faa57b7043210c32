//! Weight-to-pixel scales.

pub const EDGE_WIDTH: (f64, f64) = (1.0, 6.0);
pub const NODE_SIZE: (f64, f64) = (4.0, 12.0);

/// Linear in weight, clamped to `[0, 1]`.
pub fn edge_width(weight: f64) -> f64 {
	lerp(EDGE_WIDTH, weight)
}

pub fn node_size(metric: f64) -> f64 {
	lerp(NODE_SIZE, metric)
}

fn lerp((lo, hi): (f64, f64), t: f64) -> f64 {
	let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
	lo + (hi - lo) * t
}
