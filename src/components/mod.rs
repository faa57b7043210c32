pub mod board;
pub mod force_graph;
