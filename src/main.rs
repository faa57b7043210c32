use leptos::prelude::*;
use semantic_canvas::{App, init_logging};

fn main() {
	init_logging();
	mount_to_body(App)
}
