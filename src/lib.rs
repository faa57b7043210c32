//! Semantic canvas: turns notes on a board into a similarity graph of related
//! documents fetched from a semantic search backend, and renders a
//! force-directed view of the whole corpus.

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info};

pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod graph;
pub mod indexing;
pub mod layout;
pub mod surface;

// UI
mod components;
mod pages;

pub use client::{SearchBackend, SearchClient};
pub use config::Config;
pub use controller::{InteractionController, Phase, QueryOutcome, ViewState};
pub use error::{Error, Result};
pub use indexing::IndexingGate;

// Top-Level pages
use crate::pages::home::Home;
use crate::pages::not_found::NotFound;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// An app router which renders the board and handles 404's
#[component]
pub fn App() -> impl IntoView {
	// Provides context that manages stylesheets, titles, meta tags, etc.
	provide_meta_context();

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="light" />

		// sets the document title
		<Title text="Semantic Canvas" />

		// injects metadata in the <head> of the page
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router>
			<Routes fallback=|| view! { <NotFound /> }>
				<Route path=path!("/") view=Home />
			</Routes>
		</Router>
	}
}
