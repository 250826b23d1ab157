//! Leptos client-side app: syllabus upload, concept map and tutor chat.

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info};

// Modules
mod components;
mod concepts;
mod config;
mod error;
mod pages;
mod services;

// Top-Level pages
use crate::config::ClientConfig;
use crate::pages::home::Home;
use crate::pages::not_found::NotFound;
use crate::services::TransportGateway;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// An app router which renders the homepage and handles 404's
#[component]
pub fn App() -> impl IntoView {
	// Provides context that manages stylesheets, titles, meta tags, etc.
	provide_meta_context();

	let config = ClientConfig::from_build_env();
	info!("Backend at {} (chat {})", config.api_url, config.ws_url);
	let gateway = StoredValue::new_local(TransportGateway::new(config));

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="light" />

		// sets the document title
		<Title text="Syllabus Tutor" />

		// injects metadata in the <head> of the page
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router>
			<Routes fallback=|| view! { <NotFound /> }>
				<Route path=path!("/") view=move || view! { <Home gateway=gateway.get_value() /> } />
			</Routes>
		</Router>
	}
}
