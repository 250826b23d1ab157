use leptos::prelude::*;

use crate::components::chat::ChatPanel;
use crate::components::concept_graph::ConceptGraphView;
use crate::components::upload::UploadPanel;
use crate::services::TransportGateway;

/// Default Home Page. Every panel shares the one gateway it is given.
#[component]
pub fn Home(gateway: TransportGateway) -> impl IntoView {
	view! {
		<div class="tutor-layout">
			<header class="app-header">
				<h1>"Syllabus Tutor"</h1>
				<p class="subtitle">"Upload a syllabus to map its concepts, then ask the tutor about them."</p>
			</header>
			<aside class="sidebar">
				<UploadPanel gateway=gateway.clone() />
				<ChatPanel gateway=gateway.clone() />
			</aside>
			<main class="graph-area">
				<ConceptGraphView gateway=gateway />
			</main>
		</div>
	}
}
