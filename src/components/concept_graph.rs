//! Syllabus concept map fed by the gateway's broadcast slot.

use leptos::prelude::*;

use super::force_graph::{ForceGraphCanvas, GraphData, GraphLink, GraphNode};
use crate::concepts::{ConceptGraph, EdgeLabel, ROOT_ID, StyleHint, build_concept_graph};
use crate::services::TransportGateway;

const HIGHLIGHT_COLOR: &str = "#ff0000";
const COVERS_RGB: &str = "100, 180, 255";
const PREREQ_RGB: &str = "255, 190, 90";

impl From<&ConceptGraph> for GraphData {
	fn from(graph: &ConceptGraph) -> Self {
		let nodes = graph
			.nodes
			.iter()
			.enumerate()
			.map(|(i, node)| {
				let highlighted = node.style_hint == Some(StyleHint::Highlight);
				GraphNode {
					id: node.id.clone(),
					label: Some(node.label.clone()),
					color: highlighted.then(|| HIGHLIGHT_COLOR.to_string()),
					group: Some((i % 10) as u32),
					emphasis: highlighted,
				}
			})
			.collect();

		let links = graph
			.edges
			.iter()
			.map(|edge| GraphLink {
				source: edge.source.clone(),
				target: edge.target.clone(),
				label: Some(edge.label.to_string()),
				color: Some(
					match edge.label {
						EdgeLabel::Covers => COVERS_RGB,
						EdgeLabel::Prereq => PREREQ_RGB,
					}
					.to_string(),
				),
			})
			.collect();

		GraphData { nodes, links }
	}
}

#[component]
pub fn ConceptGraphView(gateway: TransportGateway) -> impl IntoView {
	let graph = RwSignal::new(ConceptGraph::default());

	let subscription = gateway.subscribe_graph(move |batch| match batch {
		Some(concepts) => {
			let built = build_concept_graph(concepts);
			log::info!(
				"Concept graph under '{}': {} concepts, {} covered, {} prerequisite links",
				built.node(ROOT_ID).map_or("", |root| root.label.as_str()),
				concepts.len(),
				built.edges_labelled(EdgeLabel::Covers).count(),
				built.edges_labelled(EdgeLabel::Prereq).count()
			);
			// the view may already be gone
			let _ = graph.try_set(built);
		}
		None => log::debug!("Concept graph waiting for data..."),
	});
	// Unsubscribes when this view is disposed.
	let _subscription = StoredValue::new_local(subscription);

	let data = Signal::derive(move || graph.with(|g| GraphData::from(g)));

	view! {
		<section class="concept-graph">
			<Show
				when=move || graph.with(|g| !g.is_empty())
				fallback=|| view! { <p class="placeholder">"Upload a syllabus to see its concept map."</p> }
			>
				<ForceGraphCanvas data=data />
			</Show>
		</section>
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::concepts::ConceptRecord;

	#[test]
	fn root_is_drawn_highlighted() {
		let graph = build_concept_graph(&[ConceptRecord::new("A", &["B"])]);
		let data = GraphData::from(&graph);

		let root = &data.nodes[0];
		assert_eq!(root.id, "root");
		assert_eq!(root.color.as_deref(), Some(HIGHLIGHT_COLOR));
		assert!(root.emphasis);
		assert!(data.nodes[1..].iter().all(|n| n.color.is_none() && !n.emphasis));
	}

	#[test]
	fn links_carry_edge_labels() {
		let graph = build_concept_graph(&[ConceptRecord::new("A", &["B"])]);
		let data = GraphData::from(&graph);

		let labels: Vec<_> = data.links.iter().map(|l| l.label.as_deref().unwrap()).collect();
		assert_eq!(labels, vec!["Covers", "Prereq"]);
		assert_eq!(data.links[1].color.as_deref(), Some(PREREQ_RGB));
		assert_eq!((data.links[1].source.as_str(), data.links[1].target.as_str()), ("B", "A"));
	}

	#[test]
	fn empty_graph_converts_to_empty_data() {
		assert_eq!(GraphData::from(&ConceptGraph::default()), GraphData::default());
	}
}
