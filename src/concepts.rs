//! Concept records and the syllabus graph built from them.

use std::collections::HashSet;
use std::fmt;

use log::{debug, warn};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub const ROOT_ID: &str = "root";
pub const ROOT_LABEL: &str = "Course Syllabus";

/// One syllabus topic as returned by the backend.
///
/// Fields are read leniently: a `name` that is not a string counts as absent,
/// and prerequisite entries that are not strings stay as `None` so the
/// remaining entries keep their positions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ConceptRecord {
	#[serde(default, deserialize_with = "lenient_name")]
	pub name: Option<String>,
	#[serde(default, deserialize_with = "lenient_prerequisites")]
	pub prerequisites: Vec<Option<String>>,
}

#[cfg(test)]
impl ConceptRecord {
	pub fn new(name: &str, prerequisites: &[&str]) -> Self {
		Self {
			name: Some(name.to_string()),
			prerequisites: prerequisites.iter().map(|p| Some(p.to_string())).collect(),
		}
	}
}

fn lenient_name<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
	Ok(match Value::deserialize(de)? {
		Value::String(name) => Some(name),
		_ => None,
	})
}

fn lenient_prerequisites<'de, D: Deserializer<'de>>(
	de: D,
) -> Result<Vec<Option<String>>, D::Error> {
	Ok(match Value::deserialize(de)? {
		Value::Array(items) => items
			.into_iter()
			.map(|item| match item {
				Value::String(name) => Some(name),
				_ => None,
			})
			.collect(),
		_ => Vec::new(),
	})
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StyleHint {
	Highlight,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphNode {
	pub id: String,
	pub label: String,
	pub style_hint: Option<StyleHint>,
}

impl GraphNode {
	fn plain(id: &str) -> Self {
		Self {
			id: id.to_string(),
			label: id.to_string(),
			style_hint: None,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeLabel {
	Covers,
	Prereq,
}

impl fmt::Display for EdgeLabel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			EdgeLabel::Covers => "Covers",
			EdgeLabel::Prereq => "Prereq",
		})
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphEdge {
	pub id: String,
	pub source: String,
	pub target: String,
	pub label: EdgeLabel,
}

/// Nodes and edges in first-occurrence order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConceptGraph {
	pub nodes: Vec<GraphNode>,
	pub edges: Vec<GraphEdge>,
}

impl ConceptGraph {
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty() && self.edges.is_empty()
	}

	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.nodes.iter().find(|n| n.id == id)
	}

	pub fn edges_labelled(&self, label: EdgeLabel) -> impl Iterator<Item = &GraphEdge> {
		self.edges.iter().filter(move |e| e.label == label)
	}
}

/// Accumulates nodes while remembering which ids were already emitted.
#[derive(Default)]
struct GraphAccumulator {
	seen: HashSet<String>,
	graph: ConceptGraph,
}

impl GraphAccumulator {
	fn add_node(&mut self, node: GraphNode) {
		if self.seen.insert(node.id.clone()) {
			self.graph.nodes.push(node);
		}
	}

	fn add_edge(&mut self, id: String, source: &str, target: &str, label: EdgeLabel) {
		self.graph.edges.push(GraphEdge {
			id,
			source: source.to_string(),
			target: target.to_string(),
			label,
		});
	}
}

/// Turn a concept batch into a rooted graph.
///
/// An empty batch yields an empty graph. Otherwise a single `root` node covers
/// every named concept and each prerequisite points at the concept needing it.
/// Edge ids embed the record's position, so repeated names still produce
/// distinct edges. Records without a name, and prerequisite entries that were
/// not names, are skipped but keep their position.
pub fn build_concept_graph(concepts: &[ConceptRecord]) -> ConceptGraph {
	if concepts.is_empty() {
		return ConceptGraph::default();
	}

	let mut acc = GraphAccumulator::default();
	acc.add_node(GraphNode {
		id: ROOT_ID.into(),
		label: ROOT_LABEL.into(),
		style_hint: Some(StyleHint::Highlight),
	});

	for (i, concept) in concepts.iter().enumerate() {
		let Some(name) = concept.name.as_deref() else {
			debug!("Skipping unnamed concept at position {}", i);
			continue;
		};

		acc.add_node(GraphNode::plain(name));
		acc.add_edge(format!("link-root-{}", i), ROOT_ID, name, EdgeLabel::Covers);

		for (p, prereq) in concept.prerequisites.iter().enumerate() {
			let Some(prereq) = prereq.as_deref() else {
				debug!("Skipping unnamed prerequisite {} of {}", p, name);
				continue;
			};
			acc.add_node(GraphNode::plain(prereq));
			acc.add_edge(
				format!("link-{}-{}-{}-{}", prereq, name, i, p),
				prereq,
				name,
				EdgeLabel::Prereq,
			);
		}
	}

	debug!(
		"Built concept graph: {} nodes, {} edges",
		acc.graph.nodes.len(),
		acc.graph.edges.len()
	);
	acc.graph
}

/// Read a `graph` payload. Anything but an array yields `None`. An element
/// that is not a concept object becomes an unnamed record, so every element
/// keeps its position.
pub fn parse_concepts(value: &Value) -> Option<Vec<ConceptRecord>> {
	let items = value.as_array()?;
	let concepts = items
		.iter()
		.enumerate()
		.map(|(i, item)| {
			ConceptRecord::deserialize(item).unwrap_or_else(|e| {
				warn!("Malformed concept at position {}: {}", i, e);
				ConceptRecord::default()
			})
		})
		.collect();
	Some(concepts)
}
