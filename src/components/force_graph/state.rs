use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};

use super::types::GraphData;

const COLORS: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

pub const NODE_RADIUS: f64 = 5.0;
pub const HIT_RADIUS: f64 = 12.0;
pub const EMPHASIS_SCALE: f64 = 1.6;
pub const LINK_COLOR: &str = "100, 180, 255";
const SPAWN_RADIUS: f64 = 100.0;

#[derive(Clone, Debug, Default)]
pub struct NodeInfo {
	pub label: Option<String>,
	pub color: String,
	pub radius: f64,
}

#[derive(Clone, Debug)]
pub struct EdgeInfo {
	pub source: DefaultNodeIdx,
	pub target: DefaultNodeIdx,
	pub label: Option<String>,
	/// `r, g, b` triple, alpha is applied while drawing.
	pub rgb: String,
}

impl EdgeInfo {
	pub fn is_loop(&self) -> bool {
		self.source == self.target
	}
}

#[derive(Clone, Debug)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<DefaultNodeIdx>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f32,
	pub node_start_y: f32,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<DefaultNodeIdx>,
	pub neighbors: HashSet<DefaultNodeIdx>,
	pub highlight_t: f64,
	pub prev_node: Option<DefaultNodeIdx>,
	pub prev_neighbors: HashSet<DefaultNodeIdx>,
	delay_t: f64,
}

pub struct ForceGraphState {
	pub graph: ForceGraph<NodeInfo, ()>,
	pub edges: Vec<EdgeInfo>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
	pub animation_running: bool,
	pub flow_time: f64,
	ids: HashMap<String, DefaultNodeIdx>,
}

fn simulation() -> ForceGraph<NodeInfo, ()> {
	ForceGraph::new(SimulationParameters {
		force_charge: 150.0,
		force_spring: 0.05,
		force_max: 100.0,
		node_speed: 3000.0,
		damping_factor: 0.9,
	})
}

impl ForceGraphState {
	pub fn new(data: &GraphData, width: f64, height: f64) -> Self {
		let mut state = Self {
			graph: simulation(),
			edges: Vec::new(),
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			width,
			height,
			animation_running: true,
			flow_time: 0.0,
			ids: HashMap::new(),
		};
		state.load(data);
		state
	}

	/// Replace the simulated graph, keeping the current viewport.
	pub fn load(&mut self, data: &GraphData) {
		self.graph = simulation();
		self.edges.clear();
		self.ids.clear();
		self.drag = DragState::default();
		self.pan = PanState::default();
		self.hover = HoverState::default();

		for (i, node) in data.nodes.iter().enumerate() {
			if self.ids.contains_key(&node.id) {
				continue;
			}
			let color = node.color.clone().unwrap_or_else(|| {
				node.group
					.map(|g| COLORS[g as usize % COLORS.len()].into())
					.unwrap_or(COLORS[0].into())
			});
			// Spawn on a circle around the origin; the transform centers it.
			let angle = (i as f64) * 2.0 * PI / data.nodes.len() as f64;
			let idx = self.graph.add_node(NodeData {
				x: (SPAWN_RADIUS * angle.cos()) as f32,
				y: (SPAWN_RADIUS * angle.sin()) as f32,
				mass: if node.emphasis { 20.0 } else { 10.0 },
				is_anchor: false,
				user_data: NodeInfo {
					label: node.label.clone(),
					color,
					radius: if node.emphasis {
						NODE_RADIUS * EMPHASIS_SCALE
					} else {
						NODE_RADIUS
					},
				},
			});
			self.ids.insert(node.id.clone(), idx);
		}

		for link in &data.links {
			let (Some(&src), Some(&tgt)) = (self.ids.get(&link.source), self.ids.get(&link.target))
			else {
				continue;
			};
			// A spring between a node and itself has no direction.
			if src != tgt {
				self.graph.add_edge(src, tgt, EdgeData::default());
			}
			self.edges.push(EdgeInfo {
				source: src,
				target: tgt,
				label: link.label.clone(),
				rgb: link.color.clone().unwrap_or_else(|| LINK_COLOR.into()),
			});
		}
		self.animation_running = true;
	}

	#[cfg(test)]
	pub fn node_index(&self, id: &str) -> Option<DefaultNodeIdx> {
		self.ids.get(id).copied()
	}

	pub fn positions(&self) -> HashMap<DefaultNodeIdx, (f64, f64)> {
		let mut out = HashMap::with_capacity(self.ids.len());
		self.graph.visit_nodes(|node| {
			out.insert(node.index(), (node.x() as f64, node.y() as f64));
		});
		out
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<DefaultNodeIdx> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found = None;
		self.graph.visit_nodes(|node| {
			let (dx, dy) = (node.x() as f64 - gx, node.y() as f64 - gy);
			// world-space, scales with zoom like the nodes
			let hit = HIT_RADIUS.max(node.data.user_data.radius * 2.0);
			if (dx * dx + dy * dy).sqrt() < hit {
				found = Some(node.index());
			}
		});
		found
	}

	/// Pointer pressed: grab the node under the cursor, or start panning.
	pub fn press(&mut self, x: f64, y: f64) {
		if let Some(idx) = self.node_at_position(x, y) {
			self.drag.active = true;
			self.drag.node_idx = Some(idx);
			self.drag.start_x = x;
			self.drag.start_y = y;
			let (mut nx, mut ny) = (0.0, 0.0);
			self.graph.visit_nodes(|node| {
				if node.index() == idx {
					(nx, ny) = (node.x(), node.y());
				}
			});
			self.drag.node_start_x = nx;
			self.drag.node_start_y = ny;
		} else {
			self.pan.active = true;
			self.pan.start_x = x;
			self.pan.start_y = y;
			self.pan.transform_start_x = self.transform.x;
			self.pan.transform_start_y = self.transform.y;
		}
	}

	pub fn pointer_moved(&mut self, x: f64, y: f64) {
		if !self.drag.active {
			let hovered = self.node_at_position(x, y);
			self.set_hover(hovered);
		}

		if self.drag.active {
			let Some(idx) = self.drag.node_idx else {
				return;
			};
			let (dx, dy) = (
				(x - self.drag.start_x) / self.transform.k,
				(y - self.drag.start_y) / self.transform.k,
			);
			let (nx, ny) = (
				self.drag.node_start_x + dx as f32,
				self.drag.node_start_y + dy as f32,
			);
			self.graph.visit_nodes_mut(|node| {
				if node.index() == idx {
					node.data.x = nx;
					node.data.y = ny;
					node.data.is_anchor = true;
				}
			});
		} else if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (x - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (y - self.pan.start_y);
		}
	}

	/// Pointer released or left the canvas. Dragged nodes stay pinned.
	pub fn release(&mut self, left_canvas: bool) {
		self.drag.active = false;
		self.drag.node_idx = None;
		self.pan.active = false;
		if left_canvas {
			self.set_hover(None);
		}
	}

	/// Zoom around a screen point; positive `delta_y` zooms out.
	pub fn zoom_at(&mut self, x: f64, y: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let new_k = (self.transform.k * factor).clamp(0.1, 10.0);
		let ratio = new_k / self.transform.k;
		self.transform.x = x - (x - self.transform.x) * ratio;
		self.transform.y = y - (y - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	pub fn set_hover(&mut self, node: Option<DefaultNodeIdx>) {
		if self.hover.node == node {
			return;
		}
		let was_hovering = self.hover.node.is_some();

		// keep the old highlight around while it fades out
		if was_hovering && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.node = node;
		self.hover.neighbors.clear();

		if let Some(idx) = node {
			if !was_hovering {
				self.hover.delay_t = 0.0;
			}
			for edge in &self.edges {
				if edge.source == idx {
					self.hover.neighbors.insert(edge.target);
				} else if edge.target == idx {
					self.hover.neighbors.insert(edge.source);
				}
			}
		}
	}

	pub fn is_highlighted(&self, idx: DefaultNodeIdx) -> bool {
		self.hover.node == Some(idx)
			|| self.hover.neighbors.contains(&idx)
			|| self.hover.prev_node == Some(idx)
			|| self.hover.prev_neighbors.contains(&idx)
	}

	pub fn is_hovered(&self, idx: DefaultNodeIdx) -> bool {
		self.hover.node == Some(idx) || self.hover.prev_node == Some(idx)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	pub fn tick(&mut self, dt: f32) {
		self.graph.update(dt);
		self.flow_time += dt as f64;

		let (target, delay, speed) = if self.hover.node.is_some() {
			(1.0, 0.08, 1.8)
		} else {
			(0.0, 0.0, 1.26)
		};

		if self.hover.node.is_some() {
			self.hover.delay_t = (self.hover.delay_t + dt as f64).min(delay);
			if self.hover.delay_t >= delay {
				self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt as f64;
			}
		} else {
			self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt as f64;
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
				self.hover.prev_node = None;
				self.hover.prev_neighbors.clear();
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::super::types::{GraphLink, GraphNode};
	use super::*;

	fn node(id: &str) -> GraphNode {
		GraphNode {
			id: id.into(),
			label: Some(id.into()),
			color: None,
			group: None,
			emphasis: id == "root",
		}
	}

	fn link(source: &str, target: &str) -> GraphLink {
		GraphLink {
			source: source.into(),
			target: target.into(),
			label: None,
			color: None,
		}
	}

	fn sample() -> GraphData {
		GraphData {
			nodes: vec![node("root"), node("A"), node("B"), node("C")],
			links: vec![
				link("root", "A"),
				link("B", "A"),
				link("root", "C"),
				link("C", "C"),
				link("missing", "A"),
			],
		}
	}

	#[test]
	fn keeps_links_with_known_endpoints() {
		let state = ForceGraphState::new(&sample(), 800.0, 600.0);
		assert_eq!(state.edges.len(), 4);
		assert_eq!(state.edges.iter().filter(|e| e.is_loop()).count(), 1);
		assert!(state.node_index("missing").is_none());
	}

	#[test]
	fn hit_test_finds_spawned_node() {
		let state = ForceGraphState::new(&sample(), 800.0, 600.0);
		// node 0 spawns at (SPAWN_RADIUS, 0) in graph space
		let root = state.node_index("root").unwrap();
		assert_eq!(state.node_at_position(400.0 + SPAWN_RADIUS, 300.0), Some(root));
		assert_eq!(state.node_at_position(400.0, 300.0), None);
	}

	#[test]
	fn hover_collects_neighbors_in_both_directions() {
		let mut state = ForceGraphState::new(&sample(), 800.0, 600.0);
		let a = state.node_index("A").unwrap();
		state.set_hover(Some(a));
		let expected: HashSet<_> = ["root", "B"].iter().map(|id| state.node_index(id).unwrap()).collect();
		assert_eq!(state.hover.neighbors, expected);
		assert!(state.is_highlighted(a));
		assert!(!state.is_highlighted(state.node_index("C").unwrap()));

		state.set_hover(None);
		assert!(state.is_hovered(a));
		assert!(state.has_active_highlight());
	}

	#[test]
	fn reload_replaces_graph_and_keeps_viewport() {
		let mut state = ForceGraphState::new(&sample(), 800.0, 600.0);
		state.zoom_at(400.0, 300.0, -1.0);
		let k = state.transform.k;

		state.load(&GraphData {
			nodes: vec![node("X")],
			links: vec![],
		});
		assert!(state.node_index("A").is_none());
		assert!(state.node_index("X").is_some());
		assert!(state.edges.is_empty());
		assert_eq!(state.transform.k, k);
	}

	#[test]
	fn panning_moves_transform() {
		let mut state = ForceGraphState::new(&sample(), 800.0, 600.0);
		state.press(10.0, 10.0);
		assert!(state.pan.active);
		state.pointer_moved(30.0, 50.0);
		assert_eq!((state.transform.x, state.transform.y), (420.0, 340.0));
		state.release(false);
		assert!(!state.pan.active);
	}

	#[test]
	fn zoom_is_clamped() {
		let mut state = ForceGraphState::new(&GraphData::default(), 100.0, 100.0);
		for _ in 0..100 {
			state.zoom_at(0.0, 0.0, 1.0);
		}
		assert!((state.transform.k - 0.1).abs() < 1e-9);
	}
}
