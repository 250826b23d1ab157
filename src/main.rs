use leptos::prelude::*;
use syllabus_graph_web::{App, init_logging};

fn main() {
	init_logging();
	mount_to_body(App);
}
