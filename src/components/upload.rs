//! Syllabus file picker and upload status.

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{error, info, warn};
use serde_json::Value;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Event, File, HtmlInputElement, MouseEvent};

use crate::error::TransportError;
use crate::services::{TransportGateway, UploadFile, UploadSummary};

async fn read_file(file: &File) -> Result<UploadFile, TransportError> {
	let buffer = JsFuture::from(file.array_buffer())
		.await
		.map_err(|e| TransportError::File(format!("{:?}", e)))?;
	Ok(UploadFile {
		name: file.name(),
		bytes: js_sys::Uint8Array::new(&buffer).to_vec(),
	})
}

/// Publish the concepts in an upload reply and return the status line.
fn apply_reply(gateway: &TransportGateway, reply: &Value) -> Result<String, TransportError> {
	let summary = UploadSummary::from_reply(reply)?;
	let line = summary.status_line();
	if let Some(message) = &summary.message {
		info!("Server says: {}", message);
	}
	match summary.concepts {
		Some(concepts) => {
			info!("Broadcasting {} concepts", concepts.len());
			gateway.publish_graph(concepts);
		}
		None => warn!("Server response missing 'graph' array: {}", reply),
	}
	Ok(line)
}

async fn upload(gateway: &TransportGateway, file: &File) -> Result<String, TransportError> {
	let payload = read_file(file).await?;
	let reply = gateway.upload_file(payload).await?;
	apply_reply(gateway, &reply)
}

#[component]
pub fn UploadPanel(gateway: TransportGateway) -> impl IntoView {
	let selected = StoredValue::new_local(None::<File>);
	let file_name = RwSignal::new(None::<String>);
	let loading = RwSignal::new(false);
	let status = RwSignal::new(String::new());

	let on_change = move |ev: Event| {
		let input: HtmlInputElement = event_target(&ev);
		let file = input.files().and_then(|files| files.get(0));
		file_name.set(file.as_ref().map(File::name));
		selected.set_value(file);
		status.set(String::new());
	};

	let on_upload = move |_: MouseEvent| {
		if loading.get_untracked() {
			return;
		}
		let Some(file) = selected.get_value() else {
			return;
		};
		loading.set(true);
		status.set("Uploading syllabus...".into());

		let gateway = gateway.clone();
		spawn_local(async move {
			let outcome = upload(&gateway, &file).await;
			let line = outcome.unwrap_or_else(|e| {
				error!("Upload failed: {}", e);
				format!("Error: {}", e)
			});
			let _ = loading.try_set(false);
			let _ = status.try_set(line);
		});
	};

	view! {
		<section class="upload-panel">
			<h2>"Upload syllabus"</h2>
			<input type="file" on:change=on_change prop:disabled=move || loading.get() />
			<button
				on:click=on_upload
				disabled=move || loading.get() || file_name.with(|name| name.is_none())
			>
				"Analyze"
			</button>
			{move || file_name.get().map(|name| view! { <span class="file-name">{name}</span> })}
			<Show when=move || loading.get()>
				<progress class="upload-progress" />
			</Show>
			<p class="status">{move || status.get()}</p>
		</section>
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use serde_json::json;

	use super::*;
	use crate::concepts::ConceptRecord;
	use crate::config::ClientConfig;

	#[test]
	fn reply_with_graph_is_published() {
		let gateway = TransportGateway::new(ClientConfig::default());
		let line = apply_reply(
			&gateway,
			&json!({ "NodesCreated": 1, "graph": [{ "name": "Vectors", "prerequisites": [] }] }),
		)
		.unwrap();

		assert_eq!(line, "Success! Found 1 concepts.");
		assert_eq!(
			gateway.current_graph().as_deref(),
			Some(&vec![ConceptRecord::new("Vectors", &[])])
		);
	}

	#[test]
	fn reply_without_graph_keeps_previous_batch() {
		let gateway = TransportGateway::new(ClientConfig::default());
		gateway.publish_graph(vec![ConceptRecord::new("Old", &[])]);

		let line = apply_reply(&gateway, &json!({ "nodes": 0 })).unwrap();
		assert_eq!(line, "Success! Found 0 concepts.");
		assert_eq!(gateway.current_graph().map(|c| c[0].clone()), Some(ConceptRecord::new("Old", &[])));
	}

	#[test]
	fn null_reply_surfaces_as_status() {
		let gateway = TransportGateway::new(ClientConfig::default());
		let err = apply_reply(&gateway, &Value::Null).unwrap_err();
		assert_eq!(format!("Error: {}", err), "Error: No data received from server.");
		assert!(gateway.current_graph().is_none());
	}
}
