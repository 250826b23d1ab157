//! Single entry point for backend traffic: syllabus upload, chat socket and
//! the concept broadcast.

use std::rc::Rc;

use log::{debug, error, info};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use super::chat::{ChatChannel, ChatEvent};
use super::slot::{LatestSlot, Subscription};
use super::upload::UploadFile;
use crate::concepts::ConceptRecord;
use crate::config::ClientConfig;
use crate::error::TransportError;

/// Owns the backend addresses, the HTTP client and the latest concept batch.
///
/// Construct once and hand clones to the components that need it; clones share
/// the same broadcast slot.
#[derive(Clone)]
pub struct TransportGateway {
	config: Rc<ClientConfig>,
	http: reqwest::Client,
	graph: LatestSlot<Vec<ConceptRecord>>,
}

impl TransportGateway {
	pub fn new(config: ClientConfig) -> Self {
		Self {
			config: Rc::new(config),
			http: reqwest::Client::new(),
			graph: LatestSlot::new(),
		}
	}

	pub fn upload_url(&self) -> String {
		join(&self.config.api_url, "upload")
	}

	pub fn chat_url(&self) -> String {
		join(&self.config.ws_url, "ws")
	}

	/// Post one file as multipart field `file`. No retry, no timeout.
	pub async fn upload_file(&self, file: UploadFile) -> Result<Value, TransportError> {
		let url = self.upload_url();
		info!("Uploading {} ({} bytes) to {}", file.name, file.bytes.len(), url);

		let form = Form::new().part("file", Part::bytes(file.bytes).file_name(file.name));
		let resp = self.http.post(&url).multipart(form).send().await.map_err(|e| {
			error!("Upload request failed: {}", e);
			TransportError::Http(e)
		})?;

		let status = resp.status();
		if !status.is_success() {
			error!("Upload rejected with status {}", status);
			return Err(TransportError::Status(status.as_u16()));
		}

		let body = resp.text().await?;
		parse_reply(&body)
	}

	pub fn open_chat_channel(
		&self,
		on_event: impl Fn(ChatEvent) + 'static,
	) -> Result<ChatChannel, TransportError> {
		let url = self.chat_url();
		debug!("Opening chat channel at {}", url);
		ChatChannel::open(&url, on_event)
	}

	/// Replace the broadcast concept batch.
	pub fn publish_graph(&self, concepts: Vec<ConceptRecord>) {
		debug!(
			"Publishing {} concepts to {} subscribers",
			concepts.len(),
			self.graph.subscriber_count()
		);
		self.graph.publish(concepts);
	}

	pub fn subscribe_graph(
		&self,
		f: impl Fn(Option<&Vec<ConceptRecord>>) + 'static,
	) -> Subscription {
		self.graph.subscribe(f)
	}

	pub fn current_graph(&self) -> Option<Rc<Vec<ConceptRecord>>> {
		self.graph.latest()
	}
}

fn join(base: &str, path: &str) -> String {
	format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn parse_reply(body: &str) -> Result<Value, TransportError> {
	if body.trim().is_empty() {
		return Err(TransportError::EmptyResponse);
	}
	match serde_json::from_str(body)? {
		Value::Null => Err(TransportError::EmptyResponse),
		value => Ok(value),
	}
}
