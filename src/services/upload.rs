//! Interpreting the backend's reply to a syllabus upload.

use serde_json::Value;

use crate::concepts::{ConceptRecord, parse_concepts};
use crate::error::TransportError;

/// File contents handed to [`super::TransportGateway::upload_file`].
#[derive(Clone, Debug)]
pub struct UploadFile {
	pub name: String,
	pub bytes: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UploadSummary {
	pub count: i64,
	/// `None` when the reply had no `graph` array; nothing is published then.
	pub concepts: Option<Vec<ConceptRecord>>,
	pub message: Option<String>,
}

impl UploadSummary {
	pub fn from_reply(reply: &Value) -> Result<Self, TransportError> {
		if reply.is_null() {
			return Err(TransportError::EmptyResponse);
		}

		let count = [reply.get("nodes"), reply.get("NodesCreated")]
			.into_iter()
			.flatten()
			.filter_map(count_value)
			.find(|&n| n != 0)
			.unwrap_or(0);

		Ok(Self {
			count,
			concepts: reply.get("graph").and_then(parse_concepts),
			message: reply.get("message").and_then(Value::as_str).map(str::to_string),
		})
	}

	pub fn status_line(&self) -> String {
		format!("Success! Found {} concepts.", self.count)
	}
}

/// Any finite JSON number, truncated toward zero.
fn count_value(value: &Value) -> Option<i64> {
	value
		.as_i64()
		.or_else(|| value.as_f64().filter(|n| n.is_finite()).map(|n| n.trunc() as i64))
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use serde_json::json;

	use super::*;

	#[test]
	fn accepts_both_count_casings() {
		let lower = UploadSummary::from_reply(&json!({ "nodes": 3 })).unwrap();
		let upper = UploadSummary::from_reply(&json!({ "NodesCreated": 3 })).unwrap();
		assert_eq!(lower.count, 3);
		assert_eq!(upper.count, 3);
		assert_eq!(upper.status_line(), "Success! Found 3 concepts.");
	}

	#[test]
	fn missing_count_is_zero() {
		let summary = UploadSummary::from_reply(&json!({ "status": "success" })).unwrap();
		assert_eq!(summary.count, 0);
		assert_eq!(summary.concepts, None);
	}

	#[test]
	fn zero_nodes_falls_through_to_nodes_created() {
		let summary = UploadSummary::from_reply(&json!({ "nodes": 0, "NodesCreated": 4 })).unwrap();
		assert_eq!(summary.count, 4);
	}

	#[test]
	fn fractional_and_negative_counts_are_shown() {
		let summary = UploadSummary::from_reply(&json!({ "nodes": 3.0 })).unwrap();
		assert_eq!(summary.count, 3);
		let summary = UploadSummary::from_reply(&json!({ "NodesCreated": 2.7 })).unwrap();
		assert_eq!(summary.count, 2);
		let summary = UploadSummary::from_reply(&json!({ "nodes": -1 })).unwrap();
		assert_eq!(summary.status_line(), "Success! Found -1 concepts.");
	}

	#[test]
	fn non_numeric_count_is_ignored() {
		let summary = UploadSummary::from_reply(&json!({ "nodes": "many" })).unwrap();
		assert_eq!(summary.count, 0);
	}

	#[test]
	fn graph_array_is_parsed() {
		let reply = json!({
			"message": "Syllabus processed",
			"nodes": 2,
			"graph": [
				{ "name": "Limits", "prerequisites": [] },
				{ "name": "Derivatives", "prerequisites": ["Limits"] }
			],
			"status": "success"
		});
		let summary = UploadSummary::from_reply(&reply).unwrap();
		assert_eq!(
			summary.concepts,
			Some(vec![
				ConceptRecord::new("Limits", &[]),
				ConceptRecord::new("Derivatives", &["Limits"]),
			])
		);
		assert_eq!(summary.message.as_deref(), Some("Syllabus processed"));
	}

	#[test]
	fn non_array_graph_skips_publish() {
		let summary = UploadSummary::from_reply(&json!({ "nodes": 1, "graph": "oops" })).unwrap();
		assert_eq!(summary.concepts, None);
		let summary = UploadSummary::from_reply(&json!({ "graph": null })).unwrap();
		assert_eq!(summary.concepts, None);
	}

	#[test]
	fn null_reply_is_an_error() {
		let err = UploadSummary::from_reply(&Value::Null).unwrap_err();
		assert!(matches!(err, TransportError::EmptyResponse));
		assert_eq!(err.to_string(), "No data received from server.");
	}
}
