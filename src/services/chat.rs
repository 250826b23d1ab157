//! Chat socket wrapper and message model.

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Deserialize;
use wasm_bindgen::prelude::*;
use web_sys::{CloseEvent, Event, MessageEvent, WebSocket};

use crate::error::TransportError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sender {
	User,
	Bot,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChatMessage {
	pub text: String,
	pub sender: Sender,
	pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
	pub fn user(text: impl Into<String>) -> Self {
		Self::new(text, Sender::User)
	}

	pub fn bot(text: impl Into<String>) -> Self {
		Self::new(text, Sender::Bot)
	}

	fn new(text: impl Into<String>, sender: Sender) -> Self {
		Self {
			text: text.into(),
			sender,
			timestamp: Utc::now(),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
	Connecting,
	Open,
	Closed,
}

#[derive(Deserialize)]
struct ChatFrame {
	text: String,
}

/// An inbound frame, either a `{"text": ...}` object or plain text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundFrame {
	Structured(String),
	Raw(String),
}

impl InboundFrame {
	pub fn into_text(self) -> String {
		match self {
			InboundFrame::Structured(text) | InboundFrame::Raw(text) => text,
		}
	}
}

pub fn decode_frame(raw: &str) -> InboundFrame {
	match serde_json::from_str::<ChatFrame>(raw) {
		Ok(frame) => InboundFrame::Structured(frame.text),
		Err(_) => InboundFrame::Raw(raw.to_string()),
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatEvent {
	Opened,
	Message(String),
	Closed,
	Failed(String),
}

/// One open chat socket. Closed on drop.
pub struct ChatChannel {
	socket: WebSocket,
	_on_open: Closure<dyn FnMut(Event)>,
	_on_message: Closure<dyn FnMut(MessageEvent)>,
	_on_close: Closure<dyn FnMut(CloseEvent)>,
	_on_error: Closure<dyn FnMut(Event)>,
}

impl ChatChannel {
	pub fn open(url: &str, on_event: impl Fn(ChatEvent) + 'static) -> Result<Self, TransportError> {
		let socket = WebSocket::new(url).map_err(|e| TransportError::Socket(format!("{:?}", e)))?;
		let on_event = std::rc::Rc::new(on_event);

		let emit = on_event.clone();
		let on_open = Closure::<dyn FnMut(Event)>::new(move |_: Event| {
			info!("Connected to chat server");
			emit(ChatEvent::Opened);
		});

		let emit = on_event.clone();
		let on_message = Closure::<dyn FnMut(MessageEvent)>::new(move |ev: MessageEvent| {
			match ev.data().as_string() {
				Some(raw) => emit(ChatEvent::Message(decode_frame(&raw).into_text())),
				None => warn!("Ignoring non-text chat frame"),
			}
		});

		let emit = on_event.clone();
		let on_close = Closure::<dyn FnMut(CloseEvent)>::new(move |ev: CloseEvent| {
			info!("Disconnected from chat server (code {})", ev.code());
			emit(ChatEvent::Closed);
		});

		let emit = on_event;
		let on_error = Closure::<dyn FnMut(Event)>::new(move |_: Event| {
			emit(ChatEvent::Failed("connection error".into()));
		});

		socket.set_onopen(Some(on_open.as_ref().unchecked_ref()));
		socket.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
		socket.set_onclose(Some(on_close.as_ref().unchecked_ref()));
		socket.set_onerror(Some(on_error.as_ref().unchecked_ref()));

		Ok(Self {
			socket,
			_on_open: on_open,
			_on_message: on_message,
			_on_close: on_close,
			_on_error: on_error,
		})
	}

	/// Fire-and-forget send of the raw text.
	pub fn send(&self, text: &str) -> Result<(), TransportError> {
		if self.socket.ready_state() != WebSocket::OPEN {
			return Err(TransportError::Socket("chat is not connected".into()));
		}
		self.socket
			.send_with_str(text)
			.map_err(|e| TransportError::Socket(format!("{:?}", e)))
	}

	/// Detach callbacks and close. Safe to call more than once.
	pub fn close(&self) {
		self.socket.set_onopen(None);
		self.socket.set_onmessage(None);
		self.socket.set_onclose(None);
		self.socket.set_onerror(None);
		match self.socket.ready_state() {
			WebSocket::CLOSING | WebSocket::CLOSED => {}
			_ => {
				let _ = self.socket.close();
			}
		}
	}
}

impl Drop for ChatChannel {
	fn drop(&mut self) {
		self.close();
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn plain_text_frame_is_shown_verbatim() {
		assert_eq!(decode_frame("hello"), InboundFrame::Raw("hello".into()));
		assert_eq!(decode_frame("hello").into_text(), "hello");
	}

	#[test]
	fn json_frame_uses_text_field() {
		assert_eq!(decode_frame(r#"{"text":"hi"}"#), InboundFrame::Structured("hi".into()));
		assert_eq!(decode_frame(r#"{"text":"hi","extra":1}"#).into_text(), "hi");
	}

	#[test]
	fn json_without_text_falls_back_to_raw() {
		for raw in [r#"{"reply":"hi"}"#, "42", r#""quoted""#, "{not json", ""] {
			assert_eq!(decode_frame(raw), InboundFrame::Raw(raw.to_string()), "{raw}");
		}
	}

	#[test]
	fn messages_record_sender() {
		let user = ChatMessage::user("What is a limit?");
		let bot = ChatMessage::bot("A value a function approaches.");
		assert_eq!(user.sender, Sender::User);
		assert_eq!(bot.sender, Sender::Bot);
		assert!(bot.timestamp >= user.timestamp);
	}
}
