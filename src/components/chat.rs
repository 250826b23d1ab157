//! Chat transcript over the tutor socket.

use chrono::Local;
use leptos::prelude::*;
use log::{error, warn};
use web_sys::{KeyboardEvent, MouseEvent};

use crate::error::TransportError;
use crate::services::{ChatChannel, ChatEvent, ChatMessage, ConnectionState, Sender, TransportGateway};

pub const GREETING: &str = "Connected to the tutor. Ready to chat.";

/// Apply one channel event to the transcript and connection state.
fn apply_event(event: ChatEvent, messages: &mut Vec<ChatMessage>) -> Option<ConnectionState> {
	match event {
		ChatEvent::Opened => {
			messages.push(ChatMessage::bot(GREETING));
			Some(ConnectionState::Open)
		}
		ChatEvent::Message(text) => {
			messages.push(ChatMessage::bot(text));
			None
		}
		ChatEvent::Closed => Some(ConnectionState::Closed),
		ChatEvent::Failed(reason) => {
			error!("Chat connection failed: {}", reason);
			Some(ConnectionState::Closed)
		}
	}
}

#[component]
pub fn ChatPanel(gateway: TransportGateway) -> impl IntoView {
	let messages = RwSignal::new(Vec::<ChatMessage>::new());
	let state = RwSignal::new(ConnectionState::Connecting);
	let draft = RwSignal::new(String::new());
	let channel = StoredValue::new_local(None::<ChatChannel>);

	let connect = move || {
		state.set(ConnectionState::Connecting);
		let opened = gateway.open_chat_channel(move |event| {
			let next = messages.try_update(|list| apply_event(event, list)).flatten();
			if let Some(next) = next {
				let _ = state.try_set(next);
			}
		});
		match opened {
			// Replacing the previous channel drops and closes it.
			Ok(ch) => channel.set_value(Some(ch)),
			Err(e) => {
				error!("Could not open chat channel: {}", e);
				state.set(ConnectionState::Closed);
			}
		}
	};
	connect();
	let reconnect = StoredValue::new_local(connect);

	on_cleanup(move || {
		let _ = channel.try_update_value(|ch| {
			if let Some(ch) = ch.take() {
				ch.close();
			}
		});
	});

	let send = move || {
		let text = draft.get_untracked();
		if text.trim().is_empty() {
			return;
		}
		let sent = channel.with_value(|ch| match ch {
			Some(ch) => ch.send(&text),
			None => Err(TransportError::Socket("chat is not connected".into())),
		});
		messages.update(|list| list.push(ChatMessage::user(text.clone())));
		if let Err(e) = sent {
			warn!("Message not delivered: {}", e);
		}
		draft.set(String::new());
	};

	let on_keydown = move |ev: KeyboardEvent| {
		if ev.key() == "Enter" && !ev.shift_key() {
			ev.prevent_default();
			send();
		}
	};
	let on_send = move |_: MouseEvent| send();

	view! {
		<section class="chat-panel">
			<header>
				<h2>"Tutor chat"</h2>
				<span class="connection">
					{move || match state.get() {
						ConnectionState::Connecting => "Connecting...",
						ConnectionState::Open => "Online",
						ConnectionState::Closed => "Offline",
					}}
				</span>
				<Show when=move || state.get() == ConnectionState::Closed>
					<button on:click=move |_: MouseEvent| reconnect.with_value(|connect| connect())>
						"Reconnect"
					</button>
				</Show>
			</header>
			<ul class="transcript">
				{move || {
					messages
						.get()
						.into_iter()
						.map(|msg| {
							let class = match msg.sender {
								Sender::User => "message user",
								Sender::Bot => "message bot",
							};
							view! {
								<li class=class>
									<span class="text">{msg.text}</span>
									<time>{msg.timestamp.with_timezone(&Local).format("%H:%M").to_string()}</time>
								</li>
							}
						})
						.collect_view()
				}}
			</ul>
			<div class="composer">
				<input
					type="text"
					placeholder="Ask about your syllabus..."
					prop:value=move || draft.get()
					on:input=move |ev| draft.set(event_target_value(&ev))
					on:keydown=on_keydown
				/>
				<button on:click=on_send>"Send"</button>
			</div>
		</section>
	}
}
