//! Backend access: HTTP upload, chat socket and the concept broadcast.

mod chat;
mod gateway;
mod slot;
mod upload;

pub use chat::{ChatChannel, ChatEvent, ChatMessage, ConnectionState, Sender};
pub use gateway::TransportGateway;
pub use upload::{UploadFile, UploadSummary};
