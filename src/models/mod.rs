//! Wire types for the gate's HTTP surface.
//!
//! - `chat`: request/response bodies for `/chat` and `/models`, plus the
//!   post-validation `ResolvedRequest` handed to the forwarder.

pub mod chat;

pub use chat::{ChatMessage, ChatRequest, ChatResponse, ModelsResponse, ResolvedRequest};
