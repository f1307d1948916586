//! CLI command handlers.

pub mod chat;
pub mod feedback;
pub mod info;
pub mod render;
pub mod sessions;
