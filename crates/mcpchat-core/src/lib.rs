//! Core library for mcpchat: a client for an MCP-backed chat service.
//!
//! The two load-bearing pieces live in [`stream`] (reassembling a chunked
//! server-sent-event stream into message notifications) and [`markdown`]
//! (rendering the constrained markdown dialect LLM responses use into
//! sanitized HTML fragments). Everything else is the plumbing around them:
//! the session/message model, the backend REST client, and configuration.

pub mod client;
pub mod config;
pub mod markdown;
pub mod session;
pub mod stream;
