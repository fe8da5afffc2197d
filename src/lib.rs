//! Pino: streaming conversation core for a desktop companion mascot.
//!
//! This crate provides the engine-independent half of an animated desktop
//! companion: everything that talks to the remote inference server.
//!
//! # Architecture
//!
//! A conversation turn flows through three cooperating pieces:
//! - **Endpoint resolution**: probes candidate base URLs (loopback, a
//!   registry-published tunnel, a static fallback) in priority order and
//!   caches the first reachable one
//! - **Streaming conversation client**: POSTs the query and consumes the
//!   newline-delimited JSON reply stream as it arrives
//! - **Reply aggregation**: accumulates per-language reply text and picks
//!   the text to hand to voice synthesis
//!
//! The animated overlay, balloon UI and audio playback live in the host
//! application and are reached through the [`conversation::ConversationSink`]
//! and [`conversation::MemoryStore`] traits.

pub mod audio;
pub mod config;
pub mod conversation;
pub mod endpoint;
pub mod error;
pub mod voice;

pub use config::CompanionConfig;
pub use conversation::session::ConversationSession;
pub use conversation::{ConversationSink, MemoryStore};
pub use error::{CompanionError, Result};
