//! Streaming conversation with the remote inference server.
//!
//! Sub-modules:
//! - `types`: wire and domain types (request body, fragments, languages)
//! - `ndjson`: incremental newline-delimited JSON framing
//! - `aggregator`: per-stream reply accumulation and voice selection
//! - `client`: the streaming HTTP client driving one turn
//! - `session`: per-character turn serialization and wiring
//!
//! The host application plugs in through [`ConversationSink`] (balloon UI
//! and voice playback) and [`MemoryStore`] (persistent transcript).

pub mod aggregator;
pub mod client;
pub mod ndjson;
pub mod session;
pub mod types;

use crate::endpoint::ServerNotice;
use crate::error::Result;
use async_trait::async_trait;
use types::{DisplayText, FinalizedReply, Language, MemoryEntry};

pub use aggregator::{ConsumeEffect, ReplyAggregator};
pub use client::{StreamingConversationClient, TurnOutcome};
pub use types::{ConversationRequest, ReplyFragment, ReplyItem, Speaker};

/// UI-facing side effects of a conversation turn.
///
/// Calls arrive strictly in stream order: `answer_started` once, before any
/// `reply_updated`; `answer_complete` last. Implementations live in the
/// host application (balloon widgets, audio playback).
#[async_trait]
pub trait ConversationSink: Send + Sync {
    /// A user-visible notice surfaced during endpoint resolution.
    async fn notice(&self, notice: ServerNotice);

    /// The server acknowledged the query and began answering.
    async fn answer_started(&self, query: &str);

    /// The accumulated reply text changed; re-render the balloon.
    async fn reply_updated(&self, display: DisplayText);

    /// Spoken-language text is ready for voice synthesis.
    async fn voice_requested(&self, text: &str, language: Language);

    /// The stream completed and the reply is final.
    async fn answer_complete(&self, reply: &FinalizedReply);
}

/// Persistent conversation transcript owned by the host application.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Append one finished transcript line.
    async fn append(&self, entry: MemoryEntry) -> Result<()>;

    /// The full transcript, oldest first.
    async fn transcript(&self) -> Result<Vec<MemoryEntry>>;
}
