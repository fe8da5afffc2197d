//! Per-character conversation session.
//!
//! A [`ConversationSession`] wires one character's resolver, streaming
//! client, sink and memory store together and serializes its turns: a
//! second query while a stream is in flight waits for the first to finish
//! rather than racing it. Sessions for distinct characters are fully
//! independent.

use crate::config::{CompanionConfig, IdentityConfig, LanguageConfig};
use crate::conversation::client::{StreamingConversationClient, TurnOutcome};
use crate::conversation::types::ConversationRequest;
use crate::conversation::{ConversationSink, MemoryStore};
use crate::endpoint::{EndpointResolver, ResolveError};
use crate::error::Result;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// One character's conversational state and collaborators.
pub struct ConversationSession {
    resolver: Arc<EndpointResolver>,
    client: StreamingConversationClient,
    sink: Arc<dyn ConversationSink>,
    memory: Arc<dyn MemoryStore>,
    identity: IdentityConfig,
    language: LanguageConfig,
    turn_guard: Mutex<()>,
}

impl ConversationSession {
    /// Wire a session from the config and its collaborators.
    pub fn new(
        config: &CompanionConfig,
        resolver: Arc<EndpointResolver>,
        sink: Arc<dyn ConversationSink>,
        memory: Arc<dyn MemoryStore>,
    ) -> Self {
        let client = StreamingConversationClient::new(config.language.spoken_language)
            .with_idle_timeout(config.server.stream_idle_timeout());
        Self {
            resolver,
            client,
            sink,
            memory,
            identity: config.identity.clone(),
            language: config.language.clone(),
            turn_guard: Mutex::new(()),
        }
    }

    /// Run one conversation turn to completion.
    ///
    /// Turns for this session run one at a time, in arrival order. The
    /// cancellation token tears down an in-flight stream (character
    /// switch, app quit, memory erase) without writing to memory.
    pub async fn run_turn(&self, query: &str, cancel: &CancellationToken) -> Result<TurnOutcome> {
        let _turn = self.turn_guard.lock().await;
        debug!(character = self.identity.character_name.as_str(), "starting turn");

        let resolution = match self.resolver.resolve().await {
            Ok(resolution) => resolution,
            Err(error) => {
                let ResolveError::AllUnreachable { notices } = &error;
                for notice in notices {
                    self.sink.notice(*notice).await;
                }
                return Err(error.into());
            }
        };
        for notice in &resolution.notices {
            self.sink.notice(*notice).await;
        }

        let transcript = self.memory.transcript().await?;
        let request = ConversationRequest::new(
            query,
            self.identity.player_name.clone(),
            self.identity.character_name.clone(),
        )
        .with_languages(
            self.language.ai_language,
            self.language.ai_language_in,
            self.language.ai_language_out,
        )
        .with_memory(&transcript);

        self.client
            .send(
                &request,
                &resolution.endpoint,
                self.sink.as_ref(),
                self.memory.as_ref(),
                cancel,
            )
            .await
    }
}
