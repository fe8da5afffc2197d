//! Streaming conversation client.
//!
//! Issues `POST /conversation_stream` and consumes the NDJSON reply stream
//! incrementally: each decoded line goes to the [`ReplyAggregator`], whose
//! effects drive the [`ConversationSink`] while text is still arriving.
//!
//! There is no retry logic here. Endpoint resolution is the failover
//! mechanism; a dead stream is surfaced to the caller as-is.

use crate::conversation::aggregator::ReplyAggregator;
use crate::conversation::ndjson::NdjsonLineParser;
use crate::conversation::types::{
    ConversationRequest, FinalizedReply, Language, MemoryEntry, ReplyFragment, Speaker,
};
use crate::conversation::{ConversationSink, MemoryStore};
use crate::endpoint::ResolvedEndpoint;
use crate::error::{CompanionError, Result};
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Result of one completed conversation turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Correlation id of the turn.
    pub turn_id: Uuid,
    /// Final joined reply strings.
    pub reply: FinalizedReply,
    /// How many fragments the stream carried.
    pub fragments: usize,
}

/// Mutable state of one in-flight stream, owned exclusively by that stream.
struct StreamProgress {
    aggregator: ReplyAggregator,
    answering: bool,
    fragments: usize,
}

/// Streams one conversation turn against a resolved endpoint.
#[derive(Debug, Clone)]
pub struct StreamingConversationClient {
    client: reqwest::Client,
    spoken_language: Language,
    idle_timeout: Option<Duration>,
}

impl StreamingConversationClient {
    /// Create a client voicing replies in the given language.
    ///
    /// The HTTP client carries no overall request timeout — the reply
    /// stream runs until the server closes it — only a connect timeout
    /// and the per-chunk idle limit.
    pub fn new(spoken_language: Language) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            spoken_language,
            idle_timeout: Some(Duration::from_secs(120)),
        }
    }

    /// Set the per-chunk idle limit; `None` waits for the server forever.
    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Send one turn and drive the sink until the stream completes.
    ///
    /// On completion the finalized exchange is appended to `memory`. On
    /// cancellation the partially accumulated reply is discarded without
    /// finalizing and memory is left untouched; whatever the sink already
    /// displayed stays in place.
    pub async fn send(
        &self,
        request: &ConversationRequest,
        endpoint: &ResolvedEndpoint,
        sink: &dyn ConversationSink,
        memory: &dyn MemoryStore,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome> {
        let turn_id = Uuid::new_v4();
        let url = format!(
            "{}/conversation_stream",
            endpoint.base_url.trim_end_matches('/')
        );
        debug!(turn = %turn_id, url = url.as_str(), "sending conversation request");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| CompanionError::Transport(format!("conversation request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(CompanionError::Transport(format!(
                "conversation request returned HTTP {}",
                response.status()
            )));
        }

        let mut byte_stream = response.bytes_stream();
        let mut parser = NdjsonLineParser::new();
        let mut progress = StreamProgress {
            aggregator: ReplyAggregator::new(self.spoken_language),
            answering: false,
            fragments: 0,
        };

        loop {
            let chunk = tokio::select! {
                () = cancel.cancelled() => {
                    info!(turn = %turn_id, "conversation cancelled mid-stream");
                    return Err(CompanionError::Cancelled);
                }
                chunk = self.next_chunk(&mut byte_stream) => chunk?,
            };

            let Some(bytes) = chunk else {
                break;
            };
            for line in parser.push(&bytes) {
                self.process_line(&line, &mut progress, sink).await?;
            }
        }

        // A final line without a trailing newline still counts.
        if let Some(line) = parser.flush() {
            self.process_line(&line, &mut progress, sink).await?;
        }

        let StreamProgress {
            aggregator,
            fragments,
            ..
        } = progress;
        let reply = aggregator.finalize();
        sink.answer_complete(&reply).await;

        memory
            .append(MemoryEntry::new(Speaker::Player, request.query.clone()))
            .await?;
        memory
            .append(MemoryEntry::new(Speaker::Character, reply.en.clone()))
            .await?;

        info!(turn = %turn_id, fragments, "conversation stream complete");
        Ok(TurnOutcome {
            turn_id,
            reply,
            fragments,
        })
    }

    /// Await the next body chunk, bounded by the idle limit.
    async fn next_chunk<S>(&self, stream: &mut S) -> Result<Option<Bytes>>
    where
        S: Stream<Item = reqwest::Result<Bytes>> + Unpin,
    {
        let item = match self.idle_timeout {
            Some(limit) => tokio::time::timeout(limit, stream.next())
                .await
                .map_err(|_| {
                    CompanionError::Transport(format!(
                        "reply stream stalled: no data within {}s",
                        limit.as_secs()
                    ))
                })?,
            None => stream.next().await,
        };

        match item {
            Some(Ok(bytes)) => Ok(Some(bytes)),
            Some(Err(e)) => Err(CompanionError::Stream(format!(
                "reply stream read failed: {e}"
            ))),
            None => Ok(None),
        }
    }

    /// Decode one NDJSON line and drive the sink.
    ///
    /// A malformed line is logged and skipped; the stream continues.
    async fn process_line(
        &self,
        line: &str,
        progress: &mut StreamProgress,
        sink: &dyn ConversationSink,
    ) -> Result<()> {
        let fragment: ReplyFragment = match serde_json::from_str(line) {
            Ok(fragment) => fragment,
            Err(e) => {
                warn!(error = %e, "skipping malformed reply fragment");
                return Ok(());
            }
        };

        if !progress.answering {
            let Some(echo) = fragment.query.as_ref() else {
                return Err(CompanionError::Stream(
                    "first reply fragment carried no query echo".into(),
                ));
            };
            sink.answer_started(&echo.text).await;
            progress.answering = true;
        }

        progress.fragments += 1;
        if let Some(effect) = progress.aggregator.consume(&fragment) {
            sink.reply_updated(effect.display).await;
            if let Some(text) = effect.voice {
                sink.voice_requested(&text, self.spoken_language).await;
            }
        }
        Ok(())
    }
}
