//! Voice synthesis client.
//!
//! Fetches synthesized speech for reply text from the resolved endpoint.
//! Korean and English share one synthesis route, Japanese has its own; the
//! returned clip is already measured so callers can apply the length cap
//! before persisting or playing it.

use crate::audio::wav;
use crate::conversation::types::Language;
use crate::endpoint::ResolvedEndpoint;
use crate::error::{CompanionError, Result};
use bytes::Bytes;
use std::time::Duration;
use tracing::debug;

/// A synthesized clip and its measured duration.
#[derive(Debug, Clone)]
pub struct VoiceClip {
    /// Raw WAV bytes as returned by the server.
    pub bytes: Bytes,
    /// Playable duration in seconds; 0.0 when the header did not parse.
    pub duration_secs: f64,
}

impl VoiceClip {
    /// Whether the clip measures over the persistence cap.
    ///
    /// Mirrors [`wav::exceeds_cap`]: an unparseable clip measures as zero
    /// and passes.
    pub fn exceeds_cap(&self) -> bool {
        self.duration_secs > wav::MAX_CLIP_SECS
    }
}

/// Requests synthesized speech from the conversation server.
#[derive(Debug, Clone)]
pub struct VoiceSynthClient {
    client: reqwest::Client,
    speed: f64,
}

impl VoiceSynthClient {
    /// Create a client with the given playback speed multiplier.
    pub fn new(speed: f64) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self { client, speed }
    }

    /// Synthesize `text` in the voice for `language`.
    ///
    /// `POST <base>/getSound/{ko|jp}`; the body must be WAV on HTTP 200.
    pub async fn synthesize(
        &self,
        endpoint: &ResolvedEndpoint,
        text: &str,
        character: &str,
        language: Language,
    ) -> Result<VoiceClip> {
        let url = format!(
            "{}/getSound/{}",
            endpoint.base_url.trim_end_matches('/'),
            language.voice_route().path_segment()
        );
        let body = serde_json::json!({
            "text": text,
            "char": character,
            "lang": language.as_str(),
            "speed": self.speed,
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| CompanionError::Transport(format!("voice request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(CompanionError::Voice(format!(
                "voice synthesis returned HTTP {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CompanionError::Voice(format!("voice response truncated: {e}")))?;

        let duration_secs = wav::duration_secs(&bytes).unwrap_or(0.0);
        debug!(
            url = url.as_str(),
            bytes = bytes.len(),
            duration_secs,
            "voice clip fetched"
        );

        Ok(VoiceClip {
            bytes,
            duration_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_clip_passes_cap() {
        let clip = VoiceClip {
            bytes: Bytes::new(),
            duration_secs: 2.5,
        };
        assert!(!clip.exceeds_cap());
    }

    #[test]
    fn oversized_clip_fails_cap() {
        let clip = VoiceClip {
            bytes: Bytes::new(),
            duration_secs: 10.5,
        };
        assert!(clip.exceeds_cap());
    }

    #[test]
    fn unmeasured_clip_passes_cap() {
        let clip = VoiceClip {
            bytes: Bytes::from_static(b"not a wav"),
            duration_secs: 0.0,
        };
        assert!(!clip.exceeds_cap());
    }
}
