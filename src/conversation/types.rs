//! Wire and domain types for the conversation protocol.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ── Languages ──────────────────────────────────────────────────

/// Reply language supported by the inference server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Korean.
    Ko,
    /// Japanese.
    Jp,
    /// English.
    En,
}

/// Synthesis service variant a language is voiced by.
///
/// Korean and English share the Korean-hosted synthesis path; Japanese has
/// its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceRoute {
    /// `/getSound/ko` — Korean and English voices.
    Korean,
    /// `/getSound/jp` — Japanese voice.
    Japanese,
}

impl VoiceRoute {
    /// URL path segment for this route.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Korean => "ko",
            Self::Japanese => "jp",
        }
    }
}

impl Language {
    /// Wire name of the language.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ko => "ko",
            Self::Jp => "jp",
            Self::En => "en",
        }
    }

    /// All languages, in accumulation order.
    pub fn all() -> [Language; 3] {
        [Self::Ko, Self::Jp, Self::En]
    }

    /// Which synthesis service voices this language.
    pub fn voice_route(&self) -> VoiceRoute {
        match self {
            Self::Ko | Self::En => VoiceRoute::Korean,
            Self::Jp => VoiceRoute::Japanese,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ko" => Ok(Self::Ko),
            "jp" => Ok(Self::Jp),
            "en" => Ok(Self::En),
            other => Err(format!("unknown language: {other:?}")),
        }
    }
}

// ── Memory transcript ──────────────────────────────────────────

/// Who said a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// The user.
    Player,
    /// The mascot character.
    Character,
}

/// One line of the persisted conversation transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Who said it.
    pub speaker: Speaker,
    /// What was said.
    pub text: String,
}

impl MemoryEntry {
    /// Create a transcript line.
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }
}

// ── Request body ───────────────────────────────────────────────

/// JSON body of `POST /conversation_stream`.
///
/// Built fresh for every turn and immutable once constructed. The `memory`
/// field carries the full transcript as a JSON-encoded string, matching the
/// server's wire contract.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationRequest {
    /// The user's query text.
    pub query: String,
    /// Player display name.
    pub player: String,
    /// Character name.
    #[serde(rename = "char")]
    pub character: String,
    /// Reply language override; empty string means server default.
    #[serde(serialize_with = "serialize_language_or_empty")]
    pub ai_language: Option<Language>,
    /// Input language override.
    #[serde(serialize_with = "serialize_language_or_empty")]
    pub ai_language_in: Option<Language>,
    /// Output language override.
    #[serde(serialize_with = "serialize_language_or_empty")]
    pub ai_language_out: Option<Language>,
    /// JSON-encoded transcript of prior exchanges.
    pub memory: String,
}

fn serialize_language_or_empty<S>(
    language: &Option<Language>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(language.map(|l| l.as_str()).unwrap_or(""))
}

impl ConversationRequest {
    /// Create a request with no language overrides and an empty transcript.
    pub fn new(
        query: impl Into<String>,
        player: impl Into<String>,
        character: impl Into<String>,
    ) -> Self {
        Self {
            query: query.into(),
            player: player.into(),
            character: character.into(),
            ai_language: None,
            ai_language_in: None,
            ai_language_out: None,
            memory: "[]".to_owned(),
        }
    }

    /// Set the server-side language overrides.
    pub fn with_languages(
        mut self,
        ai: Option<Language>,
        ai_in: Option<Language>,
        ai_out: Option<Language>,
    ) -> Self {
        self.ai_language = ai;
        self.ai_language_in = ai_in;
        self.ai_language_out = ai_out;
        self
    }

    /// Attach the transcript, JSON-encoded into the `memory` field.
    pub fn with_memory(mut self, transcript: &[MemoryEntry]) -> Self {
        self.memory = serde_json::to_string(transcript).unwrap_or_else(|_| "[]".to_owned());
        self
    }
}

// ── Reply fragments ────────────────────────────────────────────

/// One decoded NDJSON line of the reply stream.
///
/// Transient: consumed by the aggregator and discarded.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplyFragment {
    /// Echo of the query; present only on the first fragment.
    #[serde(default)]
    pub query: Option<QueryEcho>,
    /// Incremental reply pieces, in order.
    #[serde(default)]
    pub reply_list: Option<Vec<ReplyItem>>,
}

/// The server's echo of the query text.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryEcho {
    /// The echoed query.
    pub text: String,
}

/// One reply piece with up to three language renderings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplyItem {
    /// Korean rendering.
    #[serde(default)]
    pub answer_ko: Option<String>,
    /// Japanese rendering.
    #[serde(default)]
    pub answer_jp: Option<String>,
    /// English rendering.
    #[serde(default)]
    pub answer_en: Option<String>,
}

impl ReplyItem {
    /// The rendering for one language, if present.
    pub fn answer(&self, language: Language) -> Option<&str> {
        match language {
            Language::Ko => self.answer_ko.as_deref(),
            Language::Jp => self.answer_jp.as_deref(),
            Language::En => self.answer_en.as_deref(),
        }
    }
}

// ── Aggregated output ──────────────────────────────────────────

/// Space-joined per-language render strings for the balloon UI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayText {
    /// Korean text so far.
    pub ko: String,
    /// Japanese text so far.
    pub jp: String,
    /// English text so far.
    pub en: String,
}

impl DisplayText {
    /// The rendering for the UI's current display language.
    pub fn for_language(&self, language: Language) -> &str {
        match language {
            Language::Ko => &self.ko,
            Language::Jp => &self.jp,
            Language::En => &self.en,
        }
    }
}

/// Final joined reply strings after the stream completes.
///
/// `en` is the canonical transcript entry; `ko`/`jp` serve after-the-fact
/// display-language switching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalizedReply {
    /// Joined Korean reply.
    pub ko: String,
    /// Joined Japanese reply.
    pub jp: String,
    /// Joined English reply.
    pub en: String,
}
