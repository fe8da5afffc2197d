//! Configuration types for the companion core.

use crate::conversation::types::Language;
use crate::error::{CompanionError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration for the companion core.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanionConfig {
    /// Who is talking to whom.
    pub identity: IdentityConfig,
    /// Display / spoken / server-side language selection.
    pub language: LanguageConfig,
    /// Server endpoints, registry access and timeouts.
    pub server: ServerConfig,
    /// Voice synthesis settings.
    pub voice: VoiceConfig,
}

/// Player and character identity sent with every conversation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Name the character addresses the user by.
    pub player_name: String,
    /// Name of the character the user is talking to.
    pub character_name: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            player_name: "Player".to_owned(),
            character_name: "Pino".to_owned(),
        }
    }
}

/// Language selection.
///
/// The `ai_language*` fields are forwarded to the server verbatim; `None`
/// serializes as an empty string, which the server treats as "use your
/// default".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// Language the balloon UI currently displays.
    pub ui_language: Language,
    /// Language the character speaks aloud. Reply text in this language is
    /// routed to voice synthesis.
    pub spoken_language: Language,
    /// Server-side reply language override.
    pub ai_language: Option<Language>,
    /// Server-side input language override.
    pub ai_language_in: Option<Language>,
    /// Server-side output language override.
    pub ai_language_out: Option<Language>,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            ui_language: Language::En,
            spoken_language: Language::En,
            ai_language: None,
            ai_language_in: None,
            ai_language_out: None,
        }
    }
}

/// Server endpoints, registry access and timeouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Loopback endpoint, probed first.
    pub local_url: String,
    /// Static fallback tunnel domain, probed last.
    pub fallback_url: String,
    /// Signed storage URL of the registry document mapping server ids to
    /// tunnel endpoints. Empty disables the registry step.
    pub registry_url: String,
    /// Bearer token sent with registry fetches.
    pub registry_api_key: String,
    /// Placeholder server id used when the host application never provides
    /// one in time.
    pub server_id: String,
    /// Health probe timeout in seconds.
    pub probe_timeout_secs: u64,
    /// How long to wait for the host application to provide the server id
    /// before falling back to the placeholder.
    pub settings_wait_secs: u64,
    /// Abort a reply stream when no bytes arrive for this long. 0 disables
    /// the limit.
    pub stream_idle_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            local_url: "http://127.0.0.1:5000".to_owned(),
            fallback_url: "https://pino.loca.lt".to_owned(),
            registry_url: String::new(),
            registry_api_key: String::new(),
            server_id: "default".to_owned(),
            probe_timeout_secs: 3,
            settings_wait_secs: 3,
            stream_idle_timeout_secs: 120,
        }
    }
}

impl ServerConfig {
    /// Health probe timeout as a [`Duration`].
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// Server-id wait as a [`Duration`].
    pub fn settings_wait(&self) -> Duration {
        Duration::from_secs(self.settings_wait_secs)
    }

    /// Stream idle timeout, `None` when disabled.
    pub fn stream_idle_timeout(&self) -> Option<Duration> {
        (self.stream_idle_timeout_secs > 0)
            .then(|| Duration::from_secs(self.stream_idle_timeout_secs))
    }
}

/// Voice synthesis settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Playback speed multiplier forwarded to the synthesis server.
    pub speed: f64,
    /// Playback volume in \[0, 1\].
    pub volume: f64,
    /// Clips measuring longer than this are not persisted or played.
    pub max_clip_secs: f64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            volume: 1.0,
            max_clip_secs: crate::audio::wav::MAX_CLIP_SECS,
        }
    }
}

impl CompanionConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file yields the defaults; a malformed file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        let config: Self = toml::from_str(&raw).map_err(|e| {
            CompanionError::Config(format!("invalid config file {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(self)
            .map_err(|e| CompanionError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    /// Default config file location under the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pino").join("config.toml"))
    }

    /// Check that every configured URL parses.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("server.local_url", &self.server.local_url),
            ("server.fallback_url", &self.server.fallback_url),
            ("server.registry_url", &self.server.registry_url),
        ] {
            if value.is_empty() {
                continue;
            }
            url::Url::parse(value)
                .map_err(|e| CompanionError::Config(format!("{field} is not a valid URL: {e}")))?;
        }
        Ok(())
    }
}
