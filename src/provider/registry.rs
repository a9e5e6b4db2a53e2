//! Provider catalogue: identifiers, endpoints, credentials, model remapping

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Settings;

/// Credit cost charged when the requested provider is unrecognized or omitted
pub const DEFAULT_CREDIT_COST: u32 = 10;

/// The closed set of backends this gateway can call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// Premium general-purpose channel, first tier of the cascade
    OpenRouter,
    /// Mid-tier direct channel, secondary in the cascade
    OpenAi,
    /// Mid-tier channel reachable only as a caller preference
    Gemini,
    /// Economy fast channel, tertiary in the cascade
    Groq,
}

impl ProviderId {
    /// All providers, in cascade order after the preferred attempt
    pub const ALL: [ProviderId; 4] = [
        ProviderId::OpenRouter,
        ProviderId::OpenAi,
        ProviderId::Gemini,
        ProviderId::Groq,
    ];

    /// Position in `ALL`, used to index the registry table
    fn index(self) -> usize {
        match self {
            ProviderId::OpenRouter => 0,
            ProviderId::OpenAi => 1,
            ProviderId::Gemini => 2,
            ProviderId::Groq => 3,
        }
    }

    /// Fixed per-invocation credit cost for this provider tier
    pub fn credit_cost(self) -> u32 {
        match self {
            ProviderId::OpenRouter => 15,
            ProviderId::OpenAi | ProviderId::Gemini => 10,
            ProviderId::Groq => 5,
        }
    }

    pub fn default_endpoint(self) -> &'static str {
        match self {
            ProviderId::OpenRouter => "https://openrouter.ai/api/v1",
            ProviderId::OpenAi => "https://api.openai.com/v1",
            ProviderId::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
            ProviderId::Groq => "https://api.groq.com/openai/v1",
        }
    }

    pub fn credential_env(self) -> &'static str {
        match self {
            ProviderId::OpenRouter => "OPENROUTER_API_KEY",
            ProviderId::OpenAi => "OPENAI_API_KEY",
            ProviderId::Gemini => "GEMINI_API_KEY",
            ProviderId::Groq => "GROQ_API_KEY",
        }
    }

    /// The single model a forced fallback attempt on this channel uses
    pub fn canonical_model(self) -> &'static str {
        match self {
            ProviderId::OpenRouter => "openai/gpt-4o-mini",
            ProviderId::OpenAi => "gpt-4o-mini",
            ProviderId::Gemini => "gemini-2.0-flash",
            ProviderId::Groq => "llama-3.3-70b-versatile",
        }
    }

    /// Model to use when this provider is the caller's explicit preference.
    ///
    /// Gemini only accepts its own model family, so a non-gemini name is
    /// replaced by the canonical default. Groq always substitutes its one
    /// fast model. The general-purpose channels take the caller's model
    /// as requested.
    pub fn remap_preferred(self, requested: &str) -> String {
        match self {
            ProviderId::Gemini => {
                if requested.starts_with("gemini") {
                    requested.to_string()
                } else {
                    self.canonical_model().to_string()
                }
            }
            ProviderId::Groq => self.canonical_model().to_string(),
            ProviderId::OpenRouter | ProviderId::OpenAi => requested.to_string(),
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderId::OpenRouter => write!(f, "openrouter"),
            ProviderId::OpenAi => write!(f, "openai"),
            ProviderId::Gemini => write!(f, "gemini"),
            ProviderId::Groq => write!(f, "groq"),
        }
    }
}

/// Error for a provider identifier outside the recognized set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown provider identifier: '{0}'")]
pub struct UnknownProviderError(String);

impl FromStr for ProviderId {
    type Err = UnknownProviderError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "openrouter" => Ok(ProviderId::OpenRouter),
            "openai" => Ok(ProviderId::OpenAi),
            "gemini" => Ok(ProviderId::Gemini),
            "groq" => Ok(ProviderId::Groq),
            _ => Err(UnknownProviderError(s.to_string())),
        }
    }
}

/// Credit cost for a parsed (or unparseable) requested provider
pub fn credit_cost(requested: Option<ProviderId>) -> u32 {
    requested.map_or(DEFAULT_CREDIT_COST, ProviderId::credit_cost)
}

/// Resolved provider entry: endpoint plus credential presence
#[derive(Debug, Clone)]
pub struct ProviderEntry {
    pub id: ProviderId,
    pub endpoint: String,
    pub credential: Option<String>,
}

impl ProviderEntry {
    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }
}

/// Immutable catalogue of the four providers, resolved once at startup.
///
/// Credential presence is read from the environment at construction and
/// never re-evaluated; a provider without a credential is skipped by the
/// cascade for the process lifetime.
pub struct ProviderRegistry {
    entries: [ProviderEntry; 4],
}

impl ProviderRegistry {
    /// Build the registry from settings and the process environment
    pub fn from_settings(settings: &Settings) -> Self {
        let entries = ProviderId::ALL.map(|id| {
            let overrides = match id {
                ProviderId::OpenRouter => &settings.providers.openrouter,
                ProviderId::OpenAi => &settings.providers.openai,
                ProviderId::Gemini => &settings.providers.gemini,
                ProviderId::Groq => &settings.providers.groq,
            };

            let endpoint = overrides
                .endpoint
                .clone()
                .unwrap_or_else(|| id.default_endpoint().to_string());

            let env_var = overrides
                .api_key_env
                .clone()
                .unwrap_or_else(|| id.credential_env().to_string());
            let credential = std::env::var(&env_var).ok().filter(|v| !v.is_empty());

            if credential.is_some() {
                info!(provider = %id, "Provider credential configured");
            } else {
                debug!(provider = %id, env = %env_var, "Provider credential absent");
            }

            ProviderEntry {
                id,
                endpoint,
                credential,
            }
        });

        Self { entries }
    }

    /// Build a registry from explicit entries, bypassing the environment.
    /// Entries may arrive in any order; the table is stored in `ALL` order
    /// so lookup is a plain index.
    pub fn with_entries(mut entries: [ProviderEntry; 4]) -> Self {
        debug_assert!(
            ProviderId::ALL
                .iter()
                .all(|id| entries.iter().any(|e| e.id == *id)),
            "registry entries must cover every provider identifier"
        );
        entries.sort_by_key(|e| e.id.index());
        Self { entries }
    }

    pub fn resolve(&self, id: ProviderId) -> &ProviderEntry {
        &self.entries[id.index()]
    }

    pub fn entries(&self) -> &[ProviderEntry] {
        &self.entries
    }

    /// Number of providers with a configured credential
    pub fn configured_count(&self) -> usize {
        self.entries.iter().filter(|e| e.has_credential()).count()
    }
}
