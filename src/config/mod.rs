//! Configuration module

pub mod settings;

pub use settings::{
    AttributionConfig, CreditsConfig, GenerationConfig, LoggingConfig, ProviderSettings,
    ProvidersConfig, ServerConfig, Settings,
};
