//! EduGen Gateway
//!
//! Credit-metered gateway for generative-AI features (app-script and
//! curriculum generation). Each request debits a fixed credit cost against
//! the caller's balance, then drives an ordered provider fallback cascade
//! until one backend returns a well-formed completion or all are exhausted.

pub mod api;
pub mod config;
pub mod error;
pub mod generation;
pub mod provider;

pub use error::{AppError, Result};

use std::sync::Arc;

use generation::{CreditLedger, GenerationService};
use provider::ProviderRegistry;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Arc<config::Settings>,
    pub registry: Arc<ProviderRegistry>,
    pub ledger: Arc<dyn CreditLedger>,
    pub generator: Arc<GenerationService>,
}
