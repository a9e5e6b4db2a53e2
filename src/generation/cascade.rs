//! Provider fallback cascade: one debit, then ordered attempts until a
//! completion lands or every channel is spent

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::generation::credits::CreditLedger;
use crate::generation::prompt::{assemble_messages, ImageAttachment, TaskKind};
use crate::provider::{
    credit_cost, extract_completion, ChatCompletionRequest, ChatMessage, CompletionTransport,
    ProviderId, ProviderRegistry,
};

/// Sampling parameters fixed across all providers
const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 4000;

/// One generation invocation
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub task: TaskKind,
    pub prompt: String,
    pub history: Vec<ChatMessage>,
    /// Caller's provider preference, as supplied (may be unrecognized)
    pub provider: Option<String>,
    pub model: Option<String>,
    /// Script generation only
    pub image: Option<ImageAttachment>,
    pub user: String,
}

impl GenerationRequest {
    pub fn script(prompt: String, user: String) -> Self {
        Self {
            task: TaskKind::Script,
            prompt,
            history: Vec::new(),
            provider: None,
            model: None,
            image: None,
            user,
        }
    }

    pub fn curriculum(prompt: String, user: String) -> Self {
        Self {
            task: TaskKind::Curriculum,
            prompt,
            history: Vec::new(),
            provider: None,
            model: None,
            image: None,
            user,
        }
    }
}

/// Successful generation result
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub content: String,
    /// Cost charged, keyed by the requested provider tier
    pub credits_used: u32,
    /// Channel that actually produced the completion
    pub provider: ProviderId,
    pub model: String,
}

/// One cascade step: a provider paired with the model it will be asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub provider: ProviderId,
    pub model: String,
}

/// Drives prompt assembly, the single credit debit, and the provider cascade
pub struct GenerationService {
    registry: Arc<ProviderRegistry>,
    ledger: Arc<dyn CreditLedger>,
    transport: Arc<dyn CompletionTransport>,
    default_model: String,
    fallback_model: String,
}

impl GenerationService {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        ledger: Arc<dyn CreditLedger>,
        transport: Arc<dyn CompletionTransport>,
        default_model: String,
        fallback_model: String,
    ) -> Self {
        Self {
            registry,
            ledger,
            transport,
            default_model,
            fallback_model,
        }
    }

    /// Fixed attempt order: the caller's preference (if any), then the
    /// primary channel with the requested model, the primary channel with
    /// the configured fallback model, the secondary direct channel, and
    /// the economy channel. Duplicate (provider, model) pairs collapse so
    /// no pair is tried twice in one invocation.
    pub fn build_plan(&self, preferred: Option<ProviderId>, model: &str) -> Vec<Attempt> {
        let mut plan = Vec::with_capacity(5);

        if let Some(provider) = preferred {
            plan.push(Attempt {
                provider,
                model: provider.remap_preferred(model),
            });
        }

        let stages = [
            (ProviderId::OpenRouter, model.to_string()),
            (ProviderId::OpenRouter, self.fallback_model.clone()),
            (
                ProviderId::OpenAi,
                ProviderId::OpenAi.canonical_model().to_string(),
            ),
            (
                ProviderId::Groq,
                ProviderId::Groq.canonical_model().to_string(),
            ),
        ];

        for (provider, model) in stages {
            let attempt = Attempt { provider, model };
            if !plan.contains(&attempt) {
                plan.push(attempt);
            }
        }

        plan
    }

    /// Run one generation request end to end.
    ///
    /// Credits are debited exactly once, before the first network attempt,
    /// and the debit stands even if every provider fails.
    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutcome> {
        let preferred = request
            .provider
            .as_deref()
            .and_then(|p| p.parse::<ProviderId>().ok());
        let cost = credit_cost(preferred);

        let transaction = self.ledger.verify_and_deduct(&request.user, cost).await?;
        debug!(
            user = %request.user,
            cost = cost,
            remaining = transaction.remaining,
            "Credit check passed"
        );

        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.default_model.clone());
        let plan = self.build_plan(preferred, &model);

        for attempt in plan {
            let entry = self.registry.resolve(attempt.provider);
            let Some(credential) = entry.credential.as_deref() else {
                debug!(provider = %attempt.provider, "Skipping provider without credential");
                continue;
            };

            // The enhancer depends on the provider being tried, so the
            // conversation is rebuilt for every attempt.
            let messages = assemble_messages(
                request.task,
                attempt.provider,
                &request.history,
                &request.prompt,
                request.image.as_ref(),
            );

            let completion_request = ChatCompletionRequest {
                model: attempt.model.clone(),
                messages,
                temperature: TEMPERATURE,
                max_tokens: MAX_TOKENS,
            };

            let result = self
                .transport
                .complete(entry, credential, &completion_request)
                .await
                .and_then(|response| extract_completion(&response));

            match result {
                Ok(content) => {
                    info!(
                        provider = %attempt.provider,
                        model = %attempt.model,
                        "Completion produced"
                    );
                    return Ok(GenerationOutcome {
                        content,
                        credits_used: cost,
                        provider: attempt.provider,
                        model: attempt.model,
                    });
                }
                Err(e) => {
                    // Every failure advances the cascade the same way
                    warn!(
                        provider = %attempt.provider,
                        model = %attempt.model,
                        error = %e,
                        "Attempt failed, advancing cascade"
                    );
                }
            }
        }

        Err(AppError::AllProvidersExhausted)
    }
}
