//! Cascade behavior tests against a scripted transport

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use edugen_gateway::error::{AppError, Result};
use edugen_gateway::generation::{
    CreditLedger, GenerationRequest, GenerationService, ImageAttachment, InMemoryCreditLedger,
};
use edugen_gateway::provider::{
    ChatChoice, ChatCompletionRequest, ChatCompletionResponse, CompletionTransport, ContentPart,
    MessageContent, ProviderEntry, ProviderId, ProviderRegistry, ResponseMessage,
};

/// Transport that records every attempt and succeeds only on one provider
struct ScriptedTransport {
    calls: Mutex<Vec<(ProviderId, ChatCompletionRequest)>>,
    succeed_on: Option<ProviderId>,
}

impl ScriptedTransport {
    fn new(succeed_on: Option<ProviderId>) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            succeed_on,
        })
    }

    fn calls(&self) -> Vec<(ProviderId, ChatCompletionRequest)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionTransport for ScriptedTransport {
    async fn complete(
        &self,
        entry: &ProviderEntry,
        _credential: &str,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        self.calls.lock().unwrap().push((entry.id, request.clone()));

        if self.succeed_on == Some(entry.id) {
            Ok(ChatCompletionResponse {
                id: Some("chatcmpl-test".to_string()),
                model: Some(request.model.clone()),
                choices: vec![ChatChoice {
                    index: 0,
                    message: ResponseMessage {
                        role: "assistant".to_string(),
                        content: Some("generated content".to_string()),
                    },
                    finish_reason: Some("stop".to_string()),
                }],
                usage: None,
            })
        } else {
            Err(AppError::ProviderError(format!("{} unavailable", entry.id)))
        }
    }
}

fn registry_with_credentials(configured: &[ProviderId]) -> Arc<ProviderRegistry> {
    let entries = ProviderId::ALL.map(|id| ProviderEntry {
        id,
        endpoint: format!("http://localhost/{}", id),
        credential: configured.contains(&id).then(|| "test-key".to_string()),
    });
    Arc::new(ProviderRegistry::with_entries(entries))
}

fn service(
    registry: Arc<ProviderRegistry>,
    ledger: Arc<InMemoryCreditLedger>,
    transport: Arc<ScriptedTransport>,
) -> GenerationService {
    GenerationService::new(
        registry,
        ledger,
        transport,
        "openai/gpt-4o-mini".to_string(),
        "openai/gpt-4o-mini".to_string(),
    )
}

#[tokio::test]
async fn insufficient_credits_makes_zero_attempts() {
    let ledger = Arc::new(InMemoryCreditLedger::new(100));
    ledger.set_balance("alice", 4);
    let transport = ScriptedTransport::new(Some(ProviderId::Groq));
    let svc = service(
        registry_with_credentials(&ProviderId::ALL),
        ledger.clone(),
        transport.clone(),
    );

    let mut request = GenerationRequest::curriculum("teach algebra".to_string(), "alice".to_string());
    request.provider = Some("groq".to_string());

    let err = svc.generate(request).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::InsufficientCredits { required: 5, available: 4 }
    ));
    assert!(transport.calls().is_empty());
    assert_eq!(ledger.balance("alice").await, Some(4));
}

#[tokio::test]
async fn preferred_success_is_a_single_attempt_with_remapped_model() {
    let ledger = Arc::new(InMemoryCreditLedger::new(100));
    let transport = ScriptedTransport::new(Some(ProviderId::Gemini));
    let svc = service(
        registry_with_credentials(&ProviderId::ALL),
        ledger,
        transport.clone(),
    );

    let mut request = GenerationRequest::script("make a quiz".to_string(), "alice".to_string());
    request.provider = Some("gemini".to_string());
    request.model = Some("gpt-4o".to_string());

    let outcome = svc.generate(request).await.unwrap();
    assert_eq!(outcome.provider, ProviderId::Gemini);
    assert_eq!(outcome.model, "gemini-2.0-flash");
    assert_eq!(outcome.credits_used, 10);

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, ProviderId::Gemini);
    assert_eq!(calls[0].1.model, "gemini-2.0-flash");
}

#[tokio::test]
async fn preferred_failure_falls_to_primary_with_original_model() {
    let ledger = Arc::new(InMemoryCreditLedger::new(100));
    let transport = ScriptedTransport::new(Some(ProviderId::OpenRouter));
    let svc = service(
        registry_with_credentials(&ProviderId::ALL),
        ledger,
        transport.clone(),
    );

    let mut request = GenerationRequest::script("make a quiz".to_string(), "alice".to_string());
    request.provider = Some("gemini".to_string());
    request.model = Some("gpt-4o".to_string());

    let outcome = svc.generate(request).await.unwrap();
    assert_eq!(outcome.provider, ProviderId::OpenRouter);
    assert_eq!(outcome.model, "gpt-4o");

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, ProviderId::Gemini);
    assert_eq!(calls[1].0, ProviderId::OpenRouter);
    assert_eq!(calls[1].1.model, "gpt-4o");
}

#[tokio::test]
async fn exhaustion_keeps_the_debit() {
    let ledger = Arc::new(InMemoryCreditLedger::new(100));
    let transport = ScriptedTransport::new(None);
    let svc = service(
        registry_with_credentials(&ProviderId::ALL),
        ledger.clone(),
        transport.clone(),
    );

    let mut request =
        GenerationRequest::curriculum("teach algebra".to_string(), "alice".to_string());
    request.model = Some("anthropic/claude-3.5-sonnet".to_string());

    let err = svc.generate(request).await.unwrap_err();
    assert!(matches!(err, AppError::AllProvidersExhausted));
    // Four cascade stages, no preferred attempt
    assert_eq!(transport.calls().len(), 4);
    // Default cost of 10 was spent and is not returned
    assert_eq!(ledger.balance("alice").await, Some(90));
}

#[tokio::test]
async fn credential_less_providers_are_skipped_in_order() {
    let ledger = Arc::new(InMemoryCreditLedger::new(100));
    let transport = ScriptedTransport::new(Some(ProviderId::Groq));
    let svc = service(
        registry_with_credentials(&[ProviderId::OpenAi, ProviderId::Groq]),
        ledger,
        transport.clone(),
    );

    let request = GenerationRequest::script("make a quiz".to_string(), "alice".to_string());
    let outcome = svc.generate(request).await.unwrap();
    assert_eq!(outcome.provider, ProviderId::Groq);

    // Both openrouter stages were skipped without counting as attempts
    let providers: Vec<ProviderId> = transport.calls().iter().map(|(p, _)| *p).collect();
    assert_eq!(providers, vec![ProviderId::OpenAi, ProviderId::Groq]);
}

#[tokio::test]
async fn unrecognized_provider_is_charged_the_default_cost() {
    let ledger = Arc::new(InMemoryCreditLedger::new(100));
    let transport = ScriptedTransport::new(Some(ProviderId::OpenRouter));
    let svc = service(
        registry_with_credentials(&ProviderId::ALL),
        ledger.clone(),
        transport.clone(),
    );

    let mut request = GenerationRequest::script("make a quiz".to_string(), "alice".to_string());
    request.provider = Some("mistral".to_string());

    let outcome = svc.generate(request).await.unwrap();
    assert_eq!(outcome.credits_used, 10);
    assert_eq!(ledger.balance("alice").await, Some(90));
    // Unrecognized preference adds no preferred stage
    assert_eq!(transport.calls()[0].0, ProviderId::OpenRouter);
}

#[tokio::test]
async fn scenario_a_economy_channel_drains_exact_balance() {
    let ledger = Arc::new(InMemoryCreditLedger::new(100));
    ledger.set_balance("student", 5);
    let transport = ScriptedTransport::new(Some(ProviderId::Groq));
    let svc = service(
        registry_with_credentials(&ProviderId::ALL),
        ledger.clone(),
        transport.clone(),
    );

    let mut request =
        GenerationRequest::curriculum("fractions for grade 5".to_string(), "student".to_string());
    request.provider = Some("groq".to_string());

    let outcome = svc.generate(request).await.unwrap();
    assert_eq!(outcome.content, "generated content");
    assert_eq!(outcome.credits_used, 5);
    assert_eq!(ledger.balance("student").await, Some(0));

    // Preferred groq attempt answered first with the canonical fast model
    let calls = transport.calls();
    assert_eq!(calls[0].0, ProviderId::Groq);
    assert_eq!(calls[0].1.model, "llama-3.3-70b-versatile");
}

#[tokio::test]
async fn scenario_b_cost_follows_requested_tier_not_answering_channel() {
    let ledger = Arc::new(InMemoryCreditLedger::new(100));
    let transport = ScriptedTransport::new(Some(ProviderId::OpenAi));
    // Premium channel requested but not configured; secondary answers
    let svc = service(
        registry_with_credentials(&[ProviderId::OpenAi, ProviderId::Groq]),
        ledger.clone(),
        transport.clone(),
    );

    let mut request =
        GenerationRequest::script("replicate this sketch".to_string(), "teacher".to_string());
    request.provider = Some("openrouter".to_string());
    request.image = Some(ImageAttachment {
        media_type: "image/png".to_string(),
        data: "aGVsbG8=".to_string(),
    });

    let outcome = svc.generate(request).await.unwrap();
    assert_eq!(outcome.provider, ProviderId::OpenAi);
    assert_eq!(outcome.credits_used, 15);
    assert_eq!(ledger.balance("teacher").await, Some(85));

    // The dispatched user message carries the ordered [text, image] parts
    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    let user_message = calls[0].1.messages.last().unwrap().clone();
    let MessageContent::Parts(parts) = user_message.content else {
        panic!("user message must be multimodal");
    };
    assert_eq!(parts.len(), 2);
    assert!(matches!(&parts[0], ContentPart::Text { text } if text == "replicate this sketch"));
    assert!(matches!(&parts[1], ContentPart::ImageUrl { image_url }
        if image_url.url == "data:image/png;base64,aGVsbG8="));
}

#[tokio::test]
async fn system_prompt_enhancer_tracks_the_attempted_provider() {
    let ledger = Arc::new(InMemoryCreditLedger::new(100));
    let transport = ScriptedTransport::new(Some(ProviderId::OpenAi));
    let svc = service(
        registry_with_credentials(&[ProviderId::OpenRouter, ProviderId::OpenAi]),
        ledger,
        transport.clone(),
    );

    let mut request =
        GenerationRequest::curriculum("teach algebra".to_string(), "alice".to_string());
    request.model = Some("anthropic/claude-3.5-sonnet".to_string());
    let _ = svc.generate(request).await.unwrap();

    let calls = transport.calls();
    assert_eq!(calls.len(), 3);

    let system_of = |req: &ChatCompletionRequest| -> String {
        match &req.messages[0].content {
            MessageContent::Text(text) => text.clone(),
            _ => panic!("system message must be plain text"),
        }
    };

    // Both openrouter attempts carry its enhancer; the openai attempt
    // carries the bare base prompt
    let openrouter_system = system_of(&calls[0].1);
    let openai_system = system_of(&calls[2].1);
    assert!(openrouter_system.contains("\n\n"));
    assert!(openrouter_system.starts_with(openai_system.as_str()));
    assert!(!openai_system.contains("\n\n"));
}

#[tokio::test]
async fn history_is_forwarded_verbatim_between_system_and_user_turns() {
    let ledger = Arc::new(InMemoryCreditLedger::new(100));
    let transport = ScriptedTransport::new(Some(ProviderId::OpenRouter));
    let svc = service(
        registry_with_credentials(&ProviderId::ALL),
        ledger,
        transport.clone(),
    );

    let mut request = GenerationRequest::script("refine it".to_string(), "alice".to_string());
    request.history = vec![
        edugen_gateway::provider::ChatMessage::user(MessageContent::Text("v1".to_string())),
        edugen_gateway::provider::ChatMessage {
            role: "assistant".to_string(),
            content: MessageContent::Text("draft".to_string()),
        },
    ];

    let _ = svc.generate(request).await.unwrap();

    let calls = transport.calls();
    let messages = &calls[0].1.messages;
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0].role, "system");
    assert!(matches!(&messages[1].content, MessageContent::Text(t) if t == "v1"));
    assert!(matches!(&messages[2].content, MessageContent::Text(t) if t == "draft"));
    assert!(matches!(&messages[3].content, MessageContent::Text(t) if t == "refine it"));
}
