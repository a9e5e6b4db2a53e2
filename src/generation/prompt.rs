//! Task system prompts, provider enhancers, and message assembly

use serde::{Deserialize, Serialize};

use crate::provider::{ChatMessage, ContentPart, ImageUrl, MessageContent, ProviderId};

/// Generation task type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Script,
    Curriculum,
}

const SCRIPT_BASE_PROMPT: &str = "You are an expert app-script author for an educational \
app builder. Generate complete, runnable scripts that implement exactly what the user \
describes. Respond with the script content only: no surrounding prose, no markdown \
fences, no explanations. Prefer clear, well-structured code with descriptive names, \
and keep every asset reference self-contained.";

const CURRICULUM_BASE_PROMPT: &str = "You are an expert curriculum designer. Produce a \
structured learning plan for the topic the user describes, organized into ordered units \
with clear objectives, activities, and assessment checkpoints. Keep the tone practical \
and age-appropriate, and scale the depth to the scope the user requests.";

const OPENROUTER_ENHANCER: &str = "You are routed through a general-purpose model \
gateway; the underlying model may vary. Keep your output strictly self-contained and \
avoid model-specific formatting quirks.";

const GEMINI_ENHANCER: &str = "Format your entire answer as plain text. Do not use \
markdown tables or nested bullet hierarchies; use simple numbered sections instead.";

const GROQ_ENHANCER: &str = "Favor concise output. Do not restate the request or add \
closing summaries; deliver the requested content directly.";

/// Base system prompt for a task
pub fn base_prompt(task: TaskKind) -> &'static str {
    match task {
        TaskKind::Script => SCRIPT_BASE_PROMPT,
        TaskKind::Curriculum => CURRICULUM_BASE_PROMPT,
    }
}

/// Provider-specific suffix for the system prompt, if one is defined.
///
/// Matched by the exact provider being attempted; providers outside the
/// three recognized variants get no suffix.
pub fn provider_enhancer(provider: ProviderId) -> Option<&'static str> {
    match provider {
        ProviderId::OpenRouter => Some(OPENROUTER_ENHANCER),
        ProviderId::Gemini => Some(GEMINI_ENHANCER),
        ProviderId::Groq => Some(GROQ_ENHANCER),
        ProviderId::OpenAi => None,
    }
}

/// Inline image payload attached to a script-generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageAttachment {
    /// MIME type, e.g. `image/png`
    pub media_type: String,
    /// Base64-encoded image bytes
    pub data: String,
}

impl ImageAttachment {
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// Build the ordered message list for one cascade attempt.
///
/// The system message goes first, history passes through verbatim, and the
/// new user turn goes last. Rebuilt per attempt because the enhancer depends
/// on the provider actually being tried.
pub fn assemble_messages(
    task: TaskKind,
    provider: ProviderId,
    history: &[ChatMessage],
    prompt: &str,
    image: Option<&ImageAttachment>,
) -> Vec<ChatMessage> {
    let system = match provider_enhancer(provider) {
        Some(enhancer) => format!("{}\n\n{}", base_prompt(task), enhancer),
        None => base_prompt(task).to_string(),
    };

    let user_content = match image {
        Some(attachment) => MessageContent::Parts(vec![
            ContentPart::Text {
                text: prompt.to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: attachment.to_data_url(),
                },
            },
        ]),
        None => MessageContent::Text(prompt.to_string()),
    };

    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system));
    messages.extend_from_slice(history);
    messages.push(ChatMessage::user(user_content));
    messages
}
