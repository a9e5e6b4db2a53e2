//! Provider catalogue and transport

pub mod registry;
pub mod transport;

pub use registry::{
    credit_cost, ProviderEntry, ProviderId, ProviderRegistry, UnknownProviderError,
    DEFAULT_CREDIT_COST,
};
pub use transport::{
    extract_completion, ChatChoice, ChatCompletionRequest, ChatCompletionResponse, ChatMessage,
    CompletionTransport, ContentPart, HttpTransport, ImageUrl, MessageContent, ResponseMessage,
    Usage,
};
