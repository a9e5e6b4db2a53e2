//! Generation pipeline: prompts, credit metering, and the fallback cascade

pub mod cascade;
pub mod credits;
pub mod prompt;

pub use cascade::{Attempt, GenerationOutcome, GenerationRequest, GenerationService};
pub use credits::{CreditLedger, CreditTransaction, InMemoryCreditLedger};
pub use prompt::{assemble_messages, base_prompt, provider_enhancer, ImageAttachment, TaskKind};
