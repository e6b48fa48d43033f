//! Reasoning client seam.
//!
//! The reasoning model is an external collaborator: the engine sends an
//! assembled prompt and receives generated text whole. The call has no side
//! effects, so bounded retries are safe. Implementations live in
//! `hrdesk-infra`.

use hrdesk_types::llm::{CompletionRequest, CompletionResponse, LlmError, Message, MessageRole};
use hrdesk_types::prompt::{BlockKind, Prompt};

/// Trait for the generative model backend.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait ReasoningClient: Send + Sync {
    /// Human-readable backend name (e.g., "ollama").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn generate(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}

/// Map an assembled prompt onto a completion request.
///
/// System blocks become the system string; grounding, history, and query
/// blocks render into a single user message, preserving block order.
pub fn completion_request_from_prompt(
    prompt: &Prompt,
    model: &str,
    max_tokens: u32,
    temperature: f64,
) -> CompletionRequest {
    let system = prompt.text_of(BlockKind::System);

    CompletionRequest {
        model: model.to_string(),
        messages: vec![Message {
            role: MessageRole::User,
            content: prompt.render_body(),
        }],
        system: if system.is_empty() { None } else { Some(system) },
        max_tokens,
        temperature: Some(temperature),
    }
}
