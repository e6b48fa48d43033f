//! Ollama reasoning client.
//!
//! Talks to a locally hosted model through Ollama's OpenAI-compatible
//! endpoint using [`async_openai`] for type-safe request/response handling.
//! The base URL and model are configuration; the same client serves any
//! OpenAI-compatible server.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
};

use hrdesk_core::reasoning::ReasoningClient;
use hrdesk_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, MessageRole, Usage,
};

/// Configuration for an OpenAI-compatible reasoning backend.
#[derive(Debug, Clone)]
pub struct ReasoningBackendConfig {
    pub provider_name: String,
    /// Ollama ignores the key but the client requires one.
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

/// Defaults for a local Ollama server.
pub fn ollama_defaults(base_url: &str, model: &str) -> ReasoningBackendConfig {
    ReasoningBackendConfig {
        provider_name: "ollama".to_string(),
        api_key: "ollama".to_string(),
        base_url: base_url.to_string(),
        model: model.to_string(),
    }
}

/// Reasoning client for any OpenAI-compatible endpoint, Ollama by default.
///
/// Does NOT derive Debug to avoid exposing internal client state, including
/// the API key, in logs.
pub struct OllamaReasoningClient {
    client: Client<OpenAIConfig>,
    provider_name: String,
    model: String,
}

impl OllamaReasoningClient {
    /// Create a client from an explicit backend configuration.
    pub fn new(config: ReasoningBackendConfig) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(&config.base_url);

        Self {
            client: Client::with_config(openai_config),
            provider_name: config.provider_name,
            model: config.model,
        }
    }

    /// Create a client for a local Ollama server.
    pub fn ollama(base_url: &str, model: &str) -> Self {
        Self::new(ollama_defaults(base_url, model))
    }

    /// Build a [`CreateChatCompletionRequest`] from a generic [`CompletionRequest`].
    fn build_request(&self, request: &CompletionRequest) -> CreateChatCompletionRequest {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::new();

        // System message
        if let Some(ref system) = request.system {
            messages.push(ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessage {
                    content: ChatCompletionRequestSystemMessageContent::Text(system.clone()),
                    name: None,
                },
            ));
        }

        // Conversation messages
        for msg in &request.messages {
            let oai_msg = match msg.role {
                MessageRole::System => ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessage {
                        content: ChatCompletionRequestSystemMessageContent::Text(
                            msg.content.clone(),
                        ),
                        name: None,
                    },
                ),
                MessageRole::User => ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessage {
                        content: ChatCompletionRequestUserMessageContent::Text(
                            msg.content.clone(),
                        ),
                        name: None,
                    },
                ),
                MessageRole::Assistant => {
                    #[allow(deprecated)]
                    ChatCompletionRequestMessage::Assistant(
                        ChatCompletionRequestAssistantMessage {
                            content: Some(ChatCompletionRequestAssistantMessageContent::Text(
                                msg.content.clone(),
                            )),
                            refusal: None,
                            name: None,
                            audio: None,
                            tool_calls: None,
                            function_call: None,
                        },
                    )
                }
            };
            messages.push(oai_msg);
        }

        // Use the model from the request if set, otherwise the config default
        let model = if request.model.is_empty() {
            self.model.clone()
        } else {
            request.model.clone()
        };

        CreateChatCompletionRequest {
            model,
            messages,
            max_completion_tokens: Some(request.max_tokens),
            temperature: request.temperature.map(|t| t as f32),
            ..Default::default()
        }
    }
}

impl ReasoningClient for OllamaReasoningClient {
    fn name(&self) -> &str {
        &self.provider_name
    }

    async fn generate(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let oai_request = self.build_request(request);

        let response = self
            .client
            .chat()
            .create(oai_request)
            .await
            .map_err(map_openai_error)?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        let usage = response
            .usage
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            content,
            model: response.model,
            usage,
        })
    }
}

/// Map async-openai errors onto the engine's error taxonomy.
fn map_openai_error(err: OpenAIError) -> LlmError {
    match err {
        OpenAIError::ApiError(api) => LlmError::Provider {
            message: api.message,
        },
        OpenAIError::JSONDeserialize(e, _) => LlmError::Deserialization(e.to_string()),
        OpenAIError::InvalidArgument(msg) => LlmError::InvalidRequest(msg),
        other => LlmError::Provider {
            message: other.to_string(),
        },
    }
}
