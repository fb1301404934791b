//! `LlmClient` trait — abstraction over LLM backends.
//!
//! Providers (Gemini, Ollama, …) implement this trait so the service
//! layer can be configured to use any supported backend via the
//! `[llm] provider` config field.

use async_trait::async_trait;

use crate::error::ProviderError;

/// Raw structured reply from a provider, before schema validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredReply {
    /// JSON text produced by the model, if it produced any.
    pub text: Option<String>,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Abstraction over LLM backends (Gemini, Ollama, etc.).
///
/// Each provider translates the prompt and the expected output schema
/// into its own wire format and returns the model's JSON text untouched.
/// Validating that text is the caller's job.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Sends a single prompt and asks for output conforming to `schema`
    /// (a JSON Schema object).
    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
    ) -> Result<StructuredReply, ProviderError>;

    /// Human-readable description of the provider and model.
    ///
    /// Used in status output, e.g. `"gemini (gemini-2.0-flash)"`.
    fn description(&self) -> String;
}
