//! The service layer: validate a query, ask the model, validate the answer.
//!
//! Each call is independent. Nothing is retried, cached or remembered
//! between calls, and a call in flight cannot be cancelled by the caller.

pub mod prompt;
pub mod schema;

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{ServiceError, ValidationError};
use crate::llm::LlmClient;

pub use schema::{ServiceInput, ServiceOutput};

/// Forwards validated queries to the configured model provider.
#[derive(Clone)]
pub struct ServiceLayer {
    llm: Arc<dyn LlmClient>,
}

impl ServiceLayer {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Provider description, e.g. `"gemini (gemini-2.0-flash)"`.
    pub fn llm_description(&self) -> String {
        self.llm.description()
    }

    /// Validates a candidate `{ "query": ... }` object, then processes it.
    pub async fn process_value(&self, candidate: &Value) -> Result<ServiceOutput, ServiceError> {
        let input = ServiceInput::from_value(candidate)?;
        self.process_query(input).await
    }

    /// Renders the prompt, calls the provider once, and returns the
    /// validated `{ response }`.
    ///
    /// Provider failures propagate as [`ServiceError::Provider`]; a reply
    /// that does not match the output schema is a [`ServiceError::Validation`]
    /// on the `response` field.
    pub async fn process_query(&self, input: ServiceInput) -> Result<ServiceOutput, ServiceError> {
        let prompt = prompt::render(&input);
        let schema = ServiceOutput::json_schema();

        debug!("Processing query ({} chars)", input.query().chars().count());

        let reply = self.llm.generate_structured(&prompt, &schema).await?;

        let text = reply.text.ok_or_else(|| {
            warn!("Provider returned no structured output");
            ValidationError::new("response", "provider returned no output")
        })?;

        let output = ServiceOutput::parse(&text).inspect_err(|e| {
            warn!("Provider output rejected: {e}");
        })?;

        info!(
            "Response: {} chars ({} tokens used)",
            output.response.chars().count(),
            reply.input_tokens + reply.output_tokens
        );

        Ok(output)
    }
}
