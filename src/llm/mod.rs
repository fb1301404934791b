pub mod client;
pub mod gemini;
pub mod ollama;

use std::sync::Arc;

use crate::config::LlmConfig;

pub use client::{LlmClient, StructuredReply};
pub use gemini::GeminiClient;
pub use ollama::OllamaClient;

/// Builds the client for the configured `[llm] provider`.
///
/// Unknown providers are rejected here so misconfiguration is caught
/// at startup.
pub fn build_client(config: &LlmConfig) -> anyhow::Result<Arc<dyn LlmClient>> {
    match config.provider.as_str() {
        "gemini" => {
            if config.api_key.is_empty() {
                anyhow::bail!("[llm] api_key is required for the gemini provider");
            }
            Ok(Arc::new(GeminiClient::new(config.clone())))
        }
        "ollama" => Ok(Arc::new(OllamaClient::new(config.clone()))),
        other => anyhow::bail!("Unsupported LLM provider: {other} (expected gemini or ollama)"),
    }
}
