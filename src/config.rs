use anyhow::Context;
use serde::Deserialize;
use url::Url;

/// Default Gemini API base URL.
const DEFAULT_GEMINI_HOST: &str = "https://generativelanguage.googleapis.com";

/// Default Ollama API base URL.
const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub llm: LlmConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    /// "gemini" or "ollama"
    pub provider: String,
    pub model: String,
    /// Supports ${ENV_VAR} substitution
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens_per_request: u32,
    /// Base URL override, e.g. "http://myserver:11434"
    #[serde(default)]
    pub host: Option<String>,
}

fn default_max_tokens() -> u32 {
    1024
}

impl ServerConfig {
    /// Socket address string the HTTP server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl LlmConfig {
    /// Base URL of the provider API, without trailing slash.
    ///
    /// Falls back to the provider's public endpoint when `host` is unset.
    pub fn base_url(&self) -> String {
        let host = match &self.host {
            Some(host) => host.as_str(),
            None if self.provider == "ollama" => DEFAULT_OLLAMA_HOST,
            None => DEFAULT_GEMINI_HOST,
        };
        host.trim_end_matches('/').to_string()
    }
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {path}"))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        // Expand environment variables like ${GEMINI_API_KEY}
        let expanded = shellexpand::env(content)?;
        let config: Config = toml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.llm.model.trim().is_empty() {
            anyhow::bail!("[llm] model must not be empty");
        }
        if let Some(ref host) = self.llm.host {
            Url::parse(host).with_context(|| format!("invalid [llm] host: {host}"))?;
        }
        Ok(())
    }
}
