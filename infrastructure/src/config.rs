//! Startup configuration: a JSON file, optionally overridden by environment
//! variables (a `.env` file is honored).

use anyhow::{anyhow, Context};
use domain::safety_policy::SafetyPolicy;
use serde::Deserialize;
use shared::types::Result;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub llm: LlmConfig,
    #[serde(default)]
    pub safety: SafetyConfig,
    #[serde(default)]
    pub automation: AutomationConfig,
    /// `null` disables the log file.
    #[serde(default = "default_log_file")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Anthropic,
    #[serde(alias = "local")]
    Ollama,
}

impl Provider {
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-4",
            Provider::Anthropic => "claude-3-5-sonnet-latest",
            Provider::Ollama => "qwen2.5-coder:7b",
        }
    }

    pub fn default_api_url(&self) -> &'static str {
        match self {
            Provider::OpenAi => "https://api.openai.com/v1/chat/completions",
            Provider::Anthropic => "https://api.anthropic.com/v1/messages",
            Provider::Ollama => "http://localhost:11434/api/chat",
        }
    }

    /// Environment variable consulted when no key is configured.
    pub fn default_api_key_env(&self) -> Option<&'static str> {
        match self {
            Provider::OpenAi => Some("OPENAI_API_KEY"),
            Provider::Anthropic => Some("ANTHROPIC_API_KEY"),
            Provider::Ollama => None,
        }
    }
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "anthropic" => Ok(Provider::Anthropic),
            "ollama" | "local" => Ok(Provider::Ollama),
            other => Err(anyhow!("Unsupported LLM provider: {other}")),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Ollama => "ollama",
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: Provider,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

impl LlmConfig {
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    pub fn api_url(&self) -> &str {
        self.api_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_api_url())
    }

    /// Configured key, else the key found in the provider's env variable.
    pub fn resolved_api_key(&self) -> Option<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.is_empty()) {
            return Some(key.clone());
        }
        let var = self
            .api_key_env
            .as_deref()
            .or_else(|| self.provider.default_api_key_env())?;
        std::env::var(var).ok().filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SafetyConfig {
    /// Replaces the built-in restricted set when present.
    #[serde(default)]
    pub restricted_paths: Option<Vec<PathBuf>>,
}

impl SafetyConfig {
    pub fn policy(&self) -> SafetyPolicy {
        match &self.restricted_paths {
            Some(paths) => SafetyPolicy::with_restricted_paths(paths),
            None => SafetyPolicy::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    pub output_dir: PathBuf,
    /// 0 waits forever.
    pub shell_timeout_secs: u64,
    pub gui_pause_ms: u64,
    pub gui_timeout_secs: u64,
    pub failsafe: bool,
}

impl AutomationConfig {
    pub fn shell_timeout(&self) -> Option<Duration> {
        (self.shell_timeout_secs > 0).then(|| Duration::from_secs(self.shell_timeout_secs))
    }

    pub fn gui_pause(&self) -> Duration {
        Duration::from_millis(self.gui_pause_ms)
    }

    pub fn gui_timeout(&self) -> Duration {
        Duration::from_secs(self.gui_timeout_secs.max(1))
    }
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("mcp_output"),
            shell_timeout_secs: 120,
            gui_pause_ms: 500,
            gui_timeout_secs: 10,
            failsafe: true,
        }
    }
}

fn default_provider() -> Provider {
    Provider::OpenAi
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_llm_timeout() -> u64 {
    60
}

fn default_log_file() -> Option<PathBuf> {
    Some(PathBuf::from("mcp.log"))
}

impl AppConfig {
    /// Reads the config file and applies `MCP_LLM_*` environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        dotenvy::dotenv().ok();

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
        let mut config = Self::from_json(&text)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(provider) = lookup("MCP_LLM_PROVIDER") {
            self.llm.provider = provider.parse()?;
        }
        if let Some(model) = lookup("MCP_LLM_MODEL") {
            self.llm.model = Some(model);
        }
        if let Some(url) = lookup("MCP_LLM_API_URL") {
            self.llm.api_url = Some(url);
        }
        if let Some(key) = lookup("MCP_LLM_API_KEY") {
            self.llm.api_key = Some(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = AppConfig::from_json(r#"{"llm": {"provider": "openai"}}"#).unwrap();
        assert_eq!(config.llm.provider, Provider::OpenAi);
        assert_eq!(config.llm.model(), "gpt-4");
        assert_eq!(config.llm.api_url(), "https://api.openai.com/v1/chat/completions");
        assert_eq!(config.llm.temperature, 0.2);
        assert_eq!(config.automation.output_dir, PathBuf::from("mcp_output"));
        assert_eq!(config.automation.shell_timeout(), Some(Duration::from_secs(120)));
        assert!(config.automation.failsafe);
        assert!(config.safety.restricted_paths.is_none());
        assert_eq!(config.log_file, Some(PathBuf::from("mcp.log")));
    }

    #[test]
    fn full_config_is_read() {
        let config = AppConfig::from_json(
            r#"{
                "llm": {"provider": "ollama", "model": "llama3", "api_url": "http://gpu:11434/api/chat"},
                "safety": {"restricted_paths": ["/srv/secret"]},
                "automation": {"shell_timeout_secs": 0, "gui_pause_ms": 50, "failsafe": false},
                "log_file": null
            }"#,
        )
        .unwrap();
        assert_eq!(config.llm.provider, Provider::Ollama);
        assert_eq!(config.llm.model(), "llama3");
        assert_eq!(config.automation.shell_timeout(), None);
        assert_eq!(config.automation.gui_pause(), Duration::from_millis(50));
        assert_eq!(config.automation.gui_timeout(), Duration::from_secs(10));
        assert!(!config.automation.failsafe);
        assert_eq!(config.log_file, None);

        let policy = config.safety.policy();
        assert!(!policy.is_path_safe(Path::new("/srv/secret/key")));
        assert!(policy.is_path_safe(Path::new("/etc/shadow")));
    }

    #[test]
    fn unsupported_provider_is_rejected() {
        assert!(AppConfig::from_json(r#"{"llm": {"provider": "mystery"}}"#).is_err());
        assert!("mystery".parse::<Provider>().is_err());
        assert_eq!("LOCAL".parse::<Provider>().unwrap(), Provider::Ollama);
    }

    #[test]
    fn env_overrides_win() {
        let mut config = AppConfig::from_json(r#"{"llm": {"provider": "openai", "model": "gpt-4"}}"#).unwrap();
        let env: HashMap<&str, &str> = HashMap::from([
            ("MCP_LLM_PROVIDER", "anthropic"),
            ("MCP_LLM_MODEL", "claude-x"),
            ("MCP_LLM_API_KEY", "sk-test"),
        ]);
        config
            .apply_overrides(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.llm.provider, Provider::Anthropic);
        assert_eq!(config.llm.model(), "claude-x");
        assert_eq!(config.llm.resolved_api_key().as_deref(), Some("sk-test"));
        assert_eq!(config.llm.api_url(), "https://api.anthropic.com/v1/messages");
    }
}
