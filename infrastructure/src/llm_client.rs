use crate::config::{LlmConfig, Provider};
use anyhow::{anyhow, Context};
use domain::planner::{failed_plan, ActionPlanner};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::types::Result;
use std::time::Duration;

const SYSTEM_PROMPT: &str = r#"You are a computer control assistant for a Linux desktop.
Given a user request, respond ONLY with a JSON object describing the actions to take:
{
  "actions": [
    {"type": "command_line", "command": "terminal command", "description": "human readable description"},
    {"type": "gui_action", "action": "click|right_click|double_click|type|press|hotkey|scroll",
     "target": "description of target", "coordinates": [x, y], "text": "text, key name or key+combo",
     "description": "human readable description"},
    {"type": "file_operation", "action": "read|write|append|delete", "path": "file path",
     "content": "content if applicable", "description": "human readable description"}
  ],
  "reasoning": "short explanation for the user"
}
Rules:
1. Use real paths in the user's home directory (e.g. "~/Documents/notes.txt") or relative paths (e.g. "./notes.txt").
2. Never use placeholder paths such as /path/to/...
3. Prefer the current directory or the home directory when writing files.
4. Break complex requests into several sequential actions.
5. Output nothing outside the JSON object."#;

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

impl Message {
    fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f32,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: Message,
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message>,
    temperature: f32,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicBlock>,
}

#[derive(Deserialize)]
struct AnthropicBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    stream: bool,
    format: &'a str,
}

#[derive(Deserialize)]
struct OllamaResponse {
    message: Message,
    #[serde(default)]
    done: bool,
}

/// Asks the configured model provider for an action list.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
    api_key: Option<String>,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        let api_key = config.resolved_api_key();
        tracing::info!(provider = %config.provider, model = config.model(), "LLM client initialized");
        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    pub fn provider(&self) -> Provider {
        self.config.provider
    }

    async fn request_plan(&self, prompt: &str) -> Result<Value> {
        let text = match self.config.provider {
            Provider::OpenAi => self.call_openai(prompt).await?,
            Provider::Anthropic => self.call_anthropic(prompt).await?,
            Provider::Ollama => self.call_ollama(prompt).await?,
        };
        parse_plan(&text)
    }

    fn require_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| anyhow!("No API key configured for provider {}", self.config.provider))
    }

    async fn call_openai(&self, prompt: &str) -> Result<String> {
        let request = OpenAiRequest {
            model: self.config.model(),
            messages: vec![
                Message::new("system", SYSTEM_PROMPT),
                Message::new("user", prompt),
            ],
            temperature: self.config.temperature,
        };
        let response = self
            .client
            .post(self.config.api_url())
            .bearer_auth(self.require_key()?)
            .json(&request)
            .send()
            .await
            .context("Failed contacting OpenAI")?;
        let body = checked_body(response, "OpenAI").await?;
        openai_content(&body)
    }

    async fn call_anthropic(&self, prompt: &str) -> Result<String> {
        let request = AnthropicRequest {
            model: self.config.model(),
            max_tokens: self.config.max_tokens,
            system: SYSTEM_PROMPT,
            messages: vec![Message::new("user", prompt)],
            temperature: self.config.temperature,
        };
        let response = self
            .client
            .post(self.config.api_url())
            .header("x-api-key", self.require_key()?)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await
            .context("Failed contacting Anthropic")?;
        let body = checked_body(response, "Anthropic").await?;
        anthropic_content(&body)
    }

    async fn call_ollama(&self, prompt: &str) -> Result<String> {
        let request = OllamaRequest {
            model: self.config.model(),
            messages: vec![
                Message::new("system", SYSTEM_PROMPT),
                Message::new("user", prompt),
            ],
            stream: false,
            format: "json",
        };
        let mut builder = self.client.post(self.config.api_url()).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await.context("Failed contacting Ollama")?;
        let body = checked_body(response, "Ollama").await?;
        Ok(ollama_content(&body))
    }
}

impl ActionPlanner for LlmClient {
    async fn get_actions(&self, prompt: &str) -> Value {
        match self.request_plan(prompt).await {
            Ok(plan) => plan,
            Err(err) => {
                tracing::error!(error = %format!("{err:#}"), "error processing prompt");
                failed_plan(format!("{err:#}"))
            }
        }
    }
}

async fn checked_body(response: reqwest::Response, provider: &str) -> Result<String> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(anyhow!("{provider} API error ({status}): {}", body.trim()));
    }
    Ok(body)
}

fn openai_content(body: &str) -> Result<String> {
    let parsed: OpenAiResponse = serde_json::from_str(body).context("Unexpected OpenAI response")?;
    parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| anyhow!("OpenAI response contained no choices"))
}

fn anthropic_content(body: &str) -> Result<String> {
    let parsed: AnthropicResponse =
        serde_json::from_str(body).context("Unexpected Anthropic response")?;
    let text: String = parsed
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .map(|block| block.text)
        .collect();
    if text.is_empty() {
        return Err(anyhow!("Anthropic response contained no text"));
    }
    Ok(text)
}

/// Handles both a single JSON reply and NDJSON chunks.
fn ollama_content(body: &str) -> String {
    if let Ok(single) = serde_json::from_str::<OllamaResponse>(body) {
        return single.message.content;
    }
    let mut full_content = String::new();
    for line in body.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if let Ok(chunk) = serde_json::from_str::<OllamaResponse>(line) {
            full_content.push_str(&chunk.message.content);
            if chunk.done {
                break;
            }
        }
    }
    full_content
}

/// Turns model text into the action document, tolerating fences and chatter.
pub fn parse_plan(text: &str) -> Result<Value> {
    let plan = extract_last_json(text)
        .and_then(|json| serde_json::from_str::<Value>(json).ok())
        .filter(Value::is_object);
    match plan {
        Some(plan) => Ok(plan),
        None => {
            tracing::error!(response = text, "failed to parse JSON from LLM response");
            Err(anyhow!("Could not parse LLM response"))
        }
    }
}

/// Last balanced top-level `{...}` in `raw`, ignoring braces inside strings.
fn extract_last_json(raw: &str) -> Option<&str> {
    let bytes = raw.as_bytes();
    let mut depth = 0usize;
    let mut start = None;
    let mut last = None;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escape_next {
                escape_next = false;
            } else if b == b'\\' {
                escape_next = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' if depth > 0 => in_string = true,
            b'{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            b'}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start {
                        last = Some(&raw[s..=i]);
                    }
                }
            }
            _ => {}
        }
    }
    last
}
