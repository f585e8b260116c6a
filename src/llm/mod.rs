//! # LLM Synthesis Client
//!
//! HTTP client for an OpenAI-compatible chat-completion API. The model is
//! asked for a project skeleton as a single JSON object; this module owns
//! request/retry handling, payload extraction (models love code fences),
//! and validation of the returned file tree.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::config::{GeneratorConfig, LlmConfig};
use crate::error::{StackforgeError, StackforgeResult};

/// A single file in a generated project skeleton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub path: String,
    pub content: String,
}

/// The project skeleton returned by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectTree {
    #[serde(default)]
    pub name: Option<String>,
    pub files: Vec<ProjectFile>,
}

impl ProjectTree {
    /// Parse a tree from raw model output.
    ///
    /// Tolerates surrounding prose and Markdown code fences by slicing to
    /// the outermost braces before deserializing.
    pub fn parse(raw: &str) -> StackforgeResult<Self> {
        let payload = extract_json_payload(raw).ok_or_else(|| {
            StackforgeError::LlmError("completion contained no JSON object".to_string())
        })?;

        serde_json::from_str(payload).map_err(|e| {
            StackforgeError::LlmError(format!("completion was not a valid file tree: {e}"))
        })
    }

    /// Validate the tree against the configured limits.
    ///
    /// Rejects empty trees, oversized trees, duplicate entries, and any path
    /// that is absolute or escapes the project root.
    pub fn validate(&self, limits: &GeneratorConfig) -> StackforgeResult<()> {
        if self.files.is_empty() {
            return Err(StackforgeError::ValidationError(
                "generated tree contains no files".to_string(),
            ));
        }
        if self.files.len() > limits.max_files {
            return Err(StackforgeError::ValidationError(format!(
                "generated tree has {} files, limit is {}",
                self.files.len(),
                limits.max_files
            )));
        }

        let mut seen = std::collections::HashSet::new();
        let mut total_bytes = 0usize;

        for file in &self.files {
            validate_path(&file.path, limits.max_path_bytes)?;
            if !seen.insert(file.path.as_str()) {
                return Err(StackforgeError::ValidationError(format!(
                    "duplicate path in generated tree: {}",
                    file.path
                )));
            }
            total_bytes += file.content.len();
        }

        if total_bytes > limits.max_total_bytes {
            return Err(StackforgeError::ValidationError(format!(
                "generated tree is {total_bytes} bytes, limit is {}",
                limits.max_total_bytes
            )));
        }

        Ok(())
    }
}

fn validate_path(path: &str, max_path_bytes: usize) -> StackforgeResult<()> {
    if path.is_empty() {
        return Err(StackforgeError::ValidationError(
            "generated tree contains an empty path".to_string(),
        ));
    }
    if path.len() > max_path_bytes {
        return Err(StackforgeError::ValidationError(format!(
            "path exceeds {max_path_bytes} bytes: {path}"
        )));
    }
    if path.starts_with('/') || path.contains('\\') || path.contains(':') {
        return Err(StackforgeError::ValidationError(format!(
            "path must be relative with forward slashes: {path}"
        )));
    }
    if path.split('/').any(|segment| segment == ".." || segment.is_empty()) {
        return Err(StackforgeError::ValidationError(format!(
            "path escapes the project root: {path}"
        )));
    }
    Ok(())
}

/// Slice raw model output down to the outermost JSON object.
fn extract_json_payload(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    (end >= start).then(|| &trimmed[start..=end])
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Client for the configured chat-completion endpoint.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .finish()
    }
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> StackforgeResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| StackforgeError::LlmError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Ask the model for a project skeleton and parse the reply.
    ///
    /// Transport failures and 429/5xx responses are retried up to the
    /// configured attempt budget; other 4xx responses fail immediately.
    pub async fn generate_project(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> StackforgeResult<ProjectTree> {
        let content = self.chat(system_prompt, user_prompt).await?;
        ProjectTree::parse(&content)
    }

    async fn chat(&self, system_prompt: &str, user_prompt: &str) -> StackforgeResult<String> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let body = json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_output_tokens,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
        });

        let mut last_error = String::new();

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff = Duration::from_millis(500 * u64::from(attempt));
                debug!(
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    "Retrying LLM request"
                );
                tokio::time::sleep(backoff).await;
            }

            let response = self
                .client
                .post(&url)
                .bearer_auth(self.config.resolved_api_key())
                .json(&body)
                .send()
                .await;

            match response {
                Ok(response) if response.status().is_success() => {
                    let completion: ChatCompletionResponse =
                        response.json().await.map_err(|e| {
                            StackforgeError::LlmError(format!(
                                "malformed completion response: {e}"
                            ))
                        })?;

                    return completion
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|choice| choice.message.content)
                        .filter(|content| !content.trim().is_empty())
                        .ok_or_else(|| {
                            StackforgeError::LlmError(
                                "completion contained no content".to_string(),
                            )
                        });
                }
                Ok(response) => {
                    let status = response.status();
                    let detail = response.text().await.unwrap_or_default();
                    let detail = detail.chars().take(300).collect::<String>();

                    if status.is_client_error() && status.as_u16() != 429 {
                        return Err(StackforgeError::LlmError(format!(
                            "provider rejected request ({status}): {detail}"
                        )));
                    }

                    warn!(%status, attempt, "LLM request failed, will retry if budget remains");
                    last_error = format!("provider returned {status}: {detail}");
                }
                Err(e) => {
                    warn!(error = %e, attempt, "LLM transport error, will retry if budget remains");
                    last_error = e.to_string();
                }
            }
        }

        Err(StackforgeError::LlmError(format!(
            "exhausted {} attempts: {last_error}",
            self.config.max_retries + 1
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> GeneratorConfig {
        GeneratorConfig::default()
    }

    fn tree(paths: &[&str]) -> ProjectTree {
        ProjectTree {
            name: Some("demo".to_string()),
            files: paths
                .iter()
                .map(|path| ProjectFile {
                    path: path.to_string(),
                    content: "x".to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_parse_strips_code_fences() {
        let raw =
            "Here you go:\n```json\n{\"files\": [{\"path\": \"a.txt\", \"content\": \"hi\"}]}\n```";
        let tree = ProjectTree::parse(raw).unwrap();
        assert_eq!(tree.files.len(), 1);
        assert_eq!(tree.files[0].path, "a.txt");
    }

    #[test]
    fn test_parse_plain_json_object() {
        let raw = "{\"name\": \"app\", \"files\": [{\"path\": \"b\", \"content\": \"\"}]}";
        let tree = ProjectTree::parse(raw).unwrap();
        assert_eq!(tree.name.as_deref(), Some("app"));
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(ProjectTree::parse("sorry, I cannot do that").is_err());
    }

    #[test]
    fn test_validate_accepts_conventional_tree() {
        assert!(tree(&["src/main.rs", "Cargo.toml", "README.md"])
            .validate(&limits())
            .is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_tree() {
        assert!(tree(&[]).validate(&limits()).is_err());
    }

    #[test]
    fn test_validate_rejects_traversal_and_absolute_paths() {
        assert!(tree(&["../escape.txt"]).validate(&limits()).is_err());
        assert!(tree(&["/etc/passwd"]).validate(&limits()).is_err());
        assert!(tree(&["a//b.txt"]).validate(&limits()).is_err());
        assert!(tree(&["c:\\windows.txt"]).validate(&limits()).is_err());
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        assert!(tree(&["a.txt", "a.txt"]).validate(&limits()).is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_tree() {
        let mut config = limits();
        config.max_total_bytes = 1;
        assert!(tree(&["a.txt", "b.txt"]).validate(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_too_many_files() {
        let mut config = limits();
        config.max_files = 2;
        assert!(tree(&["a", "b", "c"]).validate(&config).is_err());
    }
}
