use crate::config::LlmConfig;
use crate::error::AiError;
use crate::planner::Translator;
use crate::types::{RiskLevel, Suggestion};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;

const SYSTEM_PROMPT: &str = r#"You are a shell command expert. Convert the user's request into one or more POSIX shell commands.

Respond with ONLY a JSON array, no other text. Each element must be an object:
{"command": "the exact shell command", "description": "what it does, in one sentence", "risk": "low" | "medium" | "high"}

Risk guidance:
- low: read-only or trivially reversible (ls, cat, pwd, git status, creating empty files or directories)
- medium: modifies files, installs software, or changes repository history (rm of single files, git commit, git push, npm install)
- high: destructive or hard to undo (rm -rf, overwriting disks, recursive permission changes, force pushes)

Offer alternatives when there is more than one sensible command, best option first.
Use paths relative to the current directory."#;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    code: Option<String>,
}

/// Client for an OpenAI-compatible chat completions endpoint.
pub struct OpenAiClient {
    endpoint: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig, api_key: Option<String>) -> Self {
        Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            api_key,
            client: reqwest::blocking::Client::new(),
        }
    }

    fn complete(&self, api_key: &str, instruction: &str) -> Result<String, AiError> {
        let cwd = env::current_dir()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|_| ".".to_string());

        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("Current directory: {cwd}\n\nRequest: {instruction}"),
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let url = format!("{}/chat/completions", self.endpoint);
        tracing::debug!(model = %self.model, %url, "requesting completion");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(classify_api_error(status.as_u16(), &text));
        }

        let parsed: ChatResponse = resp.json()?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(AiError::NoResponse)
    }
}

impl Translator for OpenAiClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn convert_to_commands(&self, instruction: &str) -> Result<Vec<Suggestion>, AiError> {
        let api_key = self.api_key.as_deref().ok_or(AiError::NotConfigured)?;
        let content = self.complete(api_key, instruction)?;
        parse_commands(&content)
    }
}

/// Maps an error response to the matching error kind. Quota and credential
/// problems get their own kinds; everything else keeps the service message.
/// The service's error code wins; the status is only consulted without one.
fn classify_api_error(status: u16, body: &str) -> AiError {
    let detail = serde_json::from_str::<ErrorEnvelope>(body).ok().map(|e| e.error);
    let code = detail.as_ref().and_then(|d| d.code.clone());

    match (code.as_deref(), status) {
        (Some("insufficient_quota"), _) | (None, 429) => AiError::QuotaExceeded,
        (Some("invalid_api_key"), _) | (None, 401) => AiError::InvalidCredential,
        _ => {
            let message = detail
                .and_then(|d| d.message)
                .unwrap_or_else(|| body.trim().to_string());
            AiError::Request(format!("HTTP {status}: {message}"))
        }
    }
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the language tag line, e.g. ```json
    let rest = rest.split_once('\n').map_or(rest, |(_, body)| body);
    rest.trim_end().trim_end_matches("```").trim()
}

fn required_text<'a>(
    item: &'a Value,
    field: &'static str,
    index: usize,
) -> Result<&'a str, AiError> {
    item.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(AiError::InvalidStructure { index, field })
}

/// Parses the model reply into suggestions. Unknown risk tags become medium.
pub fn parse_commands(content: &str) -> Result<Vec<Suggestion>, AiError> {
    let json = strip_code_fence(content);
    let parsed: Value =
        serde_json::from_str(json).map_err(|e| AiError::InvalidJson(e.to_string()))?;

    let Value::Array(items) = parsed else {
        return Err(AiError::InvalidFormat);
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let command = required_text(item, "command", index)?;
            let description = required_text(item, "description", index)?;
            let risk = item
                .get("risk")
                .ok_or(AiError::InvalidStructure {
                    index,
                    field: "risk",
                })?
                .as_str()
                .and_then(RiskLevel::parse)
                .unwrap_or(RiskLevel::Medium);
            Ok(Suggestion::new(command, description, risk))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_array() {
        let reply = r#"[
            {"command": "ls -la", "description": "List files", "risk": "low"},
            {"command": "rm -rf build", "description": "Remove build output", "risk": "high"}
        ]"#;
        let out = parse_commands(reply).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], Suggestion::new("ls -la", "List files", RiskLevel::Low));
        assert_eq!(out[1].risk, RiskLevel::High);
    }

    #[test]
    fn unknown_risk_becomes_medium() {
        let reply = r#"[
            {"command": "a", "description": "x", "risk": "catastrophic"},
            {"command": "b", "description": "y", "risk": 3},
            {"command": "c", "description": "z", "risk": null}
        ]"#;
        let out = parse_commands(reply).unwrap();
        assert!(out.iter().all(|s| s.risk == RiskLevel::Medium));
    }

    #[test]
    fn unwraps_markdown_fence() {
        let reply = "```json\n[{\"command\": \"pwd\", \"description\": \"Where\", \"risk\": \"low\"}]\n```";
        let out = parse_commands(reply).unwrap();
        assert_eq!(out[0].command, "pwd");
    }

    #[test]
    fn empty_array_is_valid() {
        assert!(parse_commands("[]").unwrap().is_empty());
    }

    #[test]
    fn rejects_non_json() {
        assert!(matches!(
            parse_commands("Sure! Here is the command: ls"),
            Err(AiError::InvalidJson(_))
        ));
    }

    #[test]
    fn rejects_non_array() {
        assert!(matches!(
            parse_commands(r#"{"command": "ls"}"#),
            Err(AiError::InvalidFormat)
        ));
    }

    #[test]
    fn rejects_missing_fields() {
        let missing_risk = r#"[{"command": "ls", "description": "List"}]"#;
        assert!(matches!(
            parse_commands(missing_risk),
            Err(AiError::InvalidStructure { index: 0, field: "risk" })
        ));

        let missing_description = r#"[
            {"command": "ls", "description": "List", "risk": "low"},
            {"command": "pwd", "risk": "low"}
        ]"#;
        assert!(matches!(
            parse_commands(missing_description),
            Err(AiError::InvalidStructure { index: 1, field: "description" })
        ));

        let blank_command = r#"[{"command": "  ", "description": "Nothing", "risk": "low"}]"#;
        assert!(matches!(
            parse_commands(blank_command),
            Err(AiError::InvalidStructure { index: 0, field: "command" })
        ));
    }

    #[test]
    fn classifies_service_errors() {
        let quota = r#"{"error": {"message": "You exceeded your current quota", "code": "insufficient_quota"}}"#;
        assert!(matches!(classify_api_error(429, quota), AiError::QuotaExceeded));

        let bad_key = r#"{"error": {"message": "Incorrect API key provided", "code": "invalid_api_key"}}"#;
        assert!(matches!(classify_api_error(401, bad_key), AiError::InvalidCredential));
        assert!(matches!(classify_api_error(401, ""), AiError::InvalidCredential));

        let rate_limited = r#"{"error": {"message": "Rate limit reached", "code": "rate_limit_exceeded"}}"#;
        match classify_api_error(429, rate_limited) {
            AiError::Request(msg) => assert!(msg.contains("Rate limit reached")),
            e => panic!("unexpected error: {e}"),
        }
        assert!(matches!(classify_api_error(429, ""), AiError::QuotaExceeded));

        let other = r#"{"error": {"message": "The model does not exist", "code": "model_not_found"}}"#;
        match classify_api_error(404, other) {
            AiError::Request(msg) => {
                assert!(msg.contains("404"));
                assert!(msg.contains("The model does not exist"));
            }
            e => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn unconfigured_client_fails_without_network() {
        let client = OpenAiClient::new(&LlmConfig::default(), None);
        assert!(!client.is_configured());
        assert!(matches!(
            client.convert_to_commands("list files"),
            Err(AiError::NotConfigured)
        ));
    }

    mod http {
        use super::*;
        use mockito::{Matcher, Server, ServerGuard};
        use serde_json::json;

        fn client_for(server: &ServerGuard) -> OpenAiClient {
            let config = LlmConfig {
                endpoint: server.url(),
                model: "test-model".to_string(),
                max_tokens: 123,
                temperature: 0.5,
                ..LlmConfig::default()
            };
            OpenAiClient::new(&config, Some("sk-test".to_string()))
        }

        fn completion(content: Value) -> String {
            json!({"choices": [{"message": {"role": "assistant", "content": content}}]}).to_string()
        }

        #[test]
        fn sends_prompt_and_settings_and_parses_reply() {
            let mut server = Server::new();
            let reply = json!([{"command": "ls -la", "description": "List files", "risk": "low"}]);
            let mock = server
                .mock("POST", "/chat/completions")
                .match_header("authorization", "Bearer sk-test")
                .match_body(Matcher::AllOf(vec![
                    Matcher::PartialJson(json!({
                        "model": "test-model",
                        "max_tokens": 123,
                        "temperature": 0.5
                    })),
                    Matcher::Regex(
                        r#""role":"system","content":"You are a shell command expert"#.to_string(),
                    ),
                    Matcher::Regex(
                        r#""role":"user","content":"Current directory: [^"]*Request: list files""#
                            .to_string(),
                    ),
                ]))
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(completion(Value::String(reply.to_string())))
                .create();

            let out = client_for(&server).convert_to_commands("list files").unwrap();

            mock.assert();
            assert_eq!(out, vec![Suggestion::new("ls -la", "List files", RiskLevel::Low)]);
        }

        #[test]
        fn missing_or_blank_content_is_no_response() {
            for body in [
                json!({"choices": []}).to_string(),
                json!({}).to_string(),
                completion(json!("   ")),
                completion(Value::Null),
            ] {
                let mut server = Server::new();
                let _mock = server
                    .mock("POST", "/chat/completions")
                    .with_status(200)
                    .with_header("content-type", "application/json")
                    .with_body(body.as_str())
                    .create();

                let result = client_for(&server).convert_to_commands("list files");
                assert!(matches!(result, Err(AiError::NoResponse)), "{body}");
            }
        }

        #[test]
        fn malformed_content_is_reported() {
            let mut server = Server::new();
            let _mock = server
                .mock("POST", "/chat/completions")
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(completion(json!("ls -la")))
                .create();

            let result = client_for(&server).convert_to_commands("list files");
            assert!(matches!(result, Err(AiError::InvalidJson(_))));
        }

        #[test]
        fn error_statuses_are_classified() {
            let mut server = Server::new();
            let _mock = server
                .mock("POST", "/chat/completions")
                .with_status(401)
                .with_header("content-type", "application/json")
                .with_body(r#"{"error": {"message": "Incorrect API key", "code": "invalid_api_key"}}"#)
                .create();
            let result = client_for(&server).convert_to_commands("list files");
            assert!(matches!(result, Err(AiError::InvalidCredential)));

            let mut server = Server::new();
            let _mock = server
                .mock("POST", "/chat/completions")
                .with_status(500)
                .with_body("upstream down")
                .create();
            match client_for(&server).convert_to_commands("list files") {
                Err(AiError::Request(msg)) => {
                    assert!(msg.contains("500"));
                    assert!(msg.contains("upstream down"));
                }
                other => panic!("unexpected result: {other:?}"),
            }
        }
    }
}
