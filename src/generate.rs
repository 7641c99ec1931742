use async_trait::async_trait;
use log::{debug, warn};
use reqwest::StatusCode;
use thiserror::Error;

/// Leading marker of a failure message in the string contract
pub const SENTINEL: &str = "⚠️";

pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";

/// Tried when the configured Gemini model is not found
const GEMINI_FALLBACK_MODEL: &str = "gemini-pro";

/// Evidence beyond this many characters is cut before sending
const MAX_EVIDENCE_CHARS: usize = 30_000;
const TRUNCATION_NOTE: &str = "... (transcript truncated)";

/// Why a generation failed. The `Display` form starts with [`SENTINEL`], which
/// is what the user sees; [`into_raw`] and [`classify`] convert between this
/// and the plain string contract.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("⚠️ No transcript available for this video. The video may not have captions.")]
    NoEvidence,

    #[error("⚠️ Missing API key. Set {0} in the environment.")]
    MissingCredential(String),

    #[error("⚠️ Unexpected response format from {0} API.")]
    UnexpectedResponse(String),

    #[error("⚠️ API Error (HTTP {status}): {message}")]
    Http { status: u16, message: String },

    #[error("⚠️ Error with {provider} API: {message}")]
    Transport { provider: String, message: String },

    /// A failure that arrived already in sentinel form
    #[error("{0}")]
    Reported(String),
}

/// Boundary to the language model
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate text from an instruction template, the transcript evidence and
    /// optional extra context (for example the video URL).
    async fn generate(&self, prompt: &str, evidence: &str, extra: &str) -> Result<String, GenerationError>;
}

/// String contract: content on success, sentinel-prefixed message on failure
pub fn into_raw(result: Result<String, GenerationError>) -> String {
    match result {
        Ok(text) => text,
        Err(e) => e.to_string(),
    }
}

/// Inverse of [`into_raw`] for strings that came from outside the crate
pub fn classify(raw: String) -> Result<String, GenerationError> {
    if raw.trim_start().starts_with(SENTINEL) {
        Err(GenerationError::Reported(raw))
    } else {
        Ok(raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Provider {
    Gemini,
    Anthropic,
    OpenAi,
}

impl Provider {
    fn for_model(model: &str) -> Self {
        if model.starts_with("claude") {
            Provider::Anthropic
        } else if ["gpt", "o1", "o3", "o4"].iter().any(|p| model.starts_with(p)) {
            Provider::OpenAi
        } else {
            Provider::Gemini
        }
    }

    fn name(self) -> &'static str {
        match self {
            Provider::Gemini => "Gemini",
            Provider::Anthropic => "Anthropic",
            Provider::OpenAi => "OpenAI",
        }
    }

    fn env_key(self) -> &'static str {
        match self {
            Provider::Gemini => "GOOGLE_GEMINI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
        }
    }
}

/// HTTP client for Gemini, Anthropic and OpenAI models, chosen by model name
pub struct LlmClient {
    client: reqwest::Client,
    model: String,
}

impl LlmClient {
    pub fn new(client: reqwest::Client, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    async fn generate_gemini(&self, api_key: &str, full_prompt: &str) -> Result<String, GenerationError> {
        let body = serde_json::json!({
            "contents": [{
                "parts": [{"text": full_prompt}]
            }]
        });

        let mut resp = self.post_gemini(&self.model, api_key, &body).await?;
        if resp.status() == StatusCode::NOT_FOUND && self.model != GEMINI_FALLBACK_MODEL {
            warn!("Gemini model {} not found, retrying with {GEMINI_FALLBACK_MODEL}", self.model);
            resp = self.post_gemini(GEMINI_FALLBACK_MODEL, api_key, &body).await?;
        }

        let json = read_json(resp, Provider::Gemini).await?;
        extract_gemini_text(&json).ok_or_else(|| unexpected(Provider::Gemini))
    }

    async fn post_gemini(
        &self,
        model: &str,
        api_key: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, GenerationError> {
        let url = format!("https://generativelanguage.googleapis.com/v1/models/{model}:generateContent");
        debug!("Generating via Gemini API with model {model}");

        self.client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| transport(Provider::Gemini, e))
    }

    async fn generate_anthropic(&self, api_key: &str, full_prompt: &str) -> Result<String, GenerationError> {
        debug!("Generating via Anthropic API with model {}", self.model);

        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": 4096,
            "messages": [
                {
                    "role": "user",
                    "content": full_prompt
                }
            ]
        });

        let resp = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| transport(Provider::Anthropic, e))?;

        let json = read_json(resp, Provider::Anthropic).await?;
        extract_anthropic_text(&json).ok_or_else(|| unexpected(Provider::Anthropic))
    }

    async fn generate_openai(&self, api_key: &str, full_prompt: &str) -> Result<String, GenerationError> {
        debug!("Generating via OpenAI API with model {}", self.model);

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {
                    "role": "user",
                    "content": full_prompt
                }
            ]
        });

        let resp = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| transport(Provider::OpenAi, e))?;

        let json = read_json(resp, Provider::OpenAi).await?;
        extract_openai_text(&json).ok_or_else(|| unexpected(Provider::OpenAi))
    }
}

#[async_trait]
impl Generator for LlmClient {
    async fn generate(&self, prompt: &str, evidence: &str, extra: &str) -> Result<String, GenerationError> {
        if evidence.trim().is_empty() {
            return Err(GenerationError::NoEvidence);
        }

        let provider = Provider::for_model(&self.model);
        let api_key = std::env::var(provider.env_key())
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| GenerationError::MissingCredential(provider.env_key().to_string()))?;

        let full_prompt = build_prompt(prompt, evidence, extra);
        let text = match provider {
            Provider::Gemini => self.generate_gemini(&api_key, &full_prompt).await?,
            Provider::Anthropic => self.generate_anthropic(&api_key, &full_prompt).await?,
            Provider::OpenAi => self.generate_openai(&api_key, &full_prompt).await?,
        };
        // a reply opening with the sentinel is a failure, not content
        classify(text)
    }
}

fn build_prompt(prompt: &str, evidence: &str, extra: &str) -> String {
    let evidence = truncate_evidence(evidence);
    format!("{prompt}\n\n{extra}\n\nVideo Transcript: {evidence}")
}

fn truncate_evidence(evidence: &str) -> String {
    if evidence.chars().count() > MAX_EVIDENCE_CHARS {
        let cut: String = evidence.chars().take(MAX_EVIDENCE_CHARS).collect();
        format!("{cut}{TRUNCATION_NOTE}")
    } else {
        evidence.to_string()
    }
}

fn transport(provider: Provider, e: reqwest::Error) -> GenerationError {
    GenerationError::Transport {
        provider: provider.name().to_string(),
        message: e.to_string(),
    }
}

fn unexpected(provider: Provider) -> GenerationError {
    GenerationError::UnexpectedResponse(provider.name().to_string())
}

async fn read_json(resp: reqwest::Response, provider: Provider) -> Result<serde_json::Value, GenerationError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(http_error(status, &body));
    }
    resp.json().await.map_err(|_| unexpected(provider))
}

/// Prefer the provider's `error.message`, else the raw body, else the status reason
fn http_error(status: StatusCode, body: &str) -> GenerationError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            json.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

    GenerationError::Http {
        status: status.as_u16(),
        message,
    }
}

fn extract_gemini_text(json: &serde_json::Value) -> Option<String> {
    let parts = json
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let texts: Vec<&str> = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
        .collect();
    (!texts.is_empty()).then(|| texts.join("\n"))
}

fn extract_anthropic_text(json: &serde_json::Value) -> Option<String> {
    let content = json.get("content")?.as_array()?;
    let text: String = content
        .iter()
        .filter_map(|block| {
            if block.get("type")?.as_str()? == "text" {
                block.get("text")?.as_str().map(|s| s.to_string())
            } else {
                None
            }
        })
        .collect::<Vec<_>>()
        .join("");
    (!text.is_empty()).then_some(text)
}

fn extract_openai_text(json: &serde_json::Value) -> Option<String> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
        .map(|t| t.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_for_model() {
        assert_eq!(Provider::for_model("claude-sonnet-4-6"), Provider::Anthropic);
        assert_eq!(Provider::for_model("gpt-4o-mini"), Provider::OpenAi);
        assert_eq!(Provider::for_model("o3-mini"), Provider::OpenAi);
        assert_eq!(Provider::for_model("gemini-1.5-pro"), Provider::Gemini);
        assert_eq!(Provider::for_model("something-else"), Provider::Gemini);
    }

    #[test]
    fn test_errors_carry_sentinel() {
        let errors = [
            GenerationError::NoEvidence,
            GenerationError::MissingCredential("GOOGLE_GEMINI_API_KEY".to_string()),
            GenerationError::UnexpectedResponse("Gemini".to_string()),
            GenerationError::Http {
                status: 429,
                message: "quota".to_string(),
            },
        ];
        for e in errors {
            assert!(e.to_string().starts_with(SENTINEL), "{e}");
        }
    }

    #[test]
    fn test_into_raw_and_classify() {
        assert_eq!(into_raw(Ok("summary".to_string())), "summary");

        let raw = into_raw(Err(GenerationError::Http {
            status: 500,
            message: "boom".to_string(),
        }));
        assert_eq!(raw, "⚠️ API Error (HTTP 500): boom");

        let err = classify(raw.clone()).unwrap_err();
        assert_eq!(err.to_string(), raw);
        assert_eq!(classify("fine".to_string()).unwrap(), "fine");
    }

    #[test]
    fn test_http_error_message() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid"}}"#;
        assert_eq!(
            http_error(StatusCode::BAD_REQUEST, body).to_string(),
            "⚠️ API Error (HTTP 400): API key not valid"
        );
        assert_eq!(
            http_error(StatusCode::BAD_GATEWAY, "").to_string(),
            "⚠️ API Error (HTTP 502): Bad Gateway"
        );
        assert_eq!(
            http_error(StatusCode::BAD_GATEWAY, "upstream down").to_string(),
            "⚠️ API Error (HTTP 502): upstream down"
        );
    }

    #[test]
    fn test_build_prompt() {
        let prompt = build_prompt("Summarize.", "words", "https://youtu.be/x");
        assert_eq!(prompt, "Summarize.\n\nhttps://youtu.be/x\n\nVideo Transcript: words");
    }

    #[test]
    fn test_truncate_evidence() {
        let long = "é".repeat(MAX_EVIDENCE_CHARS + 5);
        let cut = truncate_evidence(&long);
        assert!(cut.ends_with(TRUNCATION_NOTE));
        assert_eq!(cut.chars().count(), MAX_EVIDENCE_CHARS + TRUNCATION_NOTE.chars().count());
        assert_eq!(truncate_evidence("short"), "short");
    }

    #[tokio::test]
    async fn test_empty_evidence_short_circuits() {
        let client = LlmClient::new(reqwest::Client::new(), DEFAULT_MODEL);
        let err = client.generate("prompt", "  ", "").await.unwrap_err();
        assert!(matches!(err, GenerationError::NoEvidence));
    }

    #[test]
    fn test_extract_gemini_text() {
        let json = serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "one"}, {"text": "two"}]}}]
        });
        assert_eq!(extract_gemini_text(&json).unwrap(), "one\ntwo");
        assert!(extract_gemini_text(&serde_json::json!({"candidates": []})).is_none());
    }

    #[test]
    fn test_extract_anthropic_text() {
        let json = serde_json::json!({
            "content": [
                {
                    "type": "text",
                    "text": "Here is the summary."
                }
            ]
        });
        assert_eq!(extract_anthropic_text(&json).unwrap(), "Here is the summary.");
        assert!(extract_anthropic_text(&serde_json::json!({"content": []})).is_none());
    }

    #[test]
    fn test_extract_openai_text() {
        let json = serde_json::json!({
            "choices": [
                {
                    "message": {
                        "role": "assistant",
                        "content": "Summary of the video."
                    }
                }
            ]
        });
        assert_eq!(extract_openai_text(&json).unwrap(), "Summary of the video.");
        assert!(extract_openai_text(&serde_json::json!({"choices": []})).is_none());
    }
}
