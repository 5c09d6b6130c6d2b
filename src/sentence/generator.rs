use reqwest::blocking::Client;
use serde::{
    Deserialize,
    Serialize,
};
use serde_json::json;

use crate::core::{
    http::{
        ensure_success,
        http_client,
    },
    SpeechBubbleError,
};

pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

pub const SYSTEM_PROMPT: &str = "You are a Japanese language expert. Generate natural Japanese \
sentences using only the provided vocabulary and grammar elements. Ensure all responses are in \
the specified JSON format.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordBreakdown {
    pub word: String,
    pub reading: String,
    pub meaning: String,
    pub pos: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSentence {
    pub japanese: String,
    pub reading: String,
    pub english: String,
    #[serde(default)]
    pub word_by_word: Vec<WordBreakdown>,
}

#[derive(Debug, Deserialize)]
struct GenerationReply {
    sentences: Vec<GeneratedSentence>,
}

/// Decodes the model's JSON reply into sentences.
pub fn parse_reply(content: &str) -> Result<Vec<GeneratedSentence>, SpeechBubbleError> {
    serde_json::from_str::<GenerationReply>(content)
        .map(|reply| reply.sentences)
        .map_err(|e| SpeechBubbleError::Generation(format!("Malformed model reply: {}", e)))
}

/// The language-model boundary: a prompt goes in, sentences (or an error) come out.
pub trait SentenceGenerator {
    fn generate(&self, prompt: &str) -> Result<Vec<GeneratedSentence>, SpeechBubbleError>;
}

pub struct OpenAiGenerator {
    client: Client,
    api_key: String,
    model: String,
    temperature: f64,
    endpoint: String,
}

impl OpenAiGenerator {
    pub fn new(api_key: &str) -> Result<Self, SpeechBubbleError> {
        if api_key.trim().is_empty() {
            return Err(SpeechBubbleError::MissingCredential("openai_api_key"));
        }

        Ok(Self {
            client: http_client()?,
            api_key: api_key.trim().to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            endpoint: OPENAI_CHAT_URL.to_string(),
        })
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
            "temperature": self.temperature,
            "response_format": { "type": "json_object" },
        })
    }
}

impl SentenceGenerator for OpenAiGenerator {
    fn generate(&self, prompt: &str) -> Result<Vec<GeneratedSentence>, SpeechBubbleError> {
        log::debug!("Requesting sentences from {} ({})", self.endpoint, self.model);
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt))
            .send()?;

        let response_json: serde_json::Value = ensure_success(resp)?.json()?;
        let content = response_json
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .ok_or_else(|| {
                SpeechBubbleError::Generation("Response has no message content".to_string())
            })?;

        parse_reply(content)
    }
}
