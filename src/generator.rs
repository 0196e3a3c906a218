//! Optional remote answer generation.
//!
//! When an OpenRouter API key is configured, the router hands retrieved
//! chunks to a chat-completion model instead of the extractive
//! [`responder`](crate::responder). Any failure (missing key, network
//! error, non-2xx status, malformed body) degrades to
//! [`fallback_response`], which quotes the context paragraphs that share a
//! word with the question.
//!
//! # Request shape
//!
//! ```json
//! {
//!   "model": "openai/gpt-3.5-turbo",
//!   "messages": [
//!     { "role": "system", "content": "<instruction>" },
//!     { "role": "system", "content": "Here is the context information ...\n\n<context>" },
//!     { "role": "user", "content": "<question>" }
//!   ],
//!   "transforms": ["middle-out"],
//!   "route": "fallback"
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::GeneratorConfig;
use crate::error::GenerateError;

const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant that answers questions about websites. \
Your answers should be based on the provided context. If the context doesn't contain relevant \
information, politely say so and suggest what the user might ask instead.";

/// Context paragraphs quoted by the fallback.
const FALLBACK_PARAGRAPHS: usize = 3;

/// Something that can turn a question plus context into an answer.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Identifier for logs (e.g. the model name).
    fn name(&self) -> &str;

    /// Produce an answer, or fail with a typed error.
    async fn generate(&self, question: &str, context: &str) -> Result<String, GenerateError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    transforms: Vec<&'static str>,
    route: &'static str,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Chat-completion client for OpenRouter (or any compatible endpoint).
pub struct OpenRouterGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    referer: Option<String>,
    title: Option<String>,
}

impl OpenRouterGenerator {
    pub fn from_config(config: &GeneratorConfig) -> Result<Self, GenerateError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| GenerateError::Config("OPENROUTER_API_KEY is not set".to_string()))?;
        let model = config
            .model
            .clone()
            .ok_or_else(|| GenerateError::Config("generator.model is not set".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            referer: config.referer.clone(),
            title: config.title.clone(),
        })
    }

    fn build_messages(question: &str, context: &str) -> Vec<Message> {
        let mut messages = vec![Message {
            role: "system",
            content: SYSTEM_INSTRUCTION.to_string(),
        }];
        if !context.trim().is_empty() {
            messages.push(Message {
                role: "system",
                content: format!(
                    "Here is the context information to use when answering the question:\n\n{}",
                    context
                ),
            });
        }
        messages.push(Message {
            role: "user",
            content: question.to_string(),
        });
        messages
    }
}

#[async_trait]
impl AnswerGenerator for OpenRouterGenerator {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, question: &str, context: &str) -> Result<String, GenerateError> {
        let body = ChatRequest {
            model: &self.model,
            messages: Self::build_messages(question, context),
            transforms: vec!["middle-out"],
            route: "fallback",
        };

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body);
        if let Some(referer) = &self.referer {
            request = request.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.title {
            request = request.header("X-Title", title);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerateError::Api { status, body });
        }

        let text = response.text().await?;
        parse_completion(&text)
    }
}

fn parse_completion(body: &str) -> Result<String, GenerateError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| GenerateError::Parse(e.to_string()))?;
    parsed
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| GenerateError::Parse("response has no choices".to_string()))
}

/// Ask `generator`, degrading to [`fallback_response`] on any error.
pub async fn generate_with_fallback(
    generator: &dyn AnswerGenerator,
    question: &str,
    context: &str,
) -> String {
    match generator.generate(question, context).await {
        Ok(answer) => {
            debug!(generator = generator.name(), chars = answer.len(), "generated answer");
            answer
        }
        Err(e) => {
            warn!(generator = generator.name(), error = %e, "generation failed, using fallback");
            fallback_response(question, context)
        }
    }
}

/// Answer from context alone: quote up to three blank-line-separated
/// paragraphs that contain a question word longer than three characters.
pub fn fallback_response(question: &str, context: &str) -> String {
    let words: Vec<String> = question
        .to_lowercase()
        .split(' ')
        .filter(|w| w.chars().count() > 3)
        .map(str::to_string)
        .collect();

    let relevant: Vec<&str> = context
        .split("\n\n")
        .filter(|part| {
            let lower = part.to_lowercase();
            words.iter().any(|w| lower.contains(w.as_str()))
        })
        .take(FALLBACK_PARAGRAPHS)
        .collect();

    if relevant.is_empty() {
        return format!(
            "I don't have specific information about \"{}\" in my knowledge base. This might be \
             because the content wasn't covered in the websites I've been trained on, or the \
             question might be using different terminology than what's in my database. Please try \
             rephrasing your question or ask about a different topic.",
            question
        );
    }

    format!(
        "Based on the information I have:\n\n{}\n\nThis is what I found related to your question. \
         If you need more specific information, please ask a more targeted question.",
        relevant.join("\n\n")
    )
}
