use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::{
    error::{Result, TldwError},
    format::format_section_for_prompt,
    outline::{OutlineExtraction, parse_extraction_reply},
    provider::Provider,
    types::Section,
};

static OUTLINE_PROMPT: &str = r#"If the following video description contains an outline, return the outline as a JSON list with "timestamp" and "topic".
The one key containing this list shall be called "timestamps".
If there is no outline, return "No outline found in description." as the value of "timestamps"."#;

static CHAPTER_PROMPT: &str = r#"Summarize the following section of the video.
Use the provided content to generate a summary of the section.
Stay in the original language.
Create bullet points, but don't shorten the idea of the content. Explain the topic briefly, not that they talk about it in the video.
If they talk about the 5 things or the 9 types or something like that, list them.
Answer the question that is given in the topic or chapter title if available.
Put the topic with its start time in the format "hh:mm:ss" as a heading.
Every heading should be a markdown ## heading. If there is no real heading (e.g. Chapter 1), create one out of the content provided.
Keep it as short as possible, but as long as necessary."#;

static MINIMAL_PROMPT: &str = r#"Summarize the following chapter of a podcast as short as possible in at most 1-2 bullet points.
Stay in the original language. Keep the heading."#;

static UNIFIED_PROMPT: &str = r#"Summarize the following outline of a podcast.
Do not only list the topics they talk about, but briefly explain every idea you mention in the summary.
Still try to keep it as short as possible. Use bullet points if possible."#;

const TEMPERATURE: f64 = 0.08;

/// The language-model side of the pipeline.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Look for a chapter outline in a video description.
    async fn extract_outline(&self, description: &str) -> Result<OutlineExtraction>;

    /// Markdown summary of one section, headed by its topic and start time.
    async fn summarize_chapter(&self, section: &Section) -> Result<String>;

    /// One or two bullet points condensing a chapter summary.
    async fn minimize(&self, chapter_summary: &str) -> Result<String>;

    /// One summary over all condensed chapters.
    async fn unify(&self, minimal_summaries: &str) -> Result<String>;
}

/// [`Summarizer`] backed by an OpenAI-compatible chat completions endpoint.
pub struct ChatSummarizer {
    client: reqwest::Client,
    api_url: &'static str,
    api_key: String,
    model: String,
}

struct ChatRequest<'a> {
    stage: &'static str,
    system: &'a str,
    user: &'a str,
    max_tokens: u32,
    json_reply: bool,
}

impl ChatSummarizer {
    pub fn new(provider: Provider, model: Option<String>, timeout: Duration) -> Result<Self> {
        let config = provider.config();
        let api_key = provider.validate_api_key()?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_url: config.api_url,
            api_key,
            model: model.unwrap_or_else(|| config.model.to_string()),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: ChatRequest<'_>) -> Result<String> {
        let mut body = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": request.system,
                },
                {
                    "role": "user",
                    "content": request.user,
                },
            ],
            "temperature": TEMPERATURE,
            "max_tokens": request.max_tokens,
            "top_p": 1,
        });
        if request.json_reply {
            body["response_format"] = json!({ "type": "json_object" });
        }

        debug!(stage = request.stage, model = %self.model, "sending chat completion");

        let response = self
            .client
            .post(self.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(TldwError::SummaryFailed {
                stage: request.stage,
                reason: format!("API error {}: {}", status, text),
            });
        }

        let response = response.json::<Value>().await?;
        completion_content(&response)
            .map(str::to_string)
            .ok_or_else(|| TldwError::SummaryFailed {
                stage: request.stage,
                reason: format!("Invalid API response: {:?}", response),
            })
    }
}

/// The assistant message text of a chat completion response.
pub fn completion_content(response: &Value) -> Option<&str> {
    response["choices"][0]["message"]["content"].as_str()
}

#[async_trait]
impl Summarizer for ChatSummarizer {
    async fn extract_outline(&self, description: &str) -> Result<OutlineExtraction> {
        let reply = self
            .complete(ChatRequest {
                stage: "outline extraction",
                system: OUTLINE_PROMPT,
                user: description,
                max_tokens: 2048,
                json_reply: true,
            })
            .await?;

        Ok(parse_extraction_reply(&reply))
    }

    async fn summarize_chapter(&self, section: &Section) -> Result<String> {
        let user = format_section_for_prompt(section);
        self.complete(ChatRequest {
            stage: "chapter summary",
            system: CHAPTER_PROMPT,
            user: &user,
            max_tokens: 512,
            json_reply: false,
        })
        .await
    }

    async fn minimize(&self, chapter_summary: &str) -> Result<String> {
        self.complete(ChatRequest {
            stage: "minimal summary",
            system: MINIMAL_PROMPT,
            user: chapter_summary,
            max_tokens: 256,
            json_reply: false,
        })
        .await
    }

    async fn unify(&self, minimal_summaries: &str) -> Result<String> {
        self.complete(ChatRequest {
            stage: "unified summary",
            system: UNIFIED_PROMPT,
            user: minimal_summaries,
            max_tokens: 512,
            json_reply: false,
        })
        .await
    }
}
