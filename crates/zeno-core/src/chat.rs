//! Retrieval-augmented chat over the tool catalog.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::ReceiverStream;

use zeno_types::{ChatAnswer, ChatMessage, ChatRequest, ChatStatus, ToolMatch};

use crate::embedding::EmbeddingProvider;
use crate::vectors::VectorStore;
use crate::{Result, ZenoError};

pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

/// Retrieved tools fed into one prompt.
pub const RETRIEVAL_LIMIT: usize = 8;

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_name(&self) -> &str;
    fn is_configured(&self) -> bool {
        true
    }
    /// Buffered completion.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
    /// Incremental completion; items are content deltas in order.
    async fn complete_stream(
        &self,
        messages: &[ChatMessage],
    ) -> Result<BoxStream<'static, Result<String>>>;
}

// ============ OpenAI backend ============

pub struct OpenAiChat {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiChat {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    fn payload(&self, messages: &[ChatMessage], stream: bool) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": stream,
        })
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: String,
}

/// Content delta from one `data:` line of a streamed completion.
fn parse_stream_delta(data: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(data).ok()?;
    value
        .get("choices")?
        .get(0)?
        .get("delta")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}

#[async_trait]
impl ChatModel for OpenAiChat {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let resp = self
            .client
            .post(OPENAI_CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&self.payload(messages, false))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ZenoError::Upstream {
                service: "openai",
                message: format!("{status}: {body}"),
            });
        }

        let parsed: CompletionResponse = resp.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ZenoError::Upstream {
                service: "openai",
                message: "completion had no choices".to_string(),
            })
    }

    async fn complete_stream(
        &self,
        messages: &[ChatMessage],
    ) -> Result<BoxStream<'static, Result<String>>> {
        let resp = self
            .client
            .post(OPENAI_CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&self.payload(messages, true))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ZenoError::Upstream {
                service: "openai",
                message: format!("{status}: {body}"),
            });
        }

        let (tx, rx) = tokio::sync::mpsc::channel::<Result<String>>(32);
        tokio::spawn(async move {
            let mut buffer = String::new();
            let mut body = resp.bytes_stream();
            while let Some(chunk) = body.next().await {
                let bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let _ = tx.send(Err(e.into())).await;
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&bytes));

                // SSE frames are newline-delimited; a chunk may split one.
                while let Some(pos) = buffer.find('\n') {
                    let line = buffer[..pos].trim().to_string();
                    buffer.drain(..=pos);
                    let Some(data) = line.strip_prefix("data:") else {
                        continue;
                    };
                    let data = data.trim();
                    if data == "[DONE]" {
                        return;
                    }
                    if let Some(delta) = parse_stream_delta(data) {
                        if tx.send(Ok(delta)).await.is_err() {
                            return;
                        }
                    }
                }
            }
        });

        Ok(ReceiverStream::new(rx).boxed())
    }
}

// ============ Unconfigured backend ============

pub struct UnconfiguredChat;

#[async_trait]
impl ChatModel for UnconfiguredChat {
    fn model_name(&self) -> &str {
        "unconfigured"
    }

    fn is_configured(&self) -> bool {
        false
    }

    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
        Err(ZenoError::MissingCredential("OPENAI_API_KEY"))
    }

    async fn complete_stream(
        &self,
        _messages: &[ChatMessage],
    ) -> Result<BoxStream<'static, Result<String>>> {
        Err(ZenoError::MissingCredential("OPENAI_API_KEY"))
    }
}

// ============ Service ============

/// Embeds the query, retrieves nearest tools, and asks the model.
#[derive(Clone)]
pub struct ChatService {
    embeddings: Arc<dyn EmbeddingProvider>,
    vectors: Arc<dyn VectorStore>,
    model: Arc<dyn ChatModel>,
}

impl ChatService {
    pub fn new(
        embeddings: Arc<dyn EmbeddingProvider>,
        vectors: Arc<dyn VectorStore>,
        model: Arc<dyn ChatModel>,
    ) -> Self {
        Self {
            embeddings,
            vectors,
            model,
        }
    }

    /// Retrieval hits in similarity order. Rejects a blank query before any
    /// provider call.
    async fn retrieve(&self, query: &str) -> Result<Vec<ToolMatch>> {
        if query.trim().is_empty() {
            return Err(ZenoError::Validation("message must not be empty".into()));
        }

        let vectors = self.embeddings.embed(&[query.to_string()]).await?;
        let query_vec = vectors.into_iter().next().ok_or(ZenoError::Upstream {
            service: "openai",
            message: "empty embedding response".to_string(),
        })?;

        self.vectors.search(&query_vec, query, RETRIEVAL_LIMIT).await
    }

    /// One system prompt carrying the ranked tool list, then history, then
    /// the query. Low-relevance hits are not filtered here; the prompt tells
    /// the model to hedge instead.
    fn build_messages(request: &ChatRequest, tools: &[ToolMatch]) -> Vec<ChatMessage> {
        let mut prompt = String::from(
            "You are the assistant for the Zeno Knowledge Hub, an internal \
             catalog of AI tools. Answer using the tools listed below, ranked \
             by relevance to the question. Mention tools by name and explain \
             why they fit. If none of the listed tools is a good match, say \
             so plainly instead of guessing.\n\nTools:\n",
        );
        if tools.is_empty() {
            prompt.push_str("(no matching tools found)\n");
        }
        for (i, tool) in tools.iter().enumerate() {
            prompt.push_str(&format!(
                "{}. {} (relevance {:.2}): {} [{}]\n",
                i + 1,
                tool.title,
                tool.similarity,
                tool.description,
                tool.url
            ));
        }

        let mut messages = vec![ChatMessage::system(prompt)];
        messages.extend(request.history.iter().cloned());
        messages.push(ChatMessage::user(request.message.clone()));
        messages
    }

    pub async fn answer(&self, request: &ChatRequest) -> Result<ChatAnswer> {
        let tools = self.retrieve(&request.message).await?;
        let messages = Self::build_messages(request, &tools);
        let reply = self.model.complete(&messages).await?;
        Ok(ChatAnswer {
            reply,
            tools,
            model: self.model.model_name().to_string(),
        })
    }

    /// Streamed variant; returns the retrieval context alongside the delta
    /// stream so the route can emit both.
    pub async fn answer_stream(
        &self,
        request: &ChatRequest,
    ) -> Result<(Vec<ToolMatch>, BoxStream<'static, Result<String>>)> {
        let tools = self.retrieve(&request.message).await?;
        let messages = Self::build_messages(request, &tools);
        let stream = self.model.complete_stream(&messages).await?;
        Ok((tools, stream))
    }

    pub async fn status(&self) -> ChatStatus {
        let embedded_tools = self.vectors.count().await.unwrap_or(0);
        ChatStatus {
            configured: self.model.is_configured() && self.embeddings.is_configured(),
            model: self.model.model_name().to_string(),
            embedded_tools,
        }
    }
}
