//! Streaming invoker for OpenAI-compatible `chat/completions` endpoints.
//!
//! Google (through its OpenAI surface), Groq and DeepSeek all accept the same request shape,
//! so one invoker serves every provider family. Only the base URL and the credential differ.

use crate::{Endpoints, GatewayConfig};
use crate::sse::SseDecoder;
use async_trait::async_trait;
use futures::StreamExt;
use peroot_core::{
    BackendDescriptor, Credentials, Invocation, StreamChunk, TextStream, TokenUsage,
};
use peroot_error::{BackendError, BackendErrorKind, ConfigError, PerootResult};
use peroot_interface::BackendInvoker;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument, trace};

const DONE_MARKER: &str = "[DONE]";

/// HTTP invoker for OpenAI-compatible streaming chat APIs.
///
/// The request timeout bounds only the time until response headers arrive. Once a stream
/// is established it may run as long as the upstream keeps sending.
#[derive(Debug, Clone)]
pub struct OpenAiCompatInvoker {
    client: Client,
    credentials: Credentials,
    endpoints: Endpoints,
    request_timeout: Duration,
}

impl OpenAiCompatInvoker {
    /// Creates a new invoker.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &GatewayConfig, credentials: Credentials) -> PerootResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build HTTP client: {}", e)))?;

        debug!(
            request_timeout_secs = config.request_timeout_secs,
            "Created OpenAI-compatible invoker"
        );

        Ok(Self {
            client,
            credentials,
            endpoints: config.endpoints.clone(),
            request_timeout: config.request_timeout(),
        })
    }

    fn url_for(&self, backend: &BackendDescriptor) -> String {
        format!(
            "{}/chat/completions",
            self.endpoints
                .for_family(*backend.family())
                .trim_end_matches('/')
        )
    }
}

#[async_trait]
impl BackendInvoker for OpenAiCompatInvoker {
    #[instrument(skip_all, fields(backend = %backend.id(), model = %backend.model()))]
    async fn invoke(
        &self,
        backend: &BackendDescriptor,
        invocation: Invocation<'_>,
    ) -> Result<TextStream, BackendError> {
        let id = backend.id().to_string();

        let Some(api_key) = self.credentials.get(*backend.family()) else {
            return Err(BackendError::new(
                id,
                BackendErrorKind::Unauthorized(format!(
                    "{} not set",
                    backend.family().credential_env_var()
                )),
            ));
        };

        let body = ChatRequest {
            model: backend.model(),
            messages: [
                ChatMessage {
                    role: "system",
                    content: invocation.system,
                },
                ChatMessage {
                    role: "user",
                    content: invocation.prompt,
                },
            ],
            temperature: invocation.temperature,
            stream: true,
            stream_options: StreamOptions {
                include_usage: true,
            },
        };

        let url = self.url_for(backend);
        debug!(%url, "Sending streaming completion request");

        let send = self.client.post(&url).bearer_auth(api_key).json(&body).send();
        let response = match tokio::time::timeout(self.request_timeout, send).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) if e.is_timeout() => {
                return Err(BackendError::new(id, BackendErrorKind::Timeout(e.to_string())));
            }
            Ok(Err(e)) => {
                error!(error = ?e, "Request failed");
                return Err(BackendError::new(id, BackendErrorKind::Transport(e.to_string())));
            }
            Err(_) => {
                return Err(BackendError::new(
                    id,
                    BackendErrorKind::Timeout(format!(
                        "no response within {}s",
                        self.request_timeout.as_secs()
                    )),
                ));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!(%status, body = %message, "Upstream returned error");
            return Err(BackendError::new(id, status_error(status, message)));
        }

        Ok(decode_stream(id, response))
    }
}

fn status_error(status: StatusCode, message: String) -> BackendErrorKind {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendErrorKind::Unauthorized(message),
        StatusCode::TOO_MANY_REQUESTS => BackendErrorKind::UpstreamRateLimited(message),
        _ => BackendErrorKind::Api {
            status_code: status.as_u16(),
            message,
        },
    }
}

fn decode_stream(backend: String, response: reqwest::Response) -> TextStream {
    Box::pin(async_stream::stream! {
        let mut bytes = Box::pin(response.bytes_stream());
        let mut decoder = SseDecoder::new();
        let mut done = false;

        while !done {
            let payloads = match bytes.next().await {
                Some(Ok(chunk)) => decoder.feed(&chunk),
                Some(Err(e)) => {
                    yield Err(BackendError::new(
                        backend.clone(),
                        BackendErrorKind::StreamInterrupted(e.to_string()),
                    ));
                    break;
                }
                None => {
                    done = true;
                    decoder.finish().into_iter().collect()
                }
            };

            for payload in payloads {
                if payload.trim() == DONE_MARKER {
                    done = true;
                    break;
                }
                match parse_payload(&backend, &payload) {
                    Ok(Some(chunk)) => yield Ok(chunk),
                    Ok(None) => {}
                    Err(e) => {
                        yield Err(e);
                        done = true;
                        break;
                    }
                }
            }
        }
    })
}

/// Turn one SSE payload into a chunk. Keep-alive payloads with neither text nor usage
/// produce `None`.
fn parse_payload(backend: &str, payload: &str) -> Result<Option<StreamChunk>, BackendError> {
    let event: ChatChunk = serde_json::from_str(payload).map_err(|e| {
        BackendError::new(
            backend,
            BackendErrorKind::MalformedResponse(format!("{}: {}", e, payload)),
        )
    })?;

    if let Some(err) = event.error {
        return Err(BackendError::new(
            backend,
            BackendErrorKind::StreamInterrupted(err.message),
        ));
    }

    let text: String = event
        .choices
        .into_iter()
        .filter_map(|choice| choice.delta.content)
        .collect();
    let usage = event.usage.map(|u| TokenUsage {
        prompt_tokens: u.prompt_tokens,
        completion_tokens: u.completion_tokens,
        total_tokens: u.total_tokens,
    });

    trace!(text_len = text.len(), has_usage = usage.is_some(), "Decoded chunk");

    if text.is_empty() && usage.is_none() {
        return Ok(None);
    }
    Ok(Some(StreamChunk { text, usage }))
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    stream: bool,
    stream_options: StreamOptions,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct StreamOptions {
    include_usage: bool,
}

#[derive(Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    usage: Option<ChunkUsage>,
    #[serde(default)]
    error: Option<ChunkError>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Deserialize, Default)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChunkUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}

#[derive(Deserialize)]
struct ChunkError {
    #[serde(default)]
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_delta() {
        let chunk = parse_payload(
            "b",
            r#"{"choices":[{"index":0,"delta":{"content":"Hi"}}]}"#,
        )
        .unwrap();
        assert_eq!(chunk, Some(StreamChunk::text("Hi")));
    }

    #[test]
    fn test_parse_usage_only() {
        let chunk = parse_payload(
            "b",
            r#"{"choices":[],"usage":{"prompt_tokens":3,"completion_tokens":2,"total_tokens":5}}"#,
        )
        .unwrap()
        .unwrap();
        assert!(chunk.text.is_empty());
        assert_eq!(chunk.usage.map(|u| u.total_tokens), Some(5));
    }

    #[test]
    fn test_parse_role_only_delta_is_skipped() {
        let chunk = parse_payload("b", r#"{"choices":[{"delta":{"role":"assistant"}}]}"#).unwrap();
        assert_eq!(chunk, None);
    }

    #[test]
    fn test_parse_garbage_is_malformed() {
        let err = parse_payload("b", "not json").unwrap_err();
        assert_eq!(err.kind().label(), "malformed");
        assert_eq!(err.backend(), "b");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_error(StatusCode::FORBIDDEN, String::new()).label(),
            "auth"
        );
        assert_eq!(
            status_error(StatusCode::TOO_MANY_REQUESTS, String::new()).label(),
            "rate_limit"
        );
        assert_eq!(
            status_error(StatusCode::BAD_GATEWAY, "down".into()),
            BackendErrorKind::Api {
                status_code: 502,
                message: "down".into()
            }
        );
    }
}
