//! Streamed completions and dispatch outcomes.

use crate::BackendId;
use futures::stream::{Stream, StreamExt};
use peroot_error::BackendError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::pin::Pin;

/// Token accounting reported by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the prompt
    pub prompt_tokens: u64,
    /// Tokens generated
    pub completion_tokens: u64,
    /// Prompt plus completion
    pub total_tokens: u64,
}

/// One piece of a streamed completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Incremental text, possibly empty
    pub text: String,
    /// Usage, usually only on the final chunk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

impl StreamChunk {
    /// A text-only chunk.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
        }
    }

    /// A usage-only chunk.
    pub fn usage(usage: TokenUsage) -> Self {
        Self {
            text: String::new(),
            usage: Some(usage),
        }
    }
}

/// Lazy, single-pass sequence of text chunks from one backend.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, BackendError>> + Send>>;

/// A finished completion, handed to the request's completion hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Backend that produced the text
    pub backend: BackendId,
    /// Full generated text
    pub text: String,
    /// Usage if the backend reported it
    pub usage: Option<TokenUsage>,
}

/// A successful dispatch: the stream plus the backend that is serving it.
pub struct GenerationOutcome {
    backend: BackendId,
    attempted: usize,
    skipped: usize,
    stream: TextStream,
}

impl GenerationOutcome {
    /// Wrap an established stream.
    pub fn new(backend: BackendId, attempted: usize, skipped: usize, stream: TextStream) -> Self {
        Self {
            backend,
            attempted,
            skipped,
            stream,
        }
    }

    /// Id of the backend that served the request.
    pub fn backend(&self) -> &BackendId {
        &self.backend
    }

    /// Number of backends invoked, including the winner.
    pub fn attempted(&self) -> usize {
        self.attempted
    }

    /// Number of backends skipped as unavailable.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Take the stream.
    pub fn into_stream(self) -> TextStream {
        self.stream
    }

    /// Drain the stream into one string.
    ///
    /// # Errors
    ///
    /// Returns the first mid-stream error.
    pub async fn collect_text(self) -> Result<String, BackendError> {
        let mut stream = self.stream;
        let mut text = String::new();
        while let Some(chunk) = stream.next().await {
            text.push_str(&chunk?.text);
        }
        Ok(text)
    }
}

impl fmt::Debug for GenerationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationOutcome")
            .field("backend", &self.backend)
            .field("attempted", &self.attempted)
            .field("skipped", &self.skipped)
            .finish_non_exhaustive()
    }
}
