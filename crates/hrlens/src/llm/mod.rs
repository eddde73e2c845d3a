//! Text-completion backends used by the generative strategies.

pub mod azure;

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

pub use azure::AzureChatClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationFailureKind {
    Transport,
    Status,
    MalformedResponse,
    EmptyCompletion,
}

impl GenerationFailureKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Status => "status",
            Self::MalformedResponse => "malformed_response",
            Self::EmptyCompletion => "empty_completion",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationFailure {
    pub kind: GenerationFailureKind,
    pub message: String,
}

impl GenerationFailure {
    #[must_use]
    pub fn new(kind: GenerationFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failure: {}", self.kind.as_str(), self.message)
    }
}

impl std::error::Error for GenerationFailure {}

/// A backend that turns one prompt into one completion.
pub trait TextCompletion: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String, GenerationFailure>;
}

/// Returns the body of the first fenced code block, or the trimmed output when there is none.
#[must_use]
pub fn extract_query_text(output: &str) -> String {
    static FENCED_BLOCK: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = FENCED_BLOCK
        .get_or_init(|| Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)```").ok());

    pattern
        .as_ref()
        .and_then(|regex| regex.captures(output))
        .and_then(|captures| captures.get(1))
        .map_or_else(
            || output.trim().to_string(),
            |block| block.as_str().trim().to_string(),
        )
}
