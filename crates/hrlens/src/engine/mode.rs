use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::config::GenerativeSettings;
use crate::llm::{GenerationFailure, TextCompletion};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Generative,
    Deterministic,
}

impl StrategyKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Generative => "generative",
            Self::Deterministic => "deterministic",
        }
    }
}

/// The one-time choice between the generative and deterministic strategy sets.
#[derive(Clone)]
pub enum EngineMode {
    Generative(Arc<dyn TextCompletion>),
    Deterministic,
}

impl fmt::Debug for EngineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Generative(_) => "EngineMode::Generative",
            Self::Deterministic => "EngineMode::Deterministic",
        })
    }
}

impl EngineMode {
    /// Picks generative mode only when settings exist and a client can be built from them.
    pub fn select<F>(settings: Option<&GenerativeSettings>, build_client: F) -> Self
    where
        F: FnOnce(&GenerativeSettings) -> Result<Arc<dyn TextCompletion>, GenerationFailure>,
    {
        let Some(settings) = settings else {
            tracing::info!(mode = "deterministic", "no generative credentials configured");
            return Self::Deterministic;
        };

        match build_client(settings) {
            Ok(client) => {
                tracing::info!(
                    mode = "generative",
                    deployment = %settings.deployment,
                    "generative backend configured"
                );
                Self::Generative(client)
            }
            Err(failure) => {
                tracing::warn!(
                    mode = "deterministic",
                    error = %failure,
                    "failed to build generative client"
                );
                Self::Deterministic
            }
        }
    }

    #[must_use]
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Generative(_) => StrategyKind::Generative,
            Self::Deterministic => StrategyKind::Deterministic,
        }
    }

    #[must_use]
    pub fn strategy(&self) -> Strategy {
        match self {
            Self::Generative(client) => Strategy::Generative(Arc::clone(client)),
            Self::Deterministic => Strategy::Deterministic,
        }
    }
}

/// Per-component view of the engine mode.
#[derive(Clone)]
pub enum Strategy {
    Generative(Arc<dyn TextCompletion>),
    Deterministic,
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind().as_str())
    }
}

impl Strategy {
    #[must_use]
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Generative(_) => StrategyKind::Generative,
            Self::Deterministic => StrategyKind::Deterministic,
        }
    }

    #[must_use]
    pub fn client(&self) -> Option<&dyn TextCompletion> {
        match self {
            Self::Generative(client) => Some(client.as_ref()),
            Self::Deterministic => None,
        }
    }
}
