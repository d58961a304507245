//! Two-pass protocol for content produced by an external AI agent.
//!
//! A collect pass records every AI step's prompt into a [`PromptManifest`]
//! without generating anything. The caller answers each entry out of band and
//! runs again with an [`Answers`] document; the apply pass routes each answer
//! to its step's output target.

mod answers;
mod manifest;
mod routing;
mod session;

pub use answers::Answers;
pub use manifest::{ManifestEntry, PromptManifest};
pub use routing::route_answer;
pub use session::{AiMode, AiSession, StdoutRecord};

#[derive(Debug, thiserror::Error)]
pub enum AiDocumentError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("answers document must be a mapping of key to text")]
    NotAMapping,
}
