use std::sync::Mutex;

use tracing::warn;

use crate::ai::{Answers, ManifestEntry, PromptManifest};

#[derive(Debug, Clone, PartialEq)]
pub enum AiMode {
    /// Record prompts into a manifest; nothing is generated.
    Collect,
    /// Route supplied answers to each step's output target.
    Apply(Answers),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StdoutRecord {
    pub key: String,
    pub text: String,
}

/// AI protocol state for one top-level run, shared with sub-recipes.
#[derive(Debug)]
pub struct AiSession {
    mode: AiMode,
    manifest: Mutex<PromptManifest>,
    stdout: Mutex<Vec<StdoutRecord>>,
    echo_stdout: bool,
}

impl AiSession {
    pub fn new(mode: AiMode) -> Self {
        Self {
            mode,
            manifest: Mutex::new(PromptManifest::default()),
            stdout: Mutex::new(Vec::new()),
            echo_stdout: false,
        }
    }

    pub fn collect() -> Self {
        Self::new(AiMode::Collect)
    }

    pub fn apply(answers: Answers) -> Self {
        Self::new(AiMode::Apply(answers))
    }

    /// Also print `stdout`-routed answers as they are applied.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo_stdout = echo;
        self
    }

    pub fn mode(&self) -> &AiMode {
        &self.mode
    }

    pub fn is_collect(&self) -> bool {
        matches!(self.mode, AiMode::Collect)
    }

    pub fn answer(&self, key: &str) -> Option<&str> {
        match &self.mode {
            AiMode::Apply(answers) => answers.get(key),
            AiMode::Collect => None,
        }
    }

    /// Add a manifest entry. A repeated key keeps the first entry.
    pub fn record(&self, entry: ManifestEntry) {
        let mut manifest = self.manifest.lock().unwrap_or_else(|e| e.into_inner());
        if manifest.get(&entry.key).is_some() {
            warn!(key = %entry.key, step = %entry.step, "duplicate AI key; keeping the first prompt");
            return;
        }
        manifest.entries.push(entry);
    }

    pub fn manifest(&self) -> PromptManifest {
        self.manifest.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn write_stdout(&self, key: &str, text: &str) {
        if self.echo_stdout {
            println!("{text}");
        }
        self.stdout
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(StdoutRecord {
                key: key.to_string(),
                text: text.to_string(),
            });
    }

    pub fn stdout_records(&self) -> Vec<StdoutRecord> {
        self.stdout.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
