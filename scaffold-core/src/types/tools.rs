use std::collections::BTreeMap;

use crate::types::common::{default_true, is_false};
use crate::types::{AnyValue, Step};

/// Render a file from a template.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateStep {
    /// Template file, relative to the recipe directory (or project root).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    /// Inline template body, used instead of `template`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Output path relative to the working directory. Supports `{{ }}` interpolation.
    #[serde(default)]
    pub output: String,

    /// Leave an existing output file untouched (unless the run is forced).
    #[serde(default, skip_serializing_if = "is_false")]
    pub unless_exists: bool,

    /// Extra values merged over the run variables for this render only.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, AnyValue>,
}

/// Run a registered scripted action.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionStep {
    #[serde(default)]
    pub action: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, AnyValue>,
}

/// Rewrite existing source files.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformStep {
    /// Transform kind, see [`TransformKind`].
    #[serde(default)]
    pub transform: String,

    /// Glob patterns relative to the working directory.
    #[serde(default)]
    pub files: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, AnyValue>,
}

impl TransformStep {
    pub fn kind(&self) -> Option<TransformKind> {
        TransformKind::parse(&self.transform)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    /// Regex replace: `pattern`, `replacement`.
    Replace,
    /// Insert `content` relative to `anchor` (`position`: before/after/start/end).
    Insert,
    Append,
    Prepend,
    /// Delete every line matching `pattern`.
    Delete,
}

impl TransformKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "replace" => Some(Self::Replace),
            "insert" => Some(Self::Insert),
            "append" => Some(Self::Append),
            "prepend" => Some(Self::Prepend),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Insert => "insert",
            Self::Append => "append",
            Self::Prepend => "prepend",
            Self::Delete => "delete",
        }
    }
}

/// Run another recipe as a step.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeStep {
    /// Recipe identifier: path, URL, package or repository reference.
    #[serde(default)]
    pub recipe: String,

    /// Whether the sub-recipe sees the parent's resolved variables.
    #[serde(default = "default_true")]
    pub inherit: bool,

    /// Explicit overrides; values support `{{ }}` interpolation against the parent.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, AnyValue>,

    /// Renames parent variables (`parentName: childName`) before overrides apply.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variable_mapping: BTreeMap<String, String>,

    /// Run the sub-recipe against this directory (relative to the project root).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
}

impl Default for RecipeStep {
    fn default() -> Self {
        Self {
            recipe: String::new(),
            inherit: true,
            variables: BTreeMap::new(),
            variable_mapping: BTreeMap::new(),
            working_dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellStep {
    #[serde(default)]
    pub command: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    /// Shell binary, `sh` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,

    /// Store trimmed stdout into this variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_as: Option<String>,
}

/// Query (and optionally patch) a JSON or YAML document.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryStep {
    #[serde(default, alias = "query")]
    pub file: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<QueryCheck>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patch: Vec<QueryPatch>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryCheck {
    /// Dotted path (`a.b.0`) or JSON pointer (`/a/b/0`).
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equals: Option<AnyValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<String>,

    /// Store the value found at `path` into this variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,

    /// A failed non-required check is recorded but does not fail the step.
    #[serde(default = "default_true")]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPatch {
    pub path: String,

    #[serde(default)]
    pub op: PatchOp,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<AnyValue>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    #[default]
    Set,
    Remove,
    Merge,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DirectoryStep {
    #[serde(default)]
    pub directories: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallStep {
    #[serde(default)]
    pub packages: Vec<String>,

    /// `npm`, `yarn`, `pnpm`, `cargo` or `pip`; detected from lock files when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub dev: bool,
}

/// Ask the operator for a value.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptStep {
    #[serde(default)]
    pub variable: String,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub prompt_type: PromptType,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<AnyValue>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptType {
    #[default]
    Input,
    Confirm,
    Select,
    Number,
}

/// Content supplied by an external AI agent through the collect/apply protocol.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiStep {
    #[serde(default)]
    pub prompt: String,

    /// Manifest key; the step name when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<AnyValue>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<AiOutput>,

    #[serde(default = "default_true")]
    pub required: bool,
}

impl Default for AiStep {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            key: None,
            context: None,
            constraints: Vec::new(),
            output: None,
            required: true,
        }
    }
}

/// Where an AI answer is routed during the apply pass.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AiOutput {
    Variable {
        variable: String,
    },
    File {
        path: String,
    },
    Inject {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        anchor: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<InjectPosition>,
    },
    Stdout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjectPosition {
    Before,
    After,
    Start,
    End,
}

/// Nested steps of a `sequence` or `parallel` group.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GroupStep {
    #[serde(default)]
    pub steps: Vec<Step>,
}
