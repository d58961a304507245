use crate::types::common::is_false;
use crate::types::{
    ActionStep, AiStep, DirectoryStep, GroupStep, InstallStep, PromptStep, QueryStep, RecipeStep,
    ShellStep, TemplateStep, TransformStep,
};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    /// Boolean expression; the step is skipped when it evaluates false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub parallel: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continue_on_error: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,

    /// Per-step timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    #[serde(flatten)]
    pub kind: StepKind,
}

impl Step {
    pub fn new(name: impl Into<String>, kind: StepKind) -> Self {
        Self {
            name: name.into(),
            description: None,
            depends_on: Vec::new(),
            when: None,
            parallel: false,
            continue_on_error: None,
            retries: None,
            timeout: None,
            kind,
        }
    }

    pub fn depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn tool_type(&self) -> ToolType {
        self.kind.tool_type()
    }

    /// Nested steps for `sequence` and `parallel` groups.
    pub fn children(&self) -> Option<&[Step]> {
        match &self.kind {
            StepKind::Sequence(g) | StepKind::Parallel(g) => Some(&g.steps),
            _ => None,
        }
    }

    pub(crate) fn contains_ai(&self) -> bool {
        match &self.kind {
            StepKind::Ai(_) => true,
            StepKind::Sequence(g) | StepKind::Parallel(g) => g.steps.iter().any(Step::contains_ai),
            _ => false,
        }
    }

    pub(crate) fn collect_recipe_refs<'a>(&'a self, out: &mut Vec<&'a str>) {
        match &self.kind {
            StepKind::Recipe(r) if !r.recipe.contains("{{") => out.push(&r.recipe),
            StepKind::Sequence(g) | StepKind::Parallel(g) => {
                for step in &g.steps {
                    step.collect_recipe_refs(out);
                }
            }
            _ => {}
        }
    }
}

/// Tool-specific payload of a step, discriminated by the `tool` field.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "tool", rename_all = "lowercase")]
pub enum StepKind {
    Template(TemplateStep),
    Action(ActionStep),
    Transform(TransformStep),
    Recipe(RecipeStep),
    Shell(ShellStep),
    Query(QueryStep),
    Directory(DirectoryStep),
    Install(InstallStep),
    Prompt(PromptStep),
    Ai(AiStep),
    Sequence(GroupStep),
    Parallel(GroupStep),
}

impl StepKind {
    pub fn tool_type(&self) -> ToolType {
        match self {
            Self::Template(_) => ToolType::Template,
            Self::Action(_) => ToolType::Action,
            Self::Transform(_) => ToolType::Transform,
            Self::Recipe(_) => ToolType::Recipe,
            Self::Shell(_) => ToolType::Shell,
            Self::Query(_) => ToolType::Query,
            Self::Directory(_) => ToolType::Directory,
            Self::Install(_) => ToolType::Install,
            Self::Prompt(_) => ToolType::Prompt,
            Self::Ai(_) => ToolType::Ai,
            Self::Sequence(_) => ToolType::Sequence,
            Self::Parallel(_) => ToolType::Parallel,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ToolType {
    Template,
    Action,
    Transform,
    Recipe,
    Shell,
    Query,
    Directory,
    Install,
    Prompt,
    Ai,
    Sequence,
    Parallel,
}

impl ToolType {
    pub const ALL: [ToolType; 12] = [
        ToolType::Template,
        ToolType::Action,
        ToolType::Transform,
        ToolType::Recipe,
        ToolType::Shell,
        ToolType::Query,
        ToolType::Directory,
        ToolType::Install,
        ToolType::Prompt,
        ToolType::Ai,
        ToolType::Sequence,
        ToolType::Parallel,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Template => "template",
            Self::Action => "action",
            Self::Transform => "transform",
            Self::Recipe => "recipe",
            Self::Shell => "shell",
            Self::Query => "query",
            Self::Directory => "directory",
            Self::Install => "install",
            Self::Prompt => "prompt",
            Self::Ai => "ai",
            Self::Sequence => "sequence",
            Self::Parallel => "parallel",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// Tools that drive nested step execution themselves.
    pub fn is_composite(self) -> bool {
        matches!(self, Self::Recipe | Self::Sequence | Self::Parallel)
    }
}

impl std::fmt::Display for ToolType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
