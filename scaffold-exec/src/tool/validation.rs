use std::time::Duration;

/// Outcome of a side-effect-free check of a step against its tool.
#[derive(Debug, Clone, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", with = "opt_millis")]
    pub estimated_time: Option<Duration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_requirements: Option<ResourceRequirements>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequirements {
    pub filesystem: bool,
    pub subprocess: bool,
    pub network: bool,
    pub interactive: bool,
}

impl ToolValidation {
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            ..Default::default()
        }
    }

    pub fn error(&mut self, message: impl Into<String>) -> &mut Self {
        self.is_valid = false;
        self.errors.push(message.into());
        self
    }

    pub fn warn(&mut self, message: impl Into<String>) -> &mut Self {
        self.warnings.push(message.into());
        self
    }

    pub fn suggest(&mut self, message: impl Into<String>) -> &mut Self {
        self.suggestions.push(message.into());
        self
    }

    pub fn with_estimate(mut self, estimate: Duration) -> Self {
        self.estimated_time = Some(estimate);
        self
    }

    pub fn with_requirements(mut self, requirements: ResourceRequirements) -> Self {
        self.resource_requirements = Some(requirements);
        self
    }
}

mod opt_millis {
    use std::time::Duration;

    pub fn serialize<S: serde::Serializer>(v: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(d) => s.serialize_u64(d.as_millis() as u64),
            None => s.serialize_none(),
        }
    }
}
