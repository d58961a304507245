use crate::types::AnyValue;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VariableSpec {
    /// One of `string`, `number`, `boolean`, `enum`, `array`. Kept as a raw string
    /// so an unknown type is reported by validation rather than by the parser.
    #[serde(rename = "type", default = "default_type")]
    pub var_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "crate::types::common::is_false")]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<AnyValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,

    /// Message shown when the value is asked for interactively.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

fn default_type() -> String {
    "string".to_string()
}

impl VariableSpec {
    pub fn of_type(var_type: VariableType) -> Self {
        Self {
            var_type: var_type.as_str().to_string(),
            description: None,
            required: false,
            default: None,
            pattern: None,
            min: None,
            max: None,
            values: Vec::new(),
            prompt: None,
        }
    }

    pub fn kind(&self) -> Option<VariableType> {
        VariableType::parse(&self.var_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableType {
    String,
    Number,
    Boolean,
    Enum,
    Array,
}

impl VariableType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "enum" => Some(Self::Enum),
            "array" => Some(Self::Array),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Enum => "enum",
            Self::Array => "array",
        }
    }
}
