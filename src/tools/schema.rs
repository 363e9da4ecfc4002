//! Tool parameter schemas.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    String,
    Integer,
    Number,
    Boolean,
}

impl ParameterKind {
    fn as_str(&self) -> &'static str {
        match self {
            ParameterKind::String => "string",
            ParameterKind::Integer => "integer",
            ParameterKind::Number => "number",
            ParameterKind::Boolean => "boolean",
        }
    }
}

/// A single named parameter of a tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    pub kind: ParameterKind,
    pub description: String,
    #[serde(default)]
    pub required: bool,
    /// Allowed values, rendered as a JSON Schema `enum`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<Value>,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, kind: ParameterKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: false,
            allowed: Vec::new(),
        }
    }

    /// Mark the parameter as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Restrict the parameter to a fixed set of values.
    pub fn with_allowed(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.allowed = values.into_iter().collect();
        self
    }
}

/// Name, description and parameters of a tool as presented to the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterSpec>,
}

impl ToolSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Render the parameters as a JSON Schema object.
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.parameters {
            let mut property = json!({
                "type": param.kind.as_str(),
                "description": param.description,
            });
            if !param.allowed.is_empty() {
                property["enum"] = Value::Array(param.allowed.clone());
            }
            properties.insert(param.name.clone(), property);
        }

        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_schema() {
        let schema = ToolSchema::new("search_course_content", "Search")
            .with_parameter(ParameterSpec::new("query", ParameterKind::String, "What to search for").required())
            .with_parameter(ParameterSpec::new("lesson_number", ParameterKind::Integer, "Lesson"))
            .with_parameter(
                ParameterSpec::new("format", ParameterKind::String, "Output format")
                    .with_allowed([json!("short"), json!("long")]),
            );

        let value = schema.input_schema();
        assert_eq!(value["type"], "object");
        assert_eq!(value["properties"]["query"]["type"], "string");
        assert_eq!(value["properties"]["lesson_number"]["type"], "integer");
        assert_eq!(value["properties"]["format"]["enum"], json!(["short", "long"]));
        assert_eq!(value["required"], json!(["query"]));
    }

    #[test]
    fn test_no_parameters() {
        let value = ToolSchema::new("noop", "Nothing").input_schema();
        assert_eq!(value["properties"], json!({}));
        assert_eq!(value["required"], json!([]));
    }
}
