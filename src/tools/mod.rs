//! Operations exposed to agents, and the registry the hosting protocol
//! dispatches through.

mod args;
mod catalog;
mod context;
mod location;
mod transits;

pub use context::TransitContext;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use utoipa::ToSchema;

use crate::error::TransitError;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: &'static str, message: String },
    #[error(transparent)]
    Transit(#[from] TransitError),
    #[error("failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Number,
    Boolean,
    Timestamp,
}

impl ParamType {
    fn schema(self) -> Map<String, Value> {
        let mut schema = Map::new();
        let (kind, format) = match self {
            ParamType::String => ("string", None),
            ParamType::Number => ("number", None),
            ParamType::Boolean => ("boolean", None),
            ParamType::Timestamp => ("string", Some("date-time")),
        };
        schema.insert("type".into(), kind.into());
        if let Some(format) = format {
            schema.insert("format".into(), format.into());
        }
        schema
    }
}

/// One declared argument of a tool.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamType,
    pub description: &'static str,
    pub default: Option<Value>,
}

impl ParamSpec {
    pub fn required(name: &'static str, kind: ParamType, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            default: None,
        }
    }

    pub fn optional(
        name: &'static str,
        kind: ParamType,
        description: &'static str,
        default: Value,
    ) -> Self {
        Self {
            name,
            kind,
            description,
            default: Some(default),
        }
    }
}

/// What a client sees when it lists tools.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[schema(value_type = Object)]
    pub input_schema: Value,
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn params(&self) -> Vec<ParamSpec>;

    /// Run the tool. Failures are raised as errors, never encoded in the value.
    async fn call(&self, ctx: &TransitContext, args: Value) -> Result<Value, ToolError>;

    fn descriptor(&self) -> ToolDescriptor {
        let params = self.params();
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in &params {
            let mut schema = param.kind.schema();
            schema.insert("description".into(), param.description.into());
            match &param.default {
                Some(default) => {
                    schema.insert("default".into(), default.clone());
                }
                None => required.push(Value::from(param.name)),
            }
            properties.insert(param.name.to_string(), Value::Object(schema));
        }

        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        }
    }
}

/// Name-to-tool mapping built once at startup.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Registry holding every tool this crate provides.
    pub fn with_default_tools() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(catalog::NameFromNoradId));
        registry.register(Box::new(catalog::NoradIdFromName));
        registry.register(Box::new(catalog::GetTle));
        registry.register(Box::new(location::LatitudeLongitudeFromLocationName));
        registry.register(Box::new(transits::GetTransits));
        registry.register(Box::new(transits::GetWeatherForecast));
        registry
    }

    /// Add a tool, replacing any tool already registered under its name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|t| t.descriptor()).collect()
    }

    pub async fn call(
        &self,
        ctx: &TransitContext,
        name: &str,
        args: Value,
    ) -> Result<Value, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        log::debug!("calling {} with {}", name, args);
        tool.call(ctx, args).await
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::with_default_tools()
    }
}
