//! Tools exposed to the conversational model.
//!
//! Each tool has typed arguments with a generated JSON schema. Incoming calls
//! are parsed into a [`ToolCommand`] and dispatched through [`ToolHandler`].

use async_trait::async_trait;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

pub const CONSULT_GUIDELINES: &str = "consult_guidelines";
pub const SEND_INCIDENT_NOTE: &str = "send_incident_note";
pub const SAVE_IMAGE_URL: &str = "save_image_url";
pub const UPDATE_LOCATION: &str = "update_location";

/// Accept strings, numbers, booleans and null where a string is expected.
///
/// Models often send `"casualties": 2` or `null` for an unknown field.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, JsonSchema)]
pub struct ConsultGuidelinesArgs {
    /// Topic
    #[serde(default, deserialize_with = "lenient_string")]
    pub query: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, JsonSchema)]
pub struct SendIncidentNoteArgs {
    /// Type of emergency
    #[serde(default, deserialize_with = "lenient_string")]
    pub incident_type: String,
    /// City
    #[serde(default, deserialize_with = "lenient_string")]
    pub city: String,
    /// Address
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: String,
    /// Casualties info
    #[serde(default, deserialize_with = "lenient_string")]
    pub casualties: String,
    /// Details
    #[serde(default, deserialize_with = "lenient_string")]
    pub details: String,
    /// Service to notify
    #[serde(default, deserialize_with = "lenient_string")]
    pub recommended_service: String,
    /// Lat,Lng
    #[serde(default, deserialize_with = "lenient_string")]
    pub coordinates: String,
    /// Scene description; a stored image analysis takes precedence
    #[serde(default, deserialize_with = "lenient_string")]
    pub photo_summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, JsonSchema)]
pub struct SaveImageUrlArgs {
    /// Image URL
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, JsonSchema)]
pub struct UpdateLocationArgs {
    pub lat: f64,
    pub lng: f64,
}

/// A parsed tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCommand {
    ConsultGuidelines(ConsultGuidelinesArgs),
    SendIncidentNote(SendIncidentNoteArgs),
    SaveImageUrl(SaveImageUrlArgs),
    UpdateLocation(UpdateLocationArgs),
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Failed to parse arguments for {tool}: {reason}")]
    ArgumentParse { tool: String, reason: String },
}

impl ToolCommand {
    /// Parse a call by tool name and JSON-encoded arguments.
    ///
    /// Empty arguments are treated as `{}`.
    pub fn parse(name: &str, arguments: &str) -> Result<Self, ToolError> {
        let arguments = if arguments.trim().is_empty() {
            "{}"
        } else {
            arguments
        };

        fn args<T: serde::de::DeserializeOwned>(tool: &str, raw: &str) -> Result<T, ToolError> {
            serde_json::from_str(raw).map_err(|e| ToolError::ArgumentParse {
                tool: tool.to_string(),
                reason: e.to_string(),
            })
        }

        match name {
            CONSULT_GUIDELINES => Ok(Self::ConsultGuidelines(args(name, arguments)?)),
            SEND_INCIDENT_NOTE => Ok(Self::SendIncidentNote(args(name, arguments)?)),
            SAVE_IMAGE_URL => Ok(Self::SaveImageUrl(args(name, arguments)?)),
            UPDATE_LOCATION => Ok(Self::UpdateLocation(args(name, arguments)?)),
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ConsultGuidelines(_) => CONSULT_GUIDELINES,
            Self::SendIncidentNote(_) => SEND_INCIDENT_NOTE,
            Self::SaveImageUrl(_) => SAVE_IMAGE_URL,
            Self::UpdateLocation(_) => UPDATE_LOCATION,
        }
    }
}

/// Tool definition in function-calling format.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDefinition {
    fn of<T: JsonSchema>(name: &str, description: &str) -> Self {
        let mut parameters = serde_json::to_value(schema_for!(T)).unwrap_or_default();
        if let Value::Object(map) = &mut parameters {
            map.remove("$schema");
            map.remove("title");
            map.insert("additionalProperties".to_string(), Value::Bool(false));
        }

        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
        }
    }

    pub fn to_openai_format(&self) -> Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters
            }
        })
    }
}

/// Every tool the assistant may call.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::of::<ConsultGuidelinesArgs>(
            CONSULT_GUIDELINES,
            "Consult emergency guidelines.",
        ),
        ToolDefinition::of::<SendIncidentNoteArgs>(
            SEND_INCIDENT_NOTE,
            "Send incident report to emergency services.",
        ),
        ToolDefinition::of::<SaveImageUrlArgs>(SAVE_IMAGE_URL, "Save image URL."),
        ToolDefinition::of::<UpdateLocationArgs>(
            UPDATE_LOCATION,
            "Update the caller's GPS position.",
        ),
    ]
}

/// Executes parsed tool commands against one conversation.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, command: ToolCommand) -> String;

    /// Parse and execute a raw call. Parse failures become an error string
    /// for the model rather than a transport error.
    async fn handle_call(&self, name: &str, arguments: &str) -> String {
        match ToolCommand::parse(name, arguments) {
            Ok(command) => self.handle(command).await,
            Err(e) => {
                warn!(tool = %name, error = %e, "Rejected tool call");
                format!("Error: {}", e)
            }
        }
    }
}
