use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const CAPABILITIES_SCHEMA_VERSION: u32 = 1;

/// Machine-readable error envelope returned on every failed command.
#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
    pub hint: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Ok,
    Error,
}

/// Actions exposed by the Command API (CLI `command`, HTTP `/command`).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CommandAction {
    Draw,
    ParseIntent,
    SutraContext,
    Expand,
    States,
    Capabilities,
}

impl CommandAction {
    pub const ALL: [CommandAction; 6] = [
        CommandAction::Draw,
        CommandAction::ParseIntent,
        CommandAction::SutraContext,
        CommandAction::Expand,
        CommandAction::States,
        CommandAction::Capabilities,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            CommandAction::Draw => "draw",
            CommandAction::ParseIntent => "parse_intent",
            CommandAction::SutraContext => "sutra_context",
            CommandAction::Expand => "expand",
            CommandAction::States => "states",
            CommandAction::Capabilities => "capabilities",
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CommandRequest {
    pub action: CommandAction,
    #[serde(default = "empty_payload")]
    pub payload: serde_json::Value,
}

fn empty_payload() -> serde_json::Value {
    serde_json::Value::Object(Default::default())
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct CommandResponse {
    pub status: CommandStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorEnvelope>,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl CommandResponse {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            status: CommandStatus::Ok,
            message: None,
            error: None,
            data,
        }
    }

    pub fn error(code: &str, message: String, hint: Option<String>) -> Self {
        Self {
            status: CommandStatus::Error,
            message: Some(message.clone()),
            error: Some(ErrorEnvelope {
                code: code.to_string(),
                message,
                details: None,
                hint,
            }),
            data: serde_json::Value::Null,
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self.status, CommandStatus::Error)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct CapabilitiesServer {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct Capabilities {
    pub schema_version: u32,
    pub server: CapabilitiesServer,
    pub actions: Vec<String>,
}

impl Capabilities {
    #[must_use]
    pub fn current(server_name: &str, server_version: &str) -> Self {
        Self {
            schema_version: CAPABILITIES_SCHEMA_VERSION,
            server: CapabilitiesServer {
                name: server_name.to_string(),
                version: server_version.to_string(),
            },
            actions: CommandAction::ALL
                .iter()
                .map(|a| a.as_str().to_string())
                .collect(),
        }
    }
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_serialize_snake_case() {
        let raw = serde_json::to_string(&CommandAction::ParseIntent).unwrap();
        assert_eq!(raw, "\"parse_intent\"");
        assert_eq!(CommandAction::SutraContext.as_str(), "sutra_context");
    }

    #[test]
    fn request_defaults_to_empty_payload() {
        let request: CommandRequest = serde_json::from_str(r#"{"action":"draw"}"#).unwrap();
        assert_eq!(request.action, CommandAction::Draw);
        assert!(request.payload.as_object().is_some_and(|m| m.is_empty()));
    }

    #[test]
    fn error_response_carries_envelope() {
        let response = CommandResponse::error("invalid_request", "bad payload".to_string(), None);
        assert!(response.is_error());
        let envelope = response.error.expect("envelope");
        assert_eq!(envelope.code, "invalid_request");
    }

    #[test]
    fn capabilities_list_every_action() {
        let caps = Capabilities::current("darshan", "0.1.0");
        assert_eq!(caps.schema_version, CAPABILITIES_SCHEMA_VERSION);
        assert_eq!(caps.actions.len(), CommandAction::ALL.len());
        assert!(caps.actions.contains(&"draw".to_string()));
    }
}
