//! Orchestrator/worker message protocol
//!
//! Both directions carry JSON records of the form `{ "name": ..., "args": ... }`.
//! The orchestrator sends one `obfuscate` command; the worker answers with any
//! number of `progress` events followed by exactly one `success` or `fail`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use webobf_core::ObfuscateError;

/// Operation name carried by terminal messages
pub const OPERATION: &str = "obfuscate";

/// Raw wire record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub name: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

impl Envelope {
    pub fn new(name: impl Into<String>, args: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Wrap a typed message
    pub fn encode<M: Message>(message: &M) -> Self {
        match serde_json::to_value(message) {
            Ok(value) => serde_json::from_value(value)
                .unwrap_or_else(|_| Envelope::new(message.name(), serde_json::Value::Null)),
            Err(_) => Envelope::new(message.name(), serde_json::Value::Null),
        }
    }

    /// Decode into a typed message; unknown names and bad args are protocol errors
    pub fn decode<M: Message>(&self) -> Result<M, ObfuscateError> {
        if !M::NAMES.contains(&self.name.as_str()) {
            return Err(ObfuscateError::unknown_message(&self.name));
        }
        let value = serde_json::json!({ "name": self.name, "args": self.args });
        serde_json::from_value(value).map_err(|e| {
            ObfuscateError::Protocol(format!("Invalid args for {}: {}", self.name, e))
        })
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn from_json(json: &str) -> Result<Self, ObfuscateError> {
        serde_json::from_str(json)
            .map_err(|e| ObfuscateError::Protocol(format!("Malformed message: {}", e)))
    }
}

/// A typed message that travels inside an [`Envelope`]
pub trait Message: Serialize + DeserializeOwned {
    /// Every name this message type understands
    const NAMES: &'static [&'static str];

    fn name(&self) -> &'static str;
}

/// Arguments of the start command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartArgs {
    /// Source project directory
    pub source: String,
    /// Obfuscation level: low, normal or high
    #[serde(default = "default_level")]
    pub level: String,
    /// Output directory, `<source>_Obfuscated` when null
    #[serde(default)]
    pub output: Option<String>,
    /// Explicit webobf.toml path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
    /// Directory holding `<level>.json` script options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_dir: Option<String>,
}

fn default_level() -> String {
    "low".to_string()
}

impl StartArgs {
    pub fn new(source: impl Into<String>, level: impl Into<String>, output: Option<String>) -> Self {
        Self {
            source: source.into(),
            level: level.into(),
            output,
            config: None,
            config_dir: None,
        }
    }
}

/// Orchestrator to worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "args", rename_all = "lowercase")]
pub enum Command {
    Obfuscate(StartArgs),
}

impl Message for Command {
    const NAMES: &'static [&'static str] = &["obfuscate"];

    fn name(&self) -> &'static str {
        match self {
            Command::Obfuscate(_) => "obfuscate",
        }
    }
}

/// Worker to orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "args", rename_all = "lowercase")]
pub enum Event {
    Progress { progress: u8, text: String },
    Success { name: String },
    Fail { name: String, error: String },
}

impl Message for Event {
    const NAMES: &'static [&'static str] = &["progress", "success", "fail"];

    fn name(&self) -> &'static str {
        match self {
            Event::Progress { .. } => "progress",
            Event::Success { .. } => "success",
            Event::Fail { .. } => "fail",
        }
    }
}

impl Event {
    pub fn progress(progress: u8, text: impl Into<String>) -> Self {
        Event::Progress {
            progress: progress.min(100),
            text: text.into(),
        }
    }

    pub fn success() -> Self {
        Event::Success {
            name: OPERATION.to_string(),
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Event::Fail {
            name: OPERATION.to_string(),
            error: error.into(),
        }
    }

    /// Whether this event ends the run
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Event::Progress { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_start_command_wire_format() {
        let command = Command::Obfuscate(StartArgs::new("site", "high", None));
        let envelope = Envelope::encode(&command);
        assert_eq!(envelope.name, "obfuscate");
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({ "name": "obfuscate", "args": { "source": "site", "level": "high", "output": null } })
        );
        assert_eq!(envelope.decode::<Command>().unwrap(), command);
    }

    #[test]
    fn test_event_wire_format() {
        assert_eq!(
            serde_json::to_value(Envelope::encode(&Event::progress(42, "Obfuscating a.js"))).unwrap(),
            json!({ "name": "progress", "args": { "progress": 42, "text": "Obfuscating a.js" } })
        );
        assert_eq!(
            serde_json::to_value(Envelope::encode(&Event::success())).unwrap(),
            json!({ "name": "success", "args": { "name": "obfuscate" } })
        );
        assert_eq!(
            serde_json::to_value(Envelope::encode(&Event::fail("1 files failed to obfuscate"))).unwrap(),
            json!({ "name": "fail", "args": { "name": "obfuscate", "error": "1 files failed to obfuscate" } })
        );
    }

    #[test]
    fn test_decode_from_json_text() {
        let envelope = Envelope::from_json(
            r#"{"name":"obfuscate","args":{"source":"site","level":"low","output":"out"}}"#,
        )
        .unwrap();
        let Command::Obfuscate(args) = envelope.decode::<Command>().unwrap();
        assert_eq!(args.output.as_deref(), Some("out"));
        assert_eq!(Envelope::from_json(&envelope.to_json()).unwrap(), envelope);
    }

    #[test]
    fn test_unknown_names_are_protocol_errors() {
        let envelope = Envelope::new("rename", json!({}));
        let err = envelope.decode::<Command>().unwrap_err();
        assert_eq!(err.describe(), "ProtocolError: Unknown message name: rename");

        let err = Envelope::new("obfuscate", json!({})).decode::<Event>().unwrap_err();
        assert_eq!(err.kind(), "ProtocolError");
    }

    #[test]
    fn test_invalid_args_are_protocol_errors() {
        let err = Envelope::new("progress", json!({ "progress": "half" }))
            .decode::<Event>()
            .unwrap_err();
        assert!(err.to_string().starts_with("Invalid args for progress"));
    }

    #[test]
    fn test_progress_is_clamped() {
        assert_eq!(
            Event::progress(150, "x"),
            Event::Progress { progress: 100, text: "x".to_string() }
        );
        assert!(!Event::progress(1, "x").is_terminal());
        assert!(Event::success().is_terminal());
    }
}
