//! The `initialize` reply.

use serde::Serialize;

/// MCP protocol revision this server speaks.
pub const PROTOCOL_VERSION: &str = "2025-06-18";

/// Leading sentence of the `instructions` field.
const BASE_INSTRUCTIONS: &str =
    "This server exposes a directory of standalone executables as MCP tools; \
     call them with tools/call after discovering them with tools/list.";

/// Result of the `initialize` handshake.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// Protocol version
    pub protocol_version: String,

    /// Declared capabilities
    pub capabilities: ServerCapabilities,

    /// Server identity
    pub server_info: ServerInfo,

    /// Usage text: base sentence plus provider blurbs
    pub instructions: String,
}

impl InitializeResult {
    /// Build the reply from the collected instruction blurbs.
    pub fn new(blurbs: &[String]) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities::default(),
            server_info: ServerInfo::default(),
            instructions: concat_instructions(blurbs),
        }
    }
}

/// Server capabilities.
#[derive(Debug, Clone, Serialize)]
pub struct ServerCapabilities {
    /// Tool capabilities
    pub tools: ToolsCapability,
}

impl Default for ServerCapabilities {
    fn default() -> Self {
        Self { tools: ToolsCapability { list_changed: true } }
    }
}

/// Tool capabilities.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    /// Whether the server may announce tool list changes
    pub list_changed: bool,
}

/// Server identity.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    /// Server name
    pub name: String,

    /// Server version
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Concatenate the base sentence with trimmed blurbs, blank-line separated.
///
/// An empty blurb set yields only the base sentence, never a trailing
/// separator.
pub fn concat_instructions(blurbs: &[String]) -> String {
    let mut out = String::from(BASE_INSTRUCTIONS);
    for blurb in blurbs {
        let trimmed = blurb.trim();
        if !trimmed.is_empty() {
            out.push_str("\n\n");
            out.push_str(trimmed);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_blurbs_yield_base_sentence_only() {
        let text = concat_instructions(&[]);
        assert!(text.starts_with("This server exposes"));
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn test_blurbs_are_blank_line_separated() {
        let blurbs = vec!["first".to_string(), "second".to_string()];
        let text = concat_instructions(&blurbs);
        assert!(text.ends_with("first\n\nsecond"));
    }

    #[test]
    fn test_concatenation_is_trimming_idempotent() {
        let tight = vec!["guidance".to_string()];
        let padded = vec!["\n  guidance \t\n".to_string()];
        assert_eq!(concat_instructions(&tight), concat_instructions(&padded));
    }

    #[test]
    fn test_initialize_result_shape() {
        let result = InitializeResult::new(&[]);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(value["capabilities"]["tools"]["listChanged"], true);
        assert_eq!(value["serverInfo"]["name"], env!("CARGO_PKG_NAME"));
        assert!(value["instructions"].as_str().unwrap().starts_with("This server"));
    }
}
