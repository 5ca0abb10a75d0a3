//! Captured child output and its decoded form.

use serde_json::Value;

/// Raw output of one child execution.
///
/// Buffers hold exactly the bytes the child wrote, in write order for the
/// combined stream. Nothing is appended or reframed.
#[derive(Debug, Clone, Default)]
pub struct CaptureResult {
    /// Exit status of the direct child (signal deaths map to `128 + signo`
    /// on Unix).
    pub status: i32,
    /// Standard output bytes.
    pub stdout: Vec<u8>,
    /// Standard error bytes.
    pub stderr: Vec<u8>,
    /// Chronologically interleaved stdout + stderr bytes.
    pub combined: Vec<u8>,
}

impl CaptureResult {
    /// Whether the child exited 0.
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Standard output as text (lossy).
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Standard error as text (lossy).
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Combined stream as text (lossy).
    pub fn combined_text(&self) -> String {
        String::from_utf8_lossy(&self.combined).into_owned()
    }
}

/// A [`CaptureResult`] decoded into typed fields.
///
/// `payload` is the parsed stdout when the entire stream is a single JSON
/// object; `mcp_shaped` additionally requires a top-level `content` field,
/// the minimum shape of an MCP tool result. Malformed JSON is not an error
/// here, it just leaves the predicate false.
#[derive(Debug, Clone)]
pub struct ParsedCapture {
    /// Exit status of the direct child.
    pub status: i32,
    /// Standard output as text.
    pub stdout: String,
    /// Standard error as text.
    pub stderr: String,
    /// Combined interleaved stream as text.
    pub combined: String,
    /// Parsed stdout, present when stdout is exactly one JSON object.
    pub payload: Option<Value>,
    /// True when `payload` carries a `content` field.
    pub mcp_shaped: bool,
}

impl ParsedCapture {
    /// Whether the child exited 0.
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

impl From<CaptureResult> for ParsedCapture {
    fn from(capture: CaptureResult) -> Self {
        let stdout = capture.stdout_text();
        let payload = serde_json::from_str::<Value>(&stdout).ok().filter(Value::is_object);
        let mcp_shaped = payload.as_ref().is_some_and(|v| v.get("content").is_some());

        Self {
            status: capture.status,
            stderr: capture.stderr_text(),
            combined: capture.combined_text(),
            stdout,
            payload,
            mcp_shaped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture_with_stdout(stdout: &str) -> CaptureResult {
        CaptureResult {
            status: 0,
            stdout: stdout.as_bytes().to_vec(),
            stderr: Vec::new(),
            combined: stdout.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_mcp_shaped_output() {
        let parsed =
            ParsedCapture::from(capture_with_stdout(r#"{"content":[],"isError":false}"#));
        assert!(parsed.mcp_shaped);
        assert!(parsed.payload.is_some());
    }

    #[test]
    fn test_object_without_content_is_not_shaped() {
        let parsed = ParsedCapture::from(capture_with_stdout(r#"{"result":"ok"}"#));
        assert!(!parsed.mcp_shaped);
        assert!(parsed.payload.is_some());
    }

    #[test]
    fn test_non_object_json_is_not_shaped() {
        let parsed = ParsedCapture::from(capture_with_stdout(r#"["content"]"#));
        assert!(!parsed.mcp_shaped);
        assert!(parsed.payload.is_none());
    }

    #[test]
    fn test_malformed_json_is_not_shaped() {
        let parsed = ParsedCapture::from(capture_with_stdout("not json at all"));
        assert!(!parsed.mcp_shaped);
        assert!(parsed.payload.is_none());
        assert_eq!(parsed.stdout, "not json at all");
    }

    #[test]
    fn test_trailing_garbage_rejects_payload() {
        let parsed = ParsedCapture::from(capture_with_stdout(r#"{"content":[]} extra"#));
        assert!(!parsed.mcp_shaped);
        assert!(parsed.payload.is_none());
    }

    #[test]
    fn test_surrounding_whitespace_is_tolerated() {
        let parsed = ParsedCapture::from(capture_with_stdout("  {\"content\":[]}\n"));
        assert!(parsed.mcp_shaped);
    }

    #[test]
    fn test_status_and_streams_carry_over() {
        let capture = CaptureResult {
            status: 3,
            stdout: b"out".to_vec(),
            stderr: b"err".to_vec(),
            combined: b"outerr".to_vec(),
        };
        let parsed = ParsedCapture::from(capture);
        assert_eq!(parsed.status, 3);
        assert!(!parsed.success());
        assert_eq!(parsed.stdout, "out");
        assert_eq!(parsed.stderr, "err");
        assert_eq!(parsed.combined, "outerr");
    }
}
