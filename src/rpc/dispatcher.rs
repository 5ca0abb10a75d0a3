//! Request routing and the serve loop.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use serde_json::{json, Value};

use super::descriptor::InitializeResult;
use super::protocol::{
    CallToolParams, JsonRpcError, JsonRpcRequest, JsonRpcResponse, JSONRPC_VERSION,
};
use crate::logger::FileLogger;
use crate::registry::{Binding, ToolRegistry};
use crate::runner::{ParsedCapture, ToolRunner};

/// Routes newline-delimited JSON-RPC requests to their handlers.
///
/// The dispatcher is strictly serial: one request in, one response out, in
/// order. A `tools/call` blocks the loop until the child completes or the
/// runner's drain policy cuts it off. Nothing here mutates the registry.
pub struct Dispatcher {
    /// Startup-built tool registry
    registry: ToolRegistry,

    /// Runner for `tools/call` executions
    runner: ToolRunner,

    /// Server log
    logger: FileLogger,
}

impl Dispatcher {
    /// Create a dispatcher over a built registry.
    pub fn new(registry: ToolRegistry, logger: FileLogger) -> Self {
        Self { registry, runner: ToolRunner::new(), logger }
    }

    /// Replace the runner (used to tighten timing in tests).
    #[must_use]
    pub fn with_runner(mut self, runner: ToolRunner) -> Self {
        self.runner = runner;
        self
    }

    /// Serve requests until EOF on `reader`.
    ///
    /// Blank lines are skipped; a bad line never ends the loop. Responses
    /// are written in the exact order requests were read.
    pub fn run(&self, reader: impl BufRead, mut writer: impl Write) -> std::io::Result<()> {
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            if let Some(response) = self.handle_line(&line) {
                writeln!(writer, "{response}")?;
                writer.flush()?;
            }
        }
        self.logger.info("stdin closed, shutting down");
        Ok(())
    }

    /// Process one input line.
    ///
    /// Returns `None` when no response is owed: the line was a notification,
    /// or the response itself could not be serialized (logged and dropped).
    pub fn handle_line(&self, line: &str) -> Option<String> {
        let response = self.dispatch(line)?;
        match serde_json::to_string(&response) {
            Ok(serialized) => Some(serialized),
            Err(e) => {
                self.logger.error(&format!("failed to serialize response: {e}"));
                None
            }
        }
    }

    fn dispatch(&self, line: &str) -> Option<JsonRpcResponse> {
        let raw: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                self.logger.error(&format!("unparseable request line: {e}"));
                return Some(JsonRpcResponse::failure(Value::Null, JsonRpcError::parse_error()));
            }
        };

        let request: JsonRpcRequest = match serde_json::from_value(raw) {
            Ok(request) => request,
            Err(_) => {
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::invalid_request("request must be a JSON object"),
                ));
            }
        };

        // Notifications get no response, even from clients that mis-send an
        // id with them.
        if request.method.as_deref() == Some("notifications/initialized") {
            self.logger.info("client reported initialized");
            return None;
        }

        let id = request.id.clone().filter(Value::is_number).unwrap_or(Value::Null);
        if let Err(error) = validate_envelope(&request) {
            return Some(JsonRpcResponse::failure(id, error));
        }
        let method = request.method.as_deref().unwrap_or_default();

        let result = match method {
            "initialize" => self.handle_initialize(),
            "tools/list" => self.handle_tools_list(),
            "tools/call" => self.handle_tools_call(request.params.clone()),
            "resources/list" => Ok(json!({ "resources": [] })),
            "resources/templates/list" => Ok(json!({ "resourceTemplates": [] })),
            "prompts/list" => Ok(json!({ "prompts": [] })),
            _ => Err(JsonRpcError::method_not_found("Method not found")),
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(error) => {
                self.logger.error(&format!("{method}: {error}"));
                JsonRpcResponse::failure(id, error)
            }
        })
    }

    fn handle_initialize(&self) -> Result<Value, JsonRpcError> {
        self.logger.info("initialize requested");
        serde_json::to_value(InitializeResult::new(self.registry.instructions()))
            .map_err(|e| JsonRpcError::internal(format!("failed to build initialize result: {e}")))
    }

    fn handle_tools_list(&self) -> Result<Value, JsonRpcError> {
        let errors = self.registry.errors();
        if !errors.is_empty() {
            let joined =
                errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ");
            return Err(JsonRpcError::internal(format!("Tool listing failed: {joined}")));
        }

        if self.registry.has_duplicates() {
            let described = self
                .registry
                .duplicates()
                .iter()
                .map(|(name, claimants)| format!("`{name}` claimed by {}", join_paths(claimants)))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(JsonRpcError::internal(format!("Duplicate tool names: {described}")));
        }

        Ok(json!({ "tools": self.registry.definitions() }))
    }

    fn handle_tools_call(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: CallToolParams =
            serde_json::from_value(params.unwrap_or_else(|| json!({}))).map_err(|e| {
                JsonRpcError::invalid_params(format!("invalid tools/call params: {e}"))
            })?;
        let arguments = params.arguments_or_default();

        let provider = match self.registry.lookup(&params.name) {
            None => {
                return Err(JsonRpcError::method_not_found(format!(
                    "Tool not found: {}",
                    params.name
                )))
            }
            Some(Binding::Duplicate(claimants)) => {
                return Err(JsonRpcError::internal(format!(
                    "Tool `{}` is claimed by multiple providers: {}",
                    params.name,
                    join_paths(claimants)
                )));
            }
            Some(Binding::Single(path)) => path.clone(),
        };

        let serialized_args = serde_json::to_string(&arguments)
            .map_err(|e| JsonRpcError::internal(format!("failed to serialize arguments: {e}")))?;

        let capture = self
            .runner
            .run(&provider, &params.name, Some(&serialized_args))
            .map_err(|e| {
                JsonRpcError::internal(format!("Tool `{}` output parse error: {e}", params.name))
            })?;
        let parsed = ParsedCapture::from(capture);

        // Child stderr goes to the log in every branch.
        if !parsed.stderr.is_empty() {
            self.logger
                .info(&format!("tool `{}` stderr: {}", params.name, parsed.stderr.trim_end()));
        }

        if !parsed.success() {
            return Err(JsonRpcError::internal(format!(
                "Tool `{}` failed (exit {}): {}",
                params.name,
                parsed.status,
                parsed.combined.trim_end()
            )));
        }

        match parsed.payload {
            Some(payload) if parsed.mcp_shaped => Ok(payload),
            _ => Err(JsonRpcError::internal(format!(
                "Tool `{}` returned invalid JSON: {}",
                params.name,
                parsed.stdout.trim_end()
            ))),
        }
    }
}

/// Enforce the JSON-RPC 2.0 envelope rules.
fn validate_envelope(request: &JsonRpcRequest) -> Result<(), JsonRpcError> {
    if request.jsonrpc.as_deref() != Some(JSONRPC_VERSION) {
        return Err(JsonRpcError::invalid_request("jsonrpc must be \"2.0\""));
    }
    if request.method.as_deref().map_or(true, str::is_empty) {
        return Err(JsonRpcError::invalid_request("method must be a non-empty string"));
    }
    match request.id {
        Some(ref id) if id.is_number() => {}
        _ => return Err(JsonRpcError::invalid_request("id must be a number")),
    }
    if let Some(params) = &request.params {
        if !params.is_object() {
            return Err(JsonRpcError::invalid_request("params must be an object"));
        }
    }
    Ok(())
}

/// Join paths for a diagnostic message.
fn join_paths(paths: &[PathBuf]) -> String {
    paths.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
}
