//! JSON-RPC 2.0 transport and method dispatch.
//!
//! Implements the serving side of the MCP stdio transport: one request per
//! input line, one response per request, notifications answered with
//! silence. The dispatcher owns the registry and runner and is the only
//! place where registry state is turned into client-facing errors.

mod descriptor;
mod dispatcher;
mod protocol;

pub use descriptor::{
    concat_instructions, InitializeResult, ServerCapabilities, ServerInfo, ToolsCapability,
    PROTOCOL_VERSION,
};
pub use dispatcher::Dispatcher;
pub use protocol::{CallToolParams, JsonRpcError, JsonRpcRequest, JsonRpcResponse};
