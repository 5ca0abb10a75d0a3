//! # Toolshed
//!
//! An MCP (Model Context Protocol) server that exposes a directory of
//! standalone executables as tools over a line-delimited JSON-RPC 2.0
//! transport on stdin/stdout.
//!
//! Tools are not compiled in. Each executable in the tool directory is a
//! *provider*: invoked with `list` it prints one JSON definition per tool it
//! offers, invoked with `instructions` it may print free-form usage text,
//! and invoked with an advertised tool name plus a JSON argument string it
//! performs the call and prints an MCP tool result object.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                MCP client (agent host)            │
//! └───────────────┬──────────────────────────────────┘
//!                 │ JSON-RPC 2.0, one request per line
//! ┌───────────────▼──────────────────────────────────┐
//! │  Dispatcher ── ToolRegistry (built once at start) │
//! │       │              ▲                            │
//! │       │              │ RegistryBuilder            │
//! │       ▼              │                            │
//! │  ToolRunner ─────────┴── tools/ directory         │
//! │  (spawn provider, capture stdout/stderr/combined) │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! The registry is immutable after startup; concurrency exists only inside
//! the runner, where one reader thread per output pipe feeds a shared
//! combined buffer.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]

pub mod logger;
pub mod registry;
pub mod rpc;
pub mod runner;

pub use logger::{FileLogger, DEFAULT_LOG_PATH};
pub use registry::{Binding, ListingError, RegistryBuilder, ToolRegistry};
pub use rpc::{
    Dispatcher, InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ServerCapabilities,
    ServerInfo, PROTOCOL_VERSION,
};
pub use runner::{CaptureResult, ParsedCapture, RunnerError, ToolRunner};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "toolshed";
