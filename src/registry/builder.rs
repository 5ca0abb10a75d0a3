//! Building the registry from a tool directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::ToolRegistry;
use crate::logger::FileLogger;
use crate::runner::ToolRunner;

/// Discovers providers and assembles the [`ToolRegistry`].
///
/// The scan is non-recursive: every regular executable file directly inside
/// the tool directory is a provider. Entries are visited in lexicographic
/// file-name order so discovery is reproducible across platforms. A missing
/// directory yields an empty registry, not an error.
pub struct RegistryBuilder {
    /// Directory holding provider executables
    tools_dir: PathBuf,

    /// Runner used for `list` and `instructions` invocations
    runner: ToolRunner,

    /// Server log
    logger: FileLogger,
}

impl RegistryBuilder {
    /// Create a builder for the given tool directory.
    pub fn new(tools_dir: impl Into<PathBuf>, logger: FileLogger) -> Self {
        Self { tools_dir: tools_dir.into(), runner: ToolRunner::new(), logger }
    }

    /// Replace the runner (used to tighten timing in tests).
    #[must_use]
    pub fn with_runner(mut self, runner: ToolRunner) -> Self {
        self.runner = runner;
        self
    }

    /// Enumerate providers and build the registry.
    pub fn build(&self) -> ToolRegistry {
        let mut registry = ToolRegistry::new();

        let providers = self.discover_providers();
        for provider in &providers {
            self.list_provider(&mut registry, provider);
            self.collect_instructions(&mut registry, provider);
        }

        for error in registry.errors() {
            self.logger.error(&format!("tool listing failed: {error}"));
        }
        for (name, claimants) in registry.duplicates() {
            self.logger.error(&format!(
                "duplicate tool name `{}` claimed by {}",
                name,
                join_paths(claimants)
            ));
        }
        self.logger.info(&format!(
            "registry built: {} tool(s) from {} provider(s), {} duplicate(s), {} listing error(s)",
            registry.definitions().len(),
            providers.len(),
            registry.duplicates().len(),
            registry.errors().len()
        ));

        registry
    }

    /// Regular executable files directly inside the tool directory, sorted.
    fn discover_providers(&self) -> Vec<PathBuf> {
        let entries = match fs::read_dir(&self.tools_dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(
                    dir = %self.tools_dir.display(),
                    error = %e,
                    "tool directory not readable, serving empty toolbox"
                );
                return Vec::new();
            }
        };

        let mut providers: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|e| e.path())
            .filter(|p| is_executable(p))
            .collect();
        providers.sort();
        providers
    }

    /// Invoke `list` on one provider and feed its definitions in.
    fn list_provider(&self, registry: &mut ToolRegistry, provider: &Path) {
        let capture = match self.runner.run(provider, "list", None) {
            Ok(capture) => capture,
            Err(e) => {
                registry.record_error(provider, format!("parse error: {e}"));
                return;
            }
        };

        if !capture.success() {
            registry.record_error(provider, capture.combined_text().trim().to_string());
            return;
        }

        let stdout = capture.stdout_text();
        let values = match slurp_json(&stdout) {
            Ok(values) => values,
            Err(e) => {
                registry.record_error(provider, format!("invalid JSON in list output: {e}"));
                return;
            }
        };

        if values.is_empty() {
            tracing::debug!(provider = %provider.display(), "provider advertises no tools");
        }

        for value in values {
            if !value.is_object() {
                registry.record_error(provider, "tool definition is not a JSON object");
                continue;
            }
            let name = value
                .get("name")
                .and_then(Value::as_str)
                .filter(|n| !n.is_empty())
                .map(str::to_owned);
            match name {
                Some(name) => {
                    tracing::debug!(
                        provider = %provider.display(),
                        tool = %name,
                        "discovered tool"
                    );
                    registry.submit(&name, provider, value);
                }
                None => registry.record_error(provider, "tool definition missing name"),
            }
        }
    }

    /// Invoke the optional `instructions` subcommand on one provider.
    ///
    /// Failures and empty output are logged but never surfaced as listing
    /// errors; the subcommand is optional.
    fn collect_instructions(&self, registry: &mut ToolRegistry, provider: &Path) {
        match self.runner.run(provider, "instructions", None) {
            Ok(capture) if capture.success() => {
                let text = capture.stdout_text();
                if text.trim().is_empty() {
                    tracing::debug!(provider = %provider.display(), "no instructions");
                } else {
                    registry.add_instructions(&text);
                }
            }
            Ok(capture) => {
                tracing::debug!(
                    provider = %provider.display(),
                    status = capture.status,
                    "instructions subcommand declined"
                );
            }
            Err(e) => {
                tracing::debug!(
                    provider = %provider.display(),
                    error = %e,
                    "instructions invocation failed"
                );
            }
        }
    }
}

/// Join paths for a diagnostic message.
fn join_paths(paths: &[PathBuf]) -> String {
    paths.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
}

/// Collect every top-level JSON value from a provider's `list` output.
fn slurp_json(stdout: &str) -> Result<Vec<Value>, serde_json::Error> {
    serde_json::Deserializer::from_str(stdout).into_iter::<Value>().collect()
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).map(|m| m.permissions().mode() & 0o111 != 0).unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    true
}
