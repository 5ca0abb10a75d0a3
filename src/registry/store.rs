//! The registry aggregate.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::Value;

/// Association between a tool name and its provider(s).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// Exactly one provider claimed the name.
    Single(PathBuf),
    /// Two or more providers claimed the name, newest claimant first. The
    /// name is unusable: `tools/list` refuses and `tools/call` errors.
    Duplicate(Vec<PathBuf>),
}

/// Why a provider's `list` output was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingError {
    /// The provider executable.
    pub provider: PathBuf,
    /// Human-readable rejection reason.
    pub reason: String,
}

impl ListingError {
    pub fn new(provider: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self { provider: provider.into(), reason: reason.into() }
    }
}

impl fmt::Display for ListingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider.display(), self.reason)
    }
}

/// The startup-built registry of discoverable tools.
///
/// Ordered by discovery: `names` holds each claimed tool name exactly once,
/// in first-claim order, and `definitions` preserves that order for the
/// names that stayed unambiguous. Any listing error or duplicate poisons
/// `tools/list` wholesale; duplicates additionally poison `tools/call` for
/// the affected name.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    /// Tool names in discovery order, each at most once
    names: Vec<String>,

    /// Name → provider binding
    bindings: HashMap<String, Binding>,

    /// Aggregated pass-through definitions, duplicates excluded
    definitions: Vec<Value>,

    /// Per-provider listing failures
    errors: Vec<ListingError>,

    /// Trimmed instruction blurbs in provider discovery order
    instructions: Vec<String>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit one tool definition claimed by `provider`.
    ///
    /// The first claim installs a [`Binding::Single`] and contributes the
    /// definition to the aggregate. Any later claim converts the binding to
    /// [`Binding::Duplicate`] (new claimant first) and withdraws the
    /// previously contributed definition.
    pub fn submit(&mut self, name: &str, provider: &Path, definition: Value) {
        match self.bindings.entry(name.to_string()) {
            Entry::Vacant(slot) => {
                self.names.push(name.to_string());
                slot.insert(Binding::Single(provider.to_path_buf()));
                self.definitions.push(definition);
            }
            Entry::Occupied(mut slot) => {
                let poisoned = match slot.get() {
                    Binding::Single(previous) => {
                        Binding::Duplicate(vec![provider.to_path_buf(), previous.clone()])
                    }
                    Binding::Duplicate(claimants) => {
                        let mut claimants = claimants.clone();
                        claimants.insert(0, provider.to_path_buf());
                        Binding::Duplicate(claimants)
                    }
                };
                slot.insert(poisoned);
                self.definitions
                    .retain(|d| d.get("name").and_then(Value::as_str) != Some(name));
            }
        }
    }

    /// Record a listing failure for `provider`.
    pub fn record_error(&mut self, provider: &Path, reason: impl Into<String>) {
        self.errors.push(ListingError::new(provider, reason));
    }

    /// Append an instructions blurb; trimmed, empty blurbs are dropped.
    pub fn add_instructions(&mut self, blurb: &str) {
        let trimmed = blurb.trim();
        if !trimmed.is_empty() {
            self.instructions.push(trimmed.to_string());
        }
    }

    /// Tool names in discovery order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The aggregated definitions served by `tools/list`.
    pub fn definitions(&self) -> &[Value] {
        &self.definitions
    }

    /// Look up the binding for a tool name.
    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    /// Duplicated names with their claimants, in discovery order.
    pub fn duplicates(&self) -> Vec<(&str, &[PathBuf])> {
        self.names
            .iter()
            .filter_map(|name| match self.bindings.get(name) {
                Some(Binding::Duplicate(claimants)) => {
                    Some((name.as_str(), claimants.as_slice()))
                }
                _ => None,
            })
            .collect()
    }

    /// Whether any name was claimed more than once.
    pub fn has_duplicates(&self) -> bool {
        self.bindings.values().any(|b| matches!(b, Binding::Duplicate(_)))
    }

    /// Per-provider listing failures.
    pub fn errors(&self) -> &[ListingError] {
        &self.errors
    }

    /// Instruction blurbs in provider discovery order.
    pub fn instructions(&self) -> &[String] {
        &self.instructions
    }
}
