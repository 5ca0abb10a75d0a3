//! Tool discovery and the tool registry.
//!
//! At startup the [`RegistryBuilder`] enumerates the tool directory, asks
//! each executable for its tool definitions (`list`) and optional usage text
//! (`instructions`), and produces a [`ToolRegistry`]: an immutable aggregate
//! of name→provider bindings, pass-through definitions, name collisions, and
//! listing failures. The registry is never mutated once the request loop
//! starts.

mod builder;
mod store;

pub use builder::RegistryBuilder;
pub use store::{Binding, ListingError, ToolRegistry};
