//! Core shared types for javelin.
//!
//! This crate is intentionally small: names, modifiers, access levels and the
//! ambient configuration/logging bootstrap shared by every other crate.

pub mod config;
pub mod logging;
mod modifiers;
mod names;

pub use config::{ConfigError, LogConfig, ResolverConfig};
pub use modifiers::{access_flags, AccessSpecifier, MemberKind, Modifier, ModifierSet};
pub use names::{Name, PackageName, QualifiedName};
