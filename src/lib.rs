//! Contextual import-alias resolution for linked local packages.
//!
//! When a front-end package is checked out next to the application that
//! consumes it and wired in with a package link, the same alias (say `@/`)
//! has to mean two different things: inside the linked package it points
//! at the package's own sources, everywhere else at the application's.
//! This crate models those rewrite rules, classifies each importer, and
//! resolves specifiers accordingly. [`AliasEngine`] is the entry point;
//! [`scan`] builds per-file reports for the CLI.

pub mod alias;
pub mod config;
pub mod env;
pub mod error;
pub mod lookup;
pub mod resolver;
pub mod scan;

pub use alias::{
    build_rules, AliasDecl, AliasRule, ContextualRule, ImporterSide, Pattern, StaticRule,
};
pub use config::{find_config, load_config, Config, CONFIG_FILE};
pub use env::{Environment, StaticAliasPolicy};
pub use error::RelinkError;
pub use lookup::{DiskLookup, ModuleId, ModuleLookup, EXTENSIONS};
pub use resolver::{AliasEngine, Resolution, ResolveRequest};
