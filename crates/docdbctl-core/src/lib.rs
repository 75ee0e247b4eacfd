//! # docdbctl-core
//!
//! Core library for the docdbctl CLI: a declarative command parameter binder
//! plus the collaborators around it.
//!
//! - [`schema`] — flag definitions registered against hierarchical command
//!   scopes, with parent-to-child inheritance and override-by-specificity;
//!   the registry generates the runtime clap parser.
//! - [`validate`] — pure validators (range, set membership, CIDR lists,
//!   `key=priority` pairs, tags) applied as an ordered pipeline per flag.
//! - [`bag`] — the per-invocation [`bag::ArgumentBag`] and [`bag::bind`],
//!   which turns raw parsed flags into normalized values or a full report of
//!   validation failures.
//! - [`dispatch`] — forwards a validated bag to a bound external operation
//!   and passes its result or error through unchanged.
//! - [`client`] — async management-plane HTTP client.
//! - [`config`] — TOML profile configuration with environment overrides.
//!
//! The registry is populated once at startup and read-only afterwards; each
//! invocation runs Parse → Resolve Scope → Validate → Dispatch exactly once
//! with no shared mutable state.

pub mod bag;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod schema;
pub mod validate;

pub use bag::{ArgumentBag, FlagValue, bind};
pub use client::{AccountClient, RestError};
pub use config::{Config, ConfigError, Profile};
pub use dispatch::{Dispatcher, Operation};
pub use error::{CoreError, Result};
pub use schema::{CrossRule, FlagDef, RawArgs, SchemaRegistry, ValueKind};
pub use validate::{ValidationError, ValidationKind, Validator};
