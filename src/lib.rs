//! Propose column mappings from a legacy relational schema to a modern one,
//! with confidence scores, and turn the accepted mappings into an
//! `INSERT ... SELECT` migration script.
//!
//! Pipeline: [`db`] extracts a [`types::SchemaSnapshot`] from each database,
//! [`index`] embeds the modern schema for candidate retrieval, a
//! [`resolve::Resolver`] picks one target per legacy column, [`engine`]
//! filters by confidence into a [`types::SchemaMapping`], and [`script`]
//! emits the migration.

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod export;
pub mod index;
pub mod report;
pub mod resolve;
pub mod review;
pub mod script;
pub mod types;

pub use engine::MappingEngine;
pub use error::{MapperError, Result};
