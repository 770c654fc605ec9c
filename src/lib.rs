//! Episode catalog: titles with doubly-linked episode chains, watch progress
//! and tags, persisted through a pluggable store.

pub mod config;
pub mod domain;
pub mod infra;
pub mod workflows;

pub use domain::catalog::Catalog;
pub use domain::error::{CatalogError, Result};
