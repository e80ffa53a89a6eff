//! Core types and trait definitions for the rash history store.
//!
//! This crate is deliberately free of database and I/O dependencies.
//! The storage backend and the CLI both depend on it.

pub mod error;
pub mod record;
pub mod store;

pub use error::{Error, Result};
