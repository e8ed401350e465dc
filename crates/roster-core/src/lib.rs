//! Core types and trait definitions for the roster admin console.
//!
//! This crate is deliberately free of HTTP and runtime dependencies. It holds
//! the user data model, the error taxonomy shared by every layer, the form
//! validation schemas, and the partial-update reconciler.

pub mod error;
pub mod form;
pub mod reconcile;
pub mod service;
pub mod user;
pub mod validate;

pub use error::{Error, Result};
