//! Atrium Core - Foundational types for the Atrium runtime
//!
//! This crate provides the types every other Atrium crate depends on:
//! - `NodeId` - Stable scene-node identifiers
//! - Error types and Result alias

mod error;
mod id;

pub use error::{AtriumError, Result};
pub use id::NodeId;
