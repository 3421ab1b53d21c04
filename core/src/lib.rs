//! SEQQUORUM Core Library
//! 
//! Core types, traits, and abstractions for querying a replicated sequencer network
//! through several independent nodes at once.
//! This crate provides the foundation for all other SEQQUORUM components.

pub mod types;
pub mod traits;
pub mod error;
pub mod config;
pub mod context;

pub use types::*;
pub use traits::*;
pub use error::*;
pub use config::*;
pub use context::*;
