//! SEQQUORUM Cryptography Module
//! 
//! Provides order-independent fingerprints of JSON responses so that answers from
//! different nodes can be compared semantically:
//! - SHA-256 over a canonical tree walk
//! - Object keys sorted byte-wise, array order preserved

pub mod hashing;

pub use hashing::*;
