//! SEQQUORUM Consensus Engine
//! 
//! Client-side agreement among several query nodes:
//! - Parallel fan-out, one task per node
//! - Order-independent comparison of JSON answers
//! - floor(N/2) + 1 majority, first success for non-voting operations

pub mod engine;
pub mod vote;

pub use engine::*;
pub use vote::*;
