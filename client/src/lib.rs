//! SEQQUORUM Client
//!
//! HTTP access to sequencer query nodes, alone or as a majority-voting set.

pub mod multi;
pub mod node;
pub mod query;
pub mod routes;
pub mod stream;
pub mod validate;

pub use multi::*;
pub use node::*;
pub use stream::*;
pub use validate::*;
