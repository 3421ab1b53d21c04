//! Core traits defining SEQQUORUM interfaces
//!
//! These traits define the seams between the quorum layer, the transport and callers.

use crate::context::CallContext;
use crate::types::*;
use async_trait::async_trait;
use serde_json::Value;

/// Result type for SEQQUORUM operations
pub type QuorumResult<T> = Result<T, crate::error::QuorumError>;

/// One query node endpoint
///
/// Implementations only move bytes and classify failures; they never vote or
/// compare answers.
#[async_trait]
pub trait NodeHandle: Send + Sync {
    /// Base URL, used to label this node in error reports
    fn url(&self) -> &str;

    /// GET `path` relative to the base URL and return the raw body of a 200 response
    async fn fetch_raw(&self, ctx: &CallContext, path: &str) -> QuorumResult<Vec<u8>>;

    /// Submit a transaction and return its hash
    async fn submit(&self, ctx: &CallContext, tx: &Transaction) -> QuorumResult<TaggedBase64>;
}

/// Decodes a raw payload into a JSON tree for fingerprinting
pub trait PayloadDecoder: Send + Sync {
    fn decode(&self, payload: &[u8]) -> QuorumResult<Value>;
}

/// Typed read operations against the sequencer query API
#[async_trait]
pub trait QueryService: Send + Sync {
    async fn fetch_latest_block_height(&self, ctx: &CallContext) -> QuorumResult<u64>;

    async fn fetch_header_by_height(&self, ctx: &CallContext, height: u64) -> QuorumResult<Header>;

    async fn fetch_raw_header_by_height(&self, ctx: &CallContext, height: u64) -> QuorumResult<Vec<u8>>;

    /// Headers in `[from, until)`
    async fn fetch_headers_by_range(
        &self,
        ctx: &CallContext,
        from: u64,
        until: u64,
    ) -> QuorumResult<Vec<Header>>;

    async fn fetch_transaction_by_hash(
        &self,
        ctx: &CallContext,
        hash: &TaggedBase64,
    ) -> QuorumResult<TransactionQueryData>;

    async fn fetch_explorer_transaction_by_hash(
        &self,
        ctx: &CallContext,
        hash: &TaggedBase64,
    ) -> QuorumResult<ExplorerTransactionQueryData>;

    async fn fetch_vid_common_by_height(&self, ctx: &CallContext, height: u64) -> QuorumResult<VidCommon>;

    /// Transactions of `namespace` in block `height`, with proof and VID common
    async fn fetch_transactions_in_block(
        &self,
        ctx: &CallContext,
        height: u64,
        namespace: NamespaceId,
    ) -> QuorumResult<TransactionsInBlock>;

    /// Merkle proof of block `height` at snapshot `root_height`
    async fn fetch_block_merkle_proof(
        &self,
        ctx: &CallContext,
        root_height: u64,
        height: u64,
    ) -> QuorumResult<BlockMerkleProof>;
}

/// Transaction submission
#[async_trait]
pub trait SubmitApi: Send + Sync {
    async fn submit_transaction(&self, ctx: &CallContext, tx: &Transaction) -> QuorumResult<TaggedBase64>;
}

/// Source of raw stream items.
///
/// `close` may be called while an earlier `next_raw` is still pending and must unblock it.
#[async_trait]
pub trait RawStream: Send + Sync + 'static {
    /// Wait for the next item
    async fn next_raw(&self, ctx: &CallContext) -> QuorumResult<Vec<u8>>;

    /// Release the stream
    async fn close(&self) -> QuorumResult<()>;
}
