//! Typed queries shared by the single-node and multi-node clients
//!
//! Both clients implement [`RawQuery`]; they differ only in how a path becomes an
//! accepted payload.

use crate::routes;
use crate::validate::{decode, validate_namespace_response};
use async_trait::async_trait;
use seqquorum_core::{
    BlockMerkleProof, CallContext, ExplorerTransactionQueryData, Header, NamespaceId,
    NamespaceResponse, QuorumResult, TaggedBase64, TransactionQueryData, TransactionsInBlock,
    VidCommon, VidCommonQueryData,
};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Source of accepted payloads
#[async_trait]
pub trait RawQuery: Send + Sync {
    async fn get_raw(&self, ctx: &CallContext, path: &str) -> QuorumResult<Vec<u8>>;
}

/// Fetch and decode one route
pub async fn get<Q, T>(source: &Q, ctx: &CallContext, path: &str) -> QuorumResult<T>
where
    Q: RawQuery + ?Sized,
    T: DeserializeOwned,
{
    let payload = source.get_raw(ctx, path).await?;
    decode(&payload)
}

pub async fn header_by_height<Q: RawQuery + ?Sized>(
    source: &Q,
    ctx: &CallContext,
    height: u64,
) -> QuorumResult<Header> {
    get(source, ctx, &routes::header(height)).await
}

pub async fn headers_by_range<Q: RawQuery + ?Sized>(
    source: &Q,
    ctx: &CallContext,
    from: u64,
    until: u64,
) -> QuorumResult<Vec<Header>> {
    get(source, ctx, &routes::header_range(from, until)).await
}

pub async fn transaction_by_hash<Q: RawQuery + ?Sized>(
    source: &Q,
    ctx: &CallContext,
    hash: &TaggedBase64,
) -> QuorumResult<TransactionQueryData> {
    get(source, ctx, &routes::transaction_by_hash(hash)).await
}

pub async fn explorer_transaction_by_hash<Q: RawQuery + ?Sized>(
    source: &Q,
    ctx: &CallContext,
    hash: &TaggedBase64,
) -> QuorumResult<ExplorerTransactionQueryData> {
    get(source, ctx, &routes::explorer_transaction_by_hash(hash)).await
}

pub async fn vid_common_by_height<Q: RawQuery + ?Sized>(
    source: &Q,
    ctx: &CallContext,
    height: u64,
) -> QuorumResult<VidCommon> {
    let data: VidCommonQueryData = get(source, ctx, &routes::vid_common(height)).await?;
    Ok(data.common)
}

/// Namespace transactions of a block, with the VID common needed to verify them.
///
/// A block without a proof for the namespace yields an empty result and no VID fetch.
pub async fn transactions_in_block<Q: RawQuery + ?Sized>(
    source: &Q,
    ctx: &CallContext,
    height: u64,
    namespace: NamespaceId,
) -> QuorumResult<TransactionsInBlock> {
    let response: NamespaceResponse = get(source, ctx, &routes::namespace(height, namespace)).await?;
    let content = validate_namespace_response(response, namespace)?;

    let Some(proof) = content.proof else {
        debug!("Block {} has no proof for namespace {}", height, namespace);
        return Ok(TransactionsInBlock::default());
    };

    let vid_common = vid_common_by_height(source, ctx, height).await?;

    Ok(TransactionsInBlock {
        transactions: content.transactions,
        proof: Some(proof),
        vid_common: Some(vid_common),
    })
}

pub async fn block_merkle_proof<Q: RawQuery + ?Sized>(
    source: &Q,
    ctx: &CallContext,
    root_height: u64,
    height: u64,
) -> QuorumResult<BlockMerkleProof> {
    get(source, ctx, &routes::block_merkle_proof(root_height, height)).await
}
