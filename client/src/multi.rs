//! Multi-node client
//!
//! Reads are answered only when a majority of nodes agree on the payload. Polling the
//! latest height and submitting a transaction only need one node to succeed.

use crate::node::HttpNode;
use crate::query::{self, RawQuery};
use crate::routes;
use crate::validate::decode;
use async_trait::async_trait;
use seqquorum_consensus::QuorumEngine;
use seqquorum_core::{
    BlockMerkleProof, CallContext, ClientConfig, ExplorerTransactionQueryData, Header, NamespaceId,
    NodeHandle, QueryService, QuorumError, QuorumResult, SubmitApi, TaggedBase64, Transaction,
    TransactionQueryData, TransactionsInBlock, VidCommon,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Query client backed by several independently operated nodes
pub struct MultipleNodesClient<N: ?Sized = HttpNode> {
    nodes: Vec<Arc<N>>,
    engine: QuorumEngine,
    call_timeout: Duration,
}

impl MultipleNodesClient<HttpNode> {
    /// Create a client for the given node URLs with default timeouts
    pub fn new<I, S>(urls: I) -> QuorumResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_config(&ClientConfig::with_nodes(urls))
    }

    /// Create a client from a configuration.
    ///
    /// Fails before any network activity if fewer than two nodes are configured.
    pub fn from_config(config: &ClientConfig) -> QuorumResult<Self> {
        config.validate()?;

        let nodes = config
            .nodes
            .iter()
            .map(|url| HttpNode::with_timeout(url, config.request_timeout()).map(Arc::new))
            .collect::<QuorumResult<Vec<_>>>()?;

        info!("Created multi-node client over {} nodes", nodes.len());

        Ok(Self {
            nodes,
            engine: QuorumEngine::new(),
            call_timeout: config.call_timeout(),
        })
    }
}

impl<N: NodeHandle + ?Sized + 'static> MultipleNodesClient<N> {
    /// Create a client over existing node handles
    pub fn with_nodes(nodes: Vec<Arc<N>>, call_timeout: Duration) -> QuorumResult<Self> {
        if nodes.len() < 2 {
            return Err(QuorumError::Config(format!(
                "at least 2 node urls are required, got {}",
                nodes.len()
            )));
        }

        Ok(Self {
            nodes,
            engine: QuorumEngine::new(),
            call_timeout,
        })
    }

    /// Replace the engine, e.g. to compare payloads with a custom decoder
    pub fn with_engine(mut self, engine: QuorumEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn nodes(&self) -> &[Arc<N>] {
        &self.nodes
    }

    /// Bound a call by the configured call timeout
    fn scope(&self, ctx: &CallContext) -> CallContext {
        ctx.with_timeout(self.call_timeout)
    }

    /// GET `path` on every node and return the payload a majority agrees on
    pub async fn fetch_with_majority(&self, ctx: &CallContext, path: &str) -> QuorumResult<Vec<u8>> {
        let call = self.scope(ctx);
        let path = path.to_string();

        self.engine
            .fetch_with_majority(&call, &self.nodes, move |node: Arc<N>, ctx: CallContext| {
                let path = path.clone();
                async move { node.fetch_raw(&ctx, &path).await }
            })
            .await
    }
}

#[async_trait]
impl<N: NodeHandle + ?Sized + 'static> RawQuery for MultipleNodesClient<N> {
    async fn get_raw(&self, ctx: &CallContext, path: &str) -> QuorumResult<Vec<u8>> {
        self.fetch_with_majority(ctx, path).await
    }
}

#[async_trait]
impl<N: NodeHandle + ?Sized + 'static> QueryService for MultipleNodesClient<N> {
    async fn fetch_latest_block_height(&self, ctx: &CallContext) -> QuorumResult<u64> {
        let call = self.scope(ctx);

        self.engine
            .first_success(&call, &self.nodes, |node: Arc<N>, ctx: CallContext| async move {
                let payload = node.fetch_raw(&ctx, routes::BLOCK_HEIGHT).await?;
                decode::<u64>(&payload)
            })
            .await
    }

    async fn fetch_header_by_height(&self, ctx: &CallContext, height: u64) -> QuorumResult<Header> {
        query::header_by_height(self, &self.scope(ctx), height).await
    }

    async fn fetch_raw_header_by_height(&self, ctx: &CallContext, height: u64) -> QuorumResult<Vec<u8>> {
        self.fetch_with_majority(ctx, &routes::header(height)).await
    }

    async fn fetch_headers_by_range(
        &self,
        ctx: &CallContext,
        from: u64,
        until: u64,
    ) -> QuorumResult<Vec<Header>> {
        query::headers_by_range(self, &self.scope(ctx), from, until).await
    }

    async fn fetch_transaction_by_hash(
        &self,
        ctx: &CallContext,
        hash: &TaggedBase64,
    ) -> QuorumResult<TransactionQueryData> {
        query::transaction_by_hash(self, &self.scope(ctx), hash).await
    }

    async fn fetch_explorer_transaction_by_hash(
        &self,
        ctx: &CallContext,
        hash: &TaggedBase64,
    ) -> QuorumResult<ExplorerTransactionQueryData> {
        query::explorer_transaction_by_hash(self, &self.scope(ctx), hash).await
    }

    async fn fetch_vid_common_by_height(&self, ctx: &CallContext, height: u64) -> QuorumResult<VidCommon> {
        query::vid_common_by_height(self, &self.scope(ctx), height).await
    }

    async fn fetch_transactions_in_block(
        &self,
        ctx: &CallContext,
        height: u64,
        namespace: NamespaceId,
    ) -> QuorumResult<TransactionsInBlock> {
        query::transactions_in_block(self, &self.scope(ctx), height, namespace).await
    }

    async fn fetch_block_merkle_proof(
        &self,
        ctx: &CallContext,
        root_height: u64,
        height: u64,
    ) -> QuorumResult<BlockMerkleProof> {
        query::block_merkle_proof(self, &self.scope(ctx), root_height, height).await
    }
}

#[async_trait]
impl<N: NodeHandle + ?Sized + 'static> SubmitApi for MultipleNodesClient<N> {
    async fn submit_transaction(&self, ctx: &CallContext, tx: &Transaction) -> QuorumResult<TaggedBase64> {
        let call = self.scope(ctx);

        let hash = self
            .engine
            .first_success(&call, &self.nodes, |node: Arc<N>, ctx: CallContext| async move {
                node.submit(&ctx, tx).await
            })
            .await?;

        info!("Submitted transaction {} to namespace {}", hash, tx.namespace);
        Ok(hash)
    }
}
