//! Single query node over HTTP

use crate::query::{self, RawQuery};
use crate::routes;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use seqquorum_core::{
    BlockMerkleProof, CallContext, ClientConfig, ExplorerTransactionQueryData, Header, NamespaceId,
    NodeHandle, QueryService, QuorumError, QuorumResult, SubmitApi, TaggedBase64, Transaction,
    TransactionQueryData, TransactionsInBlock, VidCommon,
};
use std::time::Duration;
use tracing::debug;

/// HTTP client for one query node
#[derive(Debug, Clone)]
pub struct HttpNode {
    base: Url,
    client: Client,
}

impl HttpNode {
    /// Create a node client with the default request timeout
    pub fn new(url: &str) -> QuorumResult<Self> {
        Self::with_timeout(url, ClientConfig::default().request_timeout())
    }

    /// Create a node client whose requests give up after `timeout`
    pub fn with_timeout(url: &str, timeout: Duration) -> QuorumResult<Self> {
        // Routes are joined onto the base, which only keeps its last segment with a trailing slash
        let normalized = if url.ends_with('/') {
            url.to_string()
        } else {
            format!("{}/", url)
        };
        let base = Url::parse(&normalized)
            .map_err(|e| QuorumError::Config(format!("invalid node url {}: {}", url, e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QuorumError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { base, client })
    }

    fn endpoint(&self, path: &str) -> QuorumResult<Url> {
        self.base
            .join(path)
            .map_err(|e| QuorumError::InvalidRequest(format!("invalid route {}: {}", path, e)))
    }

    /// Send a request and return the body of a 200 response
    async fn exchange(&self, ctx: &CallContext, request: RequestBuilder) -> QuorumResult<Vec<u8>> {
        let exchange = async {
            let response = request.send().await.map_err(transport_error)?;
            let status = response.status();
            let body = response.bytes().await.map_err(transport_error)?;

            if status != StatusCode::OK {
                return Err(QuorumError::Status {
                    status: status.as_u16(),
                    body: String::from_utf8_lossy(&body).into_owned(),
                });
            }
            Ok(body.to_vec())
        };

        ctx.run(exchange).await.map_err(QuorumError::from)?
    }
}

fn transport_error(err: reqwest::Error) -> QuorumError {
    if err.is_timeout() {
        QuorumError::Timeout(err.to_string())
    } else {
        QuorumError::Network(err.to_string())
    }
}

#[async_trait]
impl NodeHandle for HttpNode {
    fn url(&self) -> &str {
        self.base.as_str()
    }

    async fn fetch_raw(&self, ctx: &CallContext, path: &str) -> QuorumResult<Vec<u8>> {
        let url = self.endpoint(path)?;
        debug!("GET {}", url);
        self.exchange(ctx, self.client.get(url)).await
    }

    async fn submit(&self, ctx: &CallContext, tx: &Transaction) -> QuorumResult<TaggedBase64> {
        let url = self.endpoint(routes::SUBMIT)?;
        debug!("POST {} (namespace {}, {} bytes)", url, tx.namespace, tx.payload.len());

        let body = self.exchange(ctx, self.client.post(url).json(tx)).await?;
        serde_json::from_slice(&body).map_err(|e| {
            QuorumError::MalformedResponse(format!("undecodable submission response: {}", e))
        })
    }
}

#[async_trait]
impl RawQuery for HttpNode {
    async fn get_raw(&self, ctx: &CallContext, path: &str) -> QuorumResult<Vec<u8>> {
        self.fetch_raw(ctx, path).await
    }
}

#[async_trait]
impl QueryService for HttpNode {
    async fn fetch_latest_block_height(&self, ctx: &CallContext) -> QuorumResult<u64> {
        query::get(self, ctx, routes::BLOCK_HEIGHT).await
    }

    async fn fetch_header_by_height(&self, ctx: &CallContext, height: u64) -> QuorumResult<Header> {
        query::header_by_height(self, ctx, height).await
    }

    async fn fetch_raw_header_by_height(&self, ctx: &CallContext, height: u64) -> QuorumResult<Vec<u8>> {
        self.fetch_raw(ctx, &routes::header(height)).await
    }

    async fn fetch_headers_by_range(
        &self,
        ctx: &CallContext,
        from: u64,
        until: u64,
    ) -> QuorumResult<Vec<Header>> {
        query::headers_by_range(self, ctx, from, until).await
    }

    async fn fetch_transaction_by_hash(
        &self,
        ctx: &CallContext,
        hash: &TaggedBase64,
    ) -> QuorumResult<TransactionQueryData> {
        query::transaction_by_hash(self, ctx, hash).await
    }

    async fn fetch_explorer_transaction_by_hash(
        &self,
        ctx: &CallContext,
        hash: &TaggedBase64,
    ) -> QuorumResult<ExplorerTransactionQueryData> {
        query::explorer_transaction_by_hash(self, ctx, hash).await
    }

    async fn fetch_vid_common_by_height(&self, ctx: &CallContext, height: u64) -> QuorumResult<VidCommon> {
        query::vid_common_by_height(self, ctx, height).await
    }

    async fn fetch_transactions_in_block(
        &self,
        ctx: &CallContext,
        height: u64,
        namespace: NamespaceId,
    ) -> QuorumResult<TransactionsInBlock> {
        query::transactions_in_block(self, ctx, height, namespace).await
    }

    async fn fetch_block_merkle_proof(
        &self,
        ctx: &CallContext,
        root_height: u64,
        height: u64,
    ) -> QuorumResult<BlockMerkleProof> {
        query::block_merkle_proof(self, ctx, root_height, height).await
    }
}

#[async_trait]
impl SubmitApi for HttpNode {
    async fn submit_transaction(&self, ctx: &CallContext, tx: &Transaction) -> QuorumResult<TaggedBase64> {
        self.submit(ctx, tx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqquorum_core::ErrorKind;
    use serde_json::json;

    #[tokio::test]
    async fn test_fetch_raw_returns_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/status/block-height")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("42")
            .create_async()
            .await;

        let node = HttpNode::new(&server.url()).unwrap();
        let height = node.fetch_latest_block_height(&CallContext::new()).await.unwrap();

        assert_eq!(height, 42);
    }

    #[tokio::test]
    async fn test_base_path_kept() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v0/availability/header/3")
            .with_status(200)
            .with_body(json!({ "height": 3 }).to_string())
            .create_async()
            .await;

        let node = HttpNode::new(&format!("{}/v0", server.url())).unwrap();
        let header = node.fetch_header_by_height(&CallContext::new(), 3).await.unwrap();

        assert_eq!(header.height(), Some(3));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejection_keeps_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/availability/header/1")
            .with_status(404)
            .with_body("no such block")
            .create_async()
            .await;

        let node = HttpNode::new(&server.url()).unwrap();
        let err = node.fetch_raw(&CallContext::new(), "availability/header/1").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Permanent);
        assert_eq!(err.to_string(), "Request failed with status 404 and body no such block");
    }

    #[tokio::test]
    async fn test_server_error_is_ephemeral() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/availability/header/1")
            .with_status(503)
            .create_async()
            .await;

        let node = HttpNode::new(&server.url()).unwrap();
        let err = node.fetch_raw(&CallContext::new(), "availability/header/1").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Ephemeral);
    }

    #[tokio::test]
    async fn test_unreachable_node_is_ephemeral() {
        let node = HttpNode::with_timeout("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
        let err = node.fetch_raw(&CallContext::new(), "status/block-height").await.unwrap_err();

        assert!(err.is_ephemeral());
    }

    #[tokio::test]
    async fn test_cancelled_context() {
        let node = HttpNode::new("http://127.0.0.1:1").unwrap();
        let ctx = CallContext::new();
        ctx.cancel();

        let err = node.fetch_raw(&ctx, "status/block-height").await.unwrap_err();

        assert!(matches!(err, QuorumError::Cancelled(_)));
    }

    #[tokio::test]
    async fn test_submit_returns_hash() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/submit/submit")
            .match_body(mockito::Matcher::Json(json!({ "namespace": 1, "payload": "aGVsbG8=" })))
            .with_status(200)
            .with_body("\"TX~aGVsbG8\"")
            .create_async()
            .await;

        let node = HttpNode::new(&server.url()).unwrap();
        let tx = Transaction::new(1, b"hello".to_vec());
        let hash = node.submit_transaction(&CallContext::new(), &tx).await.unwrap();

        assert_eq!(hash.as_str(), "TX~aGVsbG8");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_submit_undecodable_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/submit/submit")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let node = HttpNode::new(&server.url()).unwrap();
        let err = node
            .submit_transaction(&CallContext::new(), &Transaction::new(1, vec![1]))
            .await
            .unwrap_err();

        assert!(matches!(err, QuorumError::MalformedResponse(_)));
        assert!(err.is_permanent());
    }

    #[tokio::test]
    async fn test_submit_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/submit/submit")
            .with_status(429)
            .create_async()
            .await;

        let node = HttpNode::new(&server.url()).unwrap();
        let err = node
            .submit_transaction(&CallContext::new(), &Transaction::new(1, vec![1]))
            .await
            .unwrap_err();

        assert!(err.is_ephemeral());
    }

    #[test]
    fn test_invalid_url() {
        let err = HttpNode::new("not a url").unwrap_err();
        assert!(matches!(err, QuorumError::Config(_)));
    }
}
