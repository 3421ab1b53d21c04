//! Quorum fetch engine
//!
//! Fans one request out to every node, compares the answers semantically and returns
//! as soon as a strict majority agrees. Operations where agreement means nothing
//! (latest height, submission) use [`QuorumEngine::first_success`] instead.

use crate::vote::{majority_threshold, VoteTally};
use seqquorum_core::{
    AggregatedError, CallContext, NodeHandle, PayloadDecoder, QuorumError, QuorumResult,
};
use seqquorum_crypto::{fingerprint_with, JsonDecoder};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Result reported by one worker
struct NodeOutcome {
    node: String,
    result: QuorumResult<Vec<u8>>,
}

/// Engine resolving multi-node calls
#[derive(Clone)]
pub struct QuorumEngine {
    decoder: Arc<dyn PayloadDecoder>,
}

impl QuorumEngine {
    /// Create an engine comparing plain JSON payloads
    pub fn new() -> Self {
        Self {
            decoder: Arc::new(JsonDecoder),
        }
    }

    /// Create an engine with a custom payload normalization
    pub fn with_decoder(decoder: Arc<dyn PayloadDecoder>) -> Self {
        Self { decoder }
    }

    /// Query every node concurrently and return the first payload backed by a majority.
    ///
    /// `fetch` is called once per node with a context that is cancelled as soon as this
    /// call returns, for whatever reason. The returned payload is the raw body of the
    /// node whose answer completed the majority.
    ///
    /// Fails with an aggregated error once every node has reported without a majority,
    /// or with a cancellation error if `ctx` finishes first.
    pub async fn fetch_with_majority<N, F, Fut>(
        &self,
        ctx: &CallContext,
        nodes: &[Arc<N>],
        fetch: F,
    ) -> QuorumResult<Vec<u8>>
    where
        N: NodeHandle + ?Sized + 'static,
        F: Fn(Arc<N>, CallContext) -> Fut,
        Fut: Future<Output = QuorumResult<Vec<u8>>> + Send + 'static,
    {
        if nodes.is_empty() {
            return Err(QuorumError::Config("quorum fetch needs at least one node".into()));
        }

        let call = ctx.child();
        let _stop_workers = call.cancel_on_drop();

        let (tx, mut rx) = mpsc::channel::<NodeOutcome>(nodes.len());
        for node in nodes {
            let worker = call.clone();
            let label = node.url().to_string();
            let request = fetch(Arc::clone(node), call.clone());
            let tx = tx.clone();

            tokio::spawn(async move {
                let result = tokio::select! {
                    biased;
                    _ = worker.token().cancelled() => return,
                    result = request => result,
                };
                // The channel holds one report per node, so this never waits
                let _ = tx.try_send(NodeOutcome { node: label, result });
            });
        }
        drop(tx);

        let threshold = majority_threshold(nodes.len());
        let mut tally = VoteTally::new();
        let mut errors = AggregatedError::new(format!(
            "no majority consensus reached among {} nodes",
            nodes.len()
        ));
        let mut reported = 0;

        debug!("Quorum fetch across {} nodes, threshold {}", nodes.len(), threshold);

        while reported < nodes.len() {
            let outcome = tokio::select! {
                biased;
                cause = call.done() => {
                    warn!("Quorum fetch abandoned after {} of {} reports: {:?}", reported, nodes.len(), cause);
                    return Err(cause.into());
                }
                outcome = rx.recv() => outcome,
            };

            let Some(NodeOutcome { node, result }) = outcome else {
                break;
            };
            reported += 1;

            let payload = match result {
                Ok(payload) => payload,
                Err(err) => {
                    debug!("Node {} failed: {}", node, err);
                    errors.push_error(node, err);
                    continue;
                }
            };

            match fingerprint_with(self.decoder.as_ref(), &payload) {
                Ok(fingerprint) => {
                    let votes = tally.record(fingerprint);
                    if votes >= threshold {
                        info!(
                            "Majority reached on {} with {}/{} votes",
                            fingerprint,
                            votes,
                            nodes.len()
                        );
                        return Ok(payload);
                    }
                    errors.push_disagreement(node, fingerprint);
                }
                Err(err) => {
                    warn!("Failed to normalize response from {}: {}", node, err);
                    let err = match err {
                        QuorumError::Canonicalization(_) => err,
                        other => QuorumError::Canonicalization(other.to_string()),
                    };
                    errors.push_error(node, err);
                }
            }
        }

        if reported < nodes.len() {
            errors.push_error(
                format!("{} unreported nodes", nodes.len() - reported),
                QuorumError::Internal("worker exited without reporting".into()),
            );
        }

        match tally.leader() {
            Some((fingerprint, votes)) => warn!(
                "No majority among {} nodes ({} distinct answers, {} failures), leading answer {} had {}/{} votes",
                nodes.len(),
                tally.distinct(),
                reported - tally.total(),
                fingerprint,
                votes,
                threshold
            ),
            None => warn!(
                "No majority among {} nodes, all {} reports failed",
                nodes.len(),
                reported
            ),
        }

        Err(errors.into())
    }

    /// Try nodes one after another and return the first success.
    ///
    /// Fails only when every node failed, with the same Permanent/Ephemeral rule as a
    /// majority fetch.
    pub async fn first_success<N, T, F, Fut>(
        &self,
        ctx: &CallContext,
        nodes: &[Arc<N>],
        op: F,
    ) -> QuorumResult<T>
    where
        N: NodeHandle + ?Sized,
        F: Fn(Arc<N>, CallContext) -> Fut,
        Fut: Future<Output = QuorumResult<T>>,
    {
        if nodes.is_empty() {
            return Err(QuorumError::Config("request needs at least one node".into()));
        }

        let mut errors =
            AggregatedError::new(format!("request failed with all {} nodes", nodes.len()));

        for node in nodes {
            let attempt = ctx
                .run(op(Arc::clone(node), ctx.clone()))
                .await
                .map_err(QuorumError::from)?;

            match attempt {
                Ok(value) => {
                    debug!("Node {} answered", node.url());
                    return Ok(value);
                }
                Err(err) => {
                    warn!("Request to {} failed: {}", node.url(), err);
                    errors.push_error(node.url(), err);
                }
            }
        }

        Err(errors.into())
    }
}

impl Default for QuorumEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// [`QuorumEngine::fetch_with_majority`] with plain JSON comparison
pub async fn fetch_with_majority<N, F, Fut>(
    ctx: &CallContext,
    nodes: &[Arc<N>],
    fetch: F,
) -> QuorumResult<Vec<u8>>
where
    N: NodeHandle + ?Sized + 'static,
    F: Fn(Arc<N>, CallContext) -> Fut,
    Fut: Future<Output = QuorumResult<Vec<u8>>> + Send + 'static,
{
    QuorumEngine::new().fetch_with_majority(ctx, nodes, fetch).await
}
