//! Bounded-wait wrapper around a raw item stream
//!
//! Every `next` and `close` either completes, times out or observes the caller's
//! cancellation, whichever comes first. The underlying call is abandoned rather than
//! aborted: it keeps running on its own task and its late result is dropped. The source
//! is not locked, so `close` still reaches it while an abandoned read is pending.

use seqquorum_core::{CallContext, ClientConfig, QuorumError, QuorumResult, RawStream};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Stream of decoded items with a hard per-call timeout
pub struct StreamWithTimeout<S, T> {
    inner: Arc<S>,
    timeout: Duration,
    _item: PhantomData<fn() -> T>,
}

impl<S: RawStream, T: DeserializeOwned> StreamWithTimeout<S, T> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            timeout,
            _item: PhantomData,
        }
    }

    /// Wrap `inner` with the configured stream timeout
    pub fn from_config(inner: S, config: &ClientConfig) -> Self {
        Self::new(inner, config.stream_timeout())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Next raw item.
    ///
    /// Times out with an Ephemeral [`QuorumError::Timeout`].
    pub async fn next_raw(&self, ctx: &CallContext) -> QuorumResult<Vec<u8>> {
        // A finished caller must not pull an item it will never see
        if ctx.is_done() {
            return Err(ctx.done().await.into());
        }

        let inner = Arc::clone(&self.inner);
        let source_ctx = ctx.clone();
        let task = tokio::spawn(async move { inner.next_raw(&source_ctx).await });

        self.race(ctx, task).await.map_err(|()| {
            warn!("No stream item within {:?}", self.timeout);
            QuorumError::Timeout(format!("no stream item within {:?}", self.timeout))
        })?
    }

    /// Next item, decoded.
    ///
    /// An item that does not decode is a Permanent error: the source will not send it
    /// differently.
    pub async fn next(&self, ctx: &CallContext) -> QuorumResult<T> {
        let raw = self.next_raw(ctx).await?;
        serde_json::from_slice(&raw)
            .map_err(|e| QuorumError::MalformedResponse(format!("failed to decode stream item: {}", e)))
    }

    /// Close the source.
    ///
    /// A close that does not finish in time leaves the stream unusable and fails with
    /// the Permanent [`QuorumError::CloseTimeout`].
    pub async fn close(&self, ctx: &CallContext) -> QuorumResult<()> {
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move { inner.close().await });

        self.race(ctx, task).await.map_err(|()| {
            warn!("Stream close did not finish within {:?}", self.timeout);
            QuorumError::CloseTimeout(self.timeout)
        })?
    }

    /// Race a spawned source call against the caller and the timeout.
    ///
    /// `Err(())` means the timeout won.
    async fn race<R>(
        &self,
        ctx: &CallContext,
        task: impl Future<Output = Result<QuorumResult<R>, tokio::task::JoinError>>,
    ) -> Result<QuorumResult<R>, ()> {
        tokio::select! {
            biased;
            cause = ctx.done() => Ok(Err(cause.into())),
            joined = task => Ok(joined
                .map_err(|e| QuorumError::Internal(format!("stream task failed: {}", e)))
                .and_then(|result| result)),
            _ = tokio::time::sleep(self.timeout) => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde::Deserialize;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        height: u64,
    }

    /// Items with a delay each; pends forever once they run out
    struct ScriptedStream {
        items: Mutex<VecDeque<(u64, QuorumResult<Vec<u8>>)>>,
        close_delay: u64,
        closed: Arc<AtomicBool>,
    }

    impl ScriptedStream {
        fn new(items: Vec<(u64, QuorumResult<Vec<u8>>)>) -> Self {
            Self {
                items: Mutex::new(items.into()),
                close_delay: 0,
                closed: Arc::new(AtomicBool::new(false)),
            }
        }

        fn remaining(&self) -> usize {
            self.items.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl RawStream for ScriptedStream {
        async fn next_raw(&self, _ctx: &CallContext) -> QuorumResult<Vec<u8>> {
            let next = self.items.lock().unwrap().pop_front();
            match next {
                Some((delay, item)) => {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    item
                }
                None => std::future::pending().await,
            }
        }

        async fn close(&self) -> QuorumResult<()> {
            tokio::time::sleep(Duration::from_millis(self.close_delay)).await;
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn item(height: u64) -> QuorumResult<Vec<u8>> {
        Ok(format!("{{\"height\": {}}}", height).into_bytes())
    }

    #[tokio::test]
    async fn test_next_decodes_items() {
        let stream: StreamWithTimeout<_, Item> =
            StreamWithTimeout::new(ScriptedStream::new(vec![(0, item(1)), (5, item(2))]), Duration::from_secs(1));
        let ctx = CallContext::new();

        assert_eq!(stream.next(&ctx).await.unwrap(), Item { height: 1 });
        assert_eq!(stream.next(&ctx).await.unwrap(), Item { height: 2 });
    }

    #[tokio::test]
    async fn test_slow_item_times_out() {
        let stream: StreamWithTimeout<_, Item> =
            StreamWithTimeout::new(ScriptedStream::new(vec![(150, item(1)), (0, item(2))]), Duration::from_millis(100));
        let ctx = CallContext::new();

        let err = stream.next(&ctx).await.unwrap_err();
        assert!(matches!(err, QuorumError::Timeout(_)));
        assert!(err.is_ephemeral());

        // The abandoned read still consumed item 1
        assert_eq!(stream.next(&ctx).await.unwrap(), Item { height: 2 });
    }

    #[tokio::test]
    async fn test_exhausted_source_times_out() {
        let stream: StreamWithTimeout<_, Item> =
            StreamWithTimeout::new(ScriptedStream::new(vec![]), Duration::from_millis(20));

        let err = stream.next_raw(&CallContext::new()).await.unwrap_err();

        assert!(matches!(err, QuorumError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_undecodable_item_is_permanent() {
        let stream: StreamWithTimeout<_, Item> = StreamWithTimeout::new(
            ScriptedStream::new(vec![(0, Ok(b"{\"height\": \"ten\"}".to_vec()))]),
            Duration::from_secs(1),
        );

        let err = stream.next(&CallContext::new()).await.unwrap_err();

        assert!(matches!(err, QuorumError::MalformedResponse(_)));
        assert!(err.is_permanent());
    }

    #[tokio::test]
    async fn test_source_error_passes_through() {
        let stream: StreamWithTimeout<_, Item> = StreamWithTimeout::new(
            ScriptedStream::new(vec![(0, Err(QuorumError::Network("reset".into())))]),
            Duration::from_secs(1),
        );

        let err = stream.next(&CallContext::new()).await.unwrap_err();

        assert!(matches!(err, QuorumError::Network(_)));
    }

    #[tokio::test]
    async fn test_cancelled_caller() {
        let stream: StreamWithTimeout<_, Item> =
            StreamWithTimeout::new(ScriptedStream::new(vec![]), Duration::from_secs(5));
        let ctx = CallContext::new();
        ctx.cancel();

        let err = stream.next(&ctx).await.unwrap_err();

        assert!(matches!(err, QuorumError::Cancelled(_)));
    }

    #[tokio::test]
    async fn test_finished_caller_leaves_items_unread() {
        let stream: StreamWithTimeout<_, Item> =
            StreamWithTimeout::new(ScriptedStream::new(vec![(0, item(1))]), Duration::from_secs(1));
        let ctx = CallContext::new();
        ctx.cancel();

        assert!(stream.next(&ctx).await.is_err());
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(stream.inner.remaining(), 1);
        assert_eq!(stream.next(&CallContext::new()).await.unwrap(), Item { height: 1 });
    }

    #[tokio::test]
    async fn test_close() {
        let stream: StreamWithTimeout<_, Item> =
            StreamWithTimeout::new(ScriptedStream::new(vec![]), Duration::from_secs(1));

        assert!(stream.close(&CallContext::new()).await.is_ok());
    }

    #[tokio::test]
    async fn test_close_after_hung_read() {
        let source = ScriptedStream::new(vec![]);
        let closed = Arc::clone(&source.closed);
        let stream: StreamWithTimeout<_, Item> = StreamWithTimeout::new(source, Duration::from_millis(50));
        let ctx = CallContext::new();

        let err = stream.next_raw(&ctx).await.unwrap_err();
        assert!(matches!(err, QuorumError::Timeout(_)));

        // The abandoned read is still pending on its task
        stream.close(&ctx).await.unwrap();
        assert!(closed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_timeout_from_config() {
        let config = ClientConfig {
            stream_timeout_ms: 250,
            ..ClientConfig::default()
        };
        let stream: StreamWithTimeout<_, Item> =
            StreamWithTimeout::from_config(ScriptedStream::new(vec![]), &config);

        assert_eq!(stream.timeout(), Duration::from_millis(250));
        assert_eq!(
            StreamWithTimeout::<_, Item>::from_config(ScriptedStream::new(vec![]), &ClientConfig::default()).timeout(),
            Duration::from_secs(30)
        );
    }

    #[tokio::test]
    async fn test_close_timeout_is_permanent() {
        let source = ScriptedStream {
            close_delay: 200,
            ..ScriptedStream::new(vec![])
        };
        let stream: StreamWithTimeout<_, Item> = StreamWithTimeout::new(source, Duration::from_millis(20));

        let err = stream.close(&CallContext::new()).await.unwrap_err();

        assert!(matches!(err, QuorumError::CloseTimeout(_)));
        assert!(err.is_permanent());
    }
}
