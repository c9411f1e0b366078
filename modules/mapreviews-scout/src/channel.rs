//! Request/reply channel between the page-side augmenter and the background
//! review worker. Every accepted request gets exactly one reply.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use mapreviews_common::{ExtensionRequest, ReviewResponse};

use crate::review_fetcher::ReviewFetcher;

/// Requests buffered before `send` starts waiting.
const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error("review worker is not running")]
    Closed,

    #[error("review worker dropped the request without replying")]
    NoReply,
}

struct Envelope {
    request: ExtensionRequest,
    reply: oneshot::Sender<ReviewResponse>,
}

/// Page-side handle to the review worker. Cheap to clone.
#[derive(Clone)]
pub struct ReviewHandle {
    tx: mpsc::Sender<Envelope>,
}

impl ReviewHandle {
    /// Send a request and wait for its reply.
    pub async fn send(&self, request: ExtensionRequest) -> Result<ReviewResponse, ChannelError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Envelope { request, reply })
            .await
            .map_err(|_| ChannelError::Closed)?;
        rx.await.map_err(|_| ChannelError::NoReply)
    }
}

/// Start the background review worker.
///
/// Requests are handled concurrently, at most `max_concurrent` at a time.
/// Cancelling `cancel` stops intake and aborts in-flight lookups; their
/// callers see [`ChannelError::NoReply`].
pub fn spawn_review_worker(
    fetcher: Arc<ReviewFetcher>,
    max_concurrent: usize,
    cancel: CancellationToken,
) -> (ReviewHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let worker = tokio::spawn(run_worker(fetcher, rx, max_concurrent.max(1), cancel));
    (ReviewHandle { tx }, worker)
}

async fn run_worker(
    fetcher: Arc<ReviewFetcher>,
    mut rx: mpsc::Receiver<Envelope>,
    max_concurrent: usize,
    cancel: CancellationToken,
) {
    info!(max_concurrent, "Review worker started");
    let semaphore = Arc::new(Semaphore::new(max_concurrent));
    let mut in_flight = JoinSet::new();

    loop {
        let envelope = tokio::select! {
            _ = cancel.cancelled() => break,
            Some(_) = in_flight.join_next(), if !in_flight.is_empty() => continue,
            envelope = rx.recv() => match envelope {
                Some(envelope) => envelope,
                None => break,
            },
        };

        let permit = tokio::select! {
            _ = cancel.cancelled() => break,
            permit = semaphore.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let fetcher = fetcher.clone();
        in_flight.spawn(async move {
            let _permit = permit;
            let Envelope { request, reply } = envelope;
            let response = match fetcher.handle(request).await {
                Ok(response) => response,
                Err(e) => {
                    let error = format!("{e:#}");
                    warn!(error = error.as_str(), "Review lookup failed");
                    ReviewResponse::Failed { error }
                }
            };
            if reply.send(response).is_err() {
                debug!("Requester went away before the reply arrived");
            }
        });
    }

    if cancel.is_cancelled() {
        in_flight.abort_all();
    }
    while in_flight.join_next().await.is_some() {}
    info!("Review worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_restaurant, MockReviewSource};
    use serde_json::json;

    fn fetcher(source: MockReviewSource) -> Arc<ReviewFetcher> {
        Arc::new(ReviewFetcher::new(Arc::new(source)))
    }

    #[tokio::test]
    async fn replies_once_per_request() {
        let source = MockReviewSource::new().on_search("Lucali", vec![json!({ "rating": 9.0 })]);
        let (handle, _worker) = spawn_review_worker(fetcher(source), 4, CancellationToken::new());

        let reply = handle
            .send(ExtensionRequest::fetch_review_meta(sample_restaurant("Lucali")))
            .await
            .unwrap();
        assert_eq!(reply.status(), "done");
    }

    #[tokio::test]
    async fn lookup_failure_becomes_error_reply() {
        let (handle, _worker) =
            spawn_review_worker(fetcher(MockReviewSource::new()), 4, CancellationToken::new());

        let reply = handle
            .send(ExtensionRequest::fetch_review_meta(sample_restaurant("Unregistered")))
            .await
            .unwrap();
        assert!(matches!(reply, ReviewResponse::Failed { .. }));
    }

    #[tokio::test]
    async fn cancelled_worker_rejects_requests() {
        let cancel = CancellationToken::new();
        let (handle, worker) =
            spawn_review_worker(fetcher(MockReviewSource::new()), 1, cancel.clone());
        cancel.cancel();
        worker.await.unwrap();

        let err = handle
            .send(ExtensionRequest::fetch_review_meta(sample_restaurant("Lucali")))
            .await
            .unwrap_err();
        assert_eq!(err, ChannelError::Closed);
    }
}
