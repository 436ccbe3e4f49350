//! Response body returned by the interceptor.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Buf, Bytes, BytesMut};
use futures::ready;
use http::response::Parts;
use http::{HeaderMap, StatusCode};
use http_body::{Body as HttpBody, Frame, SizeHint};
use pin_project::pin_project;
use tether::{CacheKey, CacheStore, ResponseSnapshot};
use tracing::debug;

/// Body of a response that went through the interceptor.
///
/// Cacheable network responses stream to the page while a copy of every data
/// frame is kept; the copy becomes a cache snapshot once the stream ends.
/// Cached responses are replayed from memory. Everything else streams from
/// the network untouched.
#[pin_project(project = FetchBodyProj)]
#[derive(Debug)]
pub enum FetchBody<B> {
    /// Fully buffered body served from cache.
    ///
    /// The `Option` yields the data once and then ends the stream.
    Complete(Option<Bytes>),
    /// Network body forwarded as is, copied into a snapshot on the way.
    Caching {
        /// Network body.
        #[pin]
        body: B,
        /// Snapshot under construction; gone once stored or abandoned.
        capture: Option<SnapshotCapture>,
    },
    /// Network body forwarded as is.
    Passthrough(#[pin] B),
}

/// Copy of a response being streamed, stored when the stream completes.
#[derive(Debug)]
pub struct SnapshotCapture {
    cache: CacheStore,
    key: CacheKey,
    status: StatusCode,
    headers: HeaderMap,
    buffer: BytesMut,
}

impl SnapshotCapture {
    fn finish(self) {
        let snapshot = ResponseSnapshot::new(self.status, self.headers, self.buffer.freeze());
        self.cache.put_in_background(self.key, snapshot);
    }
}

impl<B> FetchBody<B> {
    /// Buffered body with the given bytes.
    pub fn complete(bytes: Bytes) -> Self {
        FetchBody::Complete(Some(bytes))
    }

    /// Whether the body was buffered by the interceptor.
    pub fn is_complete(&self) -> bool {
        matches!(self, FetchBody::Complete(_))
    }

    /// Whether a snapshot of the body is still being captured.
    pub fn is_caching(&self) -> bool {
        matches!(
            self,
            FetchBody::Caching {
                capture: Some(_),
                ..
            }
        )
    }
}

impl<B: HttpBody> FetchBody<B> {
    /// Streams `body` and stores it under `key` once it has been read to the
    /// end.
    ///
    /// A body that fails, or is dropped before its end, is not stored.
    /// Must be polled from within a Tokio runtime.
    pub fn caching(body: B, cache: CacheStore, key: CacheKey, parts: &Parts) -> Self {
        let capture = SnapshotCapture {
            cache,
            key,
            status: parts.status,
            headers: parts.headers.clone(),
            buffer: BytesMut::new(),
        };
        if body.is_end_stream() {
            capture.finish();
            return FetchBody::Caching {
                body,
                capture: None,
            };
        }
        FetchBody::Caching {
            body,
            capture: Some(capture),
        }
    }
}

impl<B> HttpBody for FetchBody<B>
where
    B: HttpBody,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.project() {
            FetchBodyProj::Complete(data) => match data.take() {
                Some(bytes) => Poll::Ready(Some(Ok(Frame::data(bytes)))),
                None => Poll::Ready(None),
            },
            FetchBodyProj::Caching { mut body, capture } => {
                let frame = match ready!(body.as_mut().poll_frame(cx)) {
                    Some(Ok(frame)) => {
                        frame.map_data(|mut data| data.copy_to_bytes(data.remaining()))
                    }
                    Some(Err(err)) => {
                        if let Some(capture) = capture.take() {
                            debug!(cache.key = %capture.key, "response body failed, not caching");
                        }
                        return Poll::Ready(Some(Err(err)));
                    }
                    None => {
                        if let Some(capture) = capture.take() {
                            capture.finish();
                        }
                        return Poll::Ready(None);
                    }
                };

                if let (Some(capture), Some(data)) = (capture.as_mut(), frame.data_ref()) {
                    capture.buffer.extend_from_slice(data);
                }
                // Readers may stop polling once the body reports its end.
                if body.is_end_stream()
                    && let Some(capture) = capture.take()
                {
                    capture.finish();
                }
                Poll::Ready(Some(Ok(frame)))
            }
            FetchBodyProj::Passthrough(body) => match ready!(body.poll_frame(cx)) {
                Some(Ok(frame)) => {
                    let frame = frame.map_data(|mut data| data.copy_to_bytes(data.remaining()));
                    Poll::Ready(Some(Ok(frame)))
                }
                Some(Err(e)) => Poll::Ready(Some(Err(e))),
                None => Poll::Ready(None),
            },
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self {
            FetchBody::Complete(Some(bytes)) => SizeHint::with_exact(bytes.len() as u64),
            FetchBody::Complete(None) => SizeHint::with_exact(0),
            FetchBody::Caching { body, .. } => body.size_hint(),
            FetchBody::Passthrough(body) => body.size_hint(),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            FetchBody::Complete(data) => data.is_none(),
            FetchBody::Caching { body, .. } => body.is_end_stream(),
            FetchBody::Passthrough(body) => body.is_end_stream(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::{BodyExt, Empty, Full, StreamBody};
    use tether::{Worker, WorkerConfig};
    use tether_moka::MokaStorage;

    fn store() -> (Worker, CacheKey, Parts) {
        let worker = Worker::new(WorkerConfig::default(), MokaStorage::default());
        let key = CacheKey::parse("https://example.org/page").unwrap();
        let (parts, ()) = http::Response::new(()).into_parts();
        (worker, key, parts)
    }

    #[tokio::test]
    async fn complete_yields_bytes_once() {
        let mut body: FetchBody<Empty<Bytes>> = FetchBody::complete(Bytes::from_static(b"cached"));
        assert_eq!(body.size_hint().exact(), Some(6));

        let frame = body.frame().await.unwrap().unwrap();
        assert_eq!(frame.into_data().unwrap(), Bytes::from_static(b"cached"));
        assert!(body.is_end_stream());
        assert!(body.frame().await.is_none());
    }

    #[tokio::test]
    async fn passthrough_streams_inner_body() {
        let body = FetchBody::Passthrough(Full::new(Bytes::from_static(b"live")));
        assert!(!body.is_complete());
        let collected = body.collect().await.unwrap().to_bytes();
        assert_eq!(collected, Bytes::from_static(b"live"));
    }

    #[tokio::test]
    async fn caching_stores_streamed_frames() {
        let (worker, key, parts) = store();
        let chunks = futures::stream::iter([
            Ok::<_, std::io::Error>(Frame::data(Bytes::from_static(b"hello "))),
            Ok(Frame::data(Bytes::from_static(b"world"))),
        ]);
        let body = FetchBody::caching(
            StreamBody::new(chunks),
            worker.cache().clone(),
            key.clone(),
            &parts,
        );
        assert!(body.is_caching());

        let collected = body.collect().await.unwrap().to_bytes();
        assert_eq!(collected, Bytes::from_static(b"hello world"));

        worker.settled().await;
        let stored = worker.cache().lookup(&key).await.unwrap();
        assert_eq!(stored.body().as_ref(), b"hello world");
    }

    #[tokio::test]
    async fn caching_skips_failed_body() {
        let (worker, key, parts) = store();
        let chunks = futures::stream::iter([
            Ok(Frame::data(Bytes::from_static(b"partial"))),
            Err(std::io::Error::other("reset")),
        ]);
        let mut body =
            FetchBody::caching(StreamBody::new(chunks), worker.cache().clone(), key.clone(), &parts);

        assert!(body.frame().await.unwrap().is_ok());
        assert!(body.frame().await.unwrap().is_err());
        assert!(!body.is_caching());

        worker.settled().await;
        assert_eq!(worker.cache().lookup(&key).await, None);
    }

    #[tokio::test]
    async fn dropped_body_is_not_stored() {
        let (worker, key, parts) = store();
        let body = FetchBody::caching(
            Full::new(Bytes::from_static(b"unread")),
            worker.cache().clone(),
            key.clone(),
            &parts,
        );
        drop(body);

        worker.settled().await;
        assert_eq!(worker.cache().lookup(&key).await, None);
    }
}
