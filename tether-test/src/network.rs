//! Scriptable stand-in for the network.

use std::future::Ready;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::task::{Context, Poll};

use bytes::Bytes;
use dashmap::DashMap;
use http::{Request, Response, StatusCode};
use http_body_util::Full;
use tower::Service;

/// Network service answering `live <path>` with `200 OK` unless told
/// otherwise, or refusing every connection while offline.
#[derive(Clone, Debug, Default)]
pub struct MockNetwork {
    offline: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
    statuses: Arc<DashMap<String, StatusCode>>,
}

impl MockNetwork {
    /// Creates an online network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cuts or restores connectivity.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Answers requests for `path` with `status`.
    pub fn respond_with(&self, path: impl Into<String>, status: StatusCode) {
        self.statuses.insert(path.into(), status);
    }

    /// Number of requests that reached the network.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<B> Service<Request<B>> for MockNetwork {
    type Response = Response<Full<Bytes>>;
    type Error = io::Error;
    type Future = Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return std::future::ready(Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "network unreachable",
            )));
        }

        let path = req.uri().path();
        let status = self
            .statuses
            .get(path)
            .map(|status| *status)
            .unwrap_or(StatusCode::OK);
        let mut response = Response::new(Full::new(Bytes::from(format!("live {path}"))));
        *response.status_mut() = status;
        std::future::ready(Ok(response))
    }
}
