use std::task::{Context, Poll};

use http::{HeaderName, HeaderValue, Request, Response, StatusCode};
use http_body::Body as HttpBody;
use tether::metrics::{FetchOutcome, record_fetch};
use tether::{CacheKey, FetchMeta, Worker};
use tower::Service;
use tracing::{Instrument, Span, debug, field, info_span};

use crate::body::FetchBody;
use crate::error::FetchError;
use crate::future::InterceptFuture;

/// Tower service that answers from the network and falls back to cache.
///
/// Requests the worker does not participate in (non-`GET`, the worker
/// script) go straight to the wrapped service. For the rest:
///
/// - a `200 OK` response is returned as soon as its head arrives; its body
///   streams to the caller and is stored in the current cache generation
///   once read to the end (see [`FetchBody::caching`]);
/// - any other response is returned as is and not cached;
/// - a network error falls back to the cached snapshot for the same key, or
///   to [`FetchError`] when there is none.
///
/// Navigation outcomes, read from the [`FetchMeta`] request extension, feed
/// the worker's connectivity flag.
#[derive(Clone, Debug)]
pub struct InterceptService<S> {
    upstream: S,
    worker: Worker,
    source_header: Option<HeaderName>,
}

impl<S> InterceptService<S> {
    /// Wraps `upstream`.
    pub fn new(upstream: S, worker: Worker, source_header: Option<HeaderName>) -> Self {
        Self {
            upstream,
            worker,
            source_header,
        }
    }

    /// The worker this service intercepts for.
    pub fn worker(&self) -> &Worker {
        &self.worker
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for InterceptService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: HttpBody + Send + 'static,
{
    type Response = Response<FetchBody<ResBody>>;
    type Error = FetchError<S::Error>;
    type Future = InterceptFuture<S::Future, ResBody, S::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.upstream.poll_ready(cx).map_err(FetchError::Network)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let meta = req
            .extensions()
            .get::<FetchMeta>()
            .copied()
            .unwrap_or_default();
        let span = info_span!(
            "tether.fetch",
            http.method = %req.method(),
            http.path = %req.uri().path(),
            cache.key = field::Empty,
            fetch.mode = ?meta.mode,
            fetch.outcome = field::Empty,
        );

        if !self.worker.participates(req.method(), req.uri()) {
            span.record("fetch.outcome", "bypass");
            let inner = self.upstream.call(req);
            return InterceptFuture::bypass(inner.instrument(span));
        }

        let key = CacheKey::from_uri(req.uri());
        span.record("cache.key", key.as_str());

        // The clone is not ready; keep the instance poll_ready was called on.
        let clone = self.upstream.clone();
        let mut upstream = std::mem::replace(&mut self.upstream, clone);
        let worker = self.worker.clone();
        let source_header = self.source_header.clone();
        let record_span = span.clone();

        let flow = async move {
            let (result, outcome) = match upstream.call(req).await {
                Ok(response) if response.status() == StatusCode::OK => {
                    worker.record_navigation(&meta, false);
                    let (parts, body) = response.into_parts();
                    let body = FetchBody::caching(body, worker.cache().clone(), key, &parts);
                    (Ok(Response::from_parts(parts, body)), FetchOutcome::Network)
                }
                Ok(response) => {
                    debug!(status = %response.status(), "response not cacheable");
                    worker.record_navigation(&meta, false);
                    (Ok(response.map(FetchBody::Passthrough)), FetchOutcome::Network)
                }
                Err(err) => fallback(&worker, &meta, &key, FetchError::Network(err)).await,
            };

            record_outcome(&record_span, outcome);
            result.map(|mut response| {
                if let Some(name) = source_header {
                    let value = match outcome {
                        FetchOutcome::Cache => HeaderValue::from_static("cache"),
                        _ => HeaderValue::from_static("network"),
                    };
                    response.headers_mut().insert(name, value);
                }
                response
            })
        }
        .instrument(span);

        InterceptFuture::intercept(Box::pin(flow))
    }
}

async fn fallback<B, E>(
    worker: &Worker,
    meta: &FetchMeta,
    key: &CacheKey,
    err: FetchError<E>,
) -> (Result<Response<FetchBody<B>>, FetchError<E>>, FetchOutcome) {
    worker.record_navigation(meta, true);
    match worker.cache().lookup(key).await {
        Some(snapshot) => {
            debug!("network failed, serving cached response");
            let response = snapshot.into_response().map(FetchBody::<B>::complete);
            (Ok(response), FetchOutcome::Cache)
        }
        None => {
            debug!("network failed and nothing is cached");
            (Err(err), FetchOutcome::Failed)
        }
    }
}

fn record_outcome(span: &Span, outcome: FetchOutcome) {
    span.record("fetch.outcome", outcome.as_str());
    record_fetch(outcome);
}
