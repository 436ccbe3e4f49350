//! Future types for the intercept service.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::ready;
use http::Response;
use pin_project::pin_project;
use tracing::instrument::Instrumented;

use crate::body::FetchBody;
use crate::error::FetchError;

pub(crate) type BoxedFetch<B, E> =
    Pin<Box<dyn Future<Output = Result<Response<FetchBody<B>>, FetchError<E>>> + Send>>;

/// Future returned by [`InterceptService`](crate::InterceptService).
///
/// Bypassed requests poll the network future in place; intercepted ones run
/// the boxed network-then-cache flow.
#[pin_project(project = InterceptFutureProj)]
pub enum InterceptFuture<F, B, E> {
    /// The worker does not participate in this request.
    Bypass {
        /// Network response future.
        #[pin]
        inner: Instrumented<F>,
    },
    /// Network first, cache on failure.
    Intercept {
        /// The interception flow.
        inner: BoxedFetch<B, E>,
    },
}

impl<F, B, E> InterceptFuture<F, B, E> {
    pub(crate) fn bypass(inner: Instrumented<F>) -> Self {
        InterceptFuture::Bypass { inner }
    }

    pub(crate) fn intercept(inner: BoxedFetch<B, E>) -> Self {
        InterceptFuture::Intercept { inner }
    }
}

impl<F, B, E> Future for InterceptFuture<F, B, E>
where
    F: Future<Output = Result<Response<B>, E>>,
{
    type Output = Result<Response<FetchBody<B>>, FetchError<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project() {
            InterceptFutureProj::Bypass { inner } => {
                let result = ready!(inner.poll(cx));
                Poll::Ready(
                    result
                        .map(|response| response.map(FetchBody::Passthrough))
                        .map_err(FetchError::Network),
                )
            }
            InterceptFutureProj::Intercept { inner } => inner.as_mut().poll(cx),
        }
    }
}
