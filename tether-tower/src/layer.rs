use http::HeaderName;
use tether::Worker;
use tower::Layer;

use crate::service::InterceptService;

/// Tower [`Layer`] that puts a [`Worker`] in front of a network service.
#[derive(Clone, Debug)]
pub struct Intercept {
    worker: Worker,
    source_header: Option<HeaderName>,
}

impl Intercept {
    /// Intercepts requests on behalf of `worker`.
    pub fn new(worker: Worker) -> Self {
        Self {
            worker,
            source_header: None,
        }
    }

    /// Creates a builder. A worker must be set before building.
    pub fn builder() -> InterceptBuilder<NotSet> {
        InterceptBuilder::default()
    }
}

impl<S> Layer<S> for Intercept {
    type Service = InterceptService<S>;

    fn layer(&self, upstream: S) -> Self::Service {
        InterceptService::new(upstream, self.worker.clone(), self.source_header.clone())
    }
}

/// Marker for a builder slot that has not been filled yet.
#[derive(Clone, Copy, Debug, Default)]
pub struct NotSet;

/// Builder for [`Intercept`].
#[derive(Clone, Debug, Default)]
pub struct InterceptBuilder<W> {
    worker: W,
    source_header: Option<HeaderName>,
}

impl<W> InterceptBuilder<W> {
    /// Sets the worker that owns cache and connectivity state.
    pub fn worker(self, worker: Worker) -> InterceptBuilder<Worker> {
        InterceptBuilder {
            worker,
            source_header: self.source_header,
        }
    }

    /// Marks every intercepted response with a header naming where it came
    /// from: `network` or `cache`.
    ///
    /// Off by default, so responses reach the page unchanged.
    pub fn source_header(self, name: HeaderName) -> Self {
        InterceptBuilder {
            source_header: Some(name),
            ..self
        }
    }
}

impl InterceptBuilder<Worker> {
    /// Builds the layer.
    pub fn build(self) -> Intercept {
        Intercept {
            worker: self.worker,
            source_header: self.source_header,
        }
    }
}
