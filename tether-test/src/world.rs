//! Cucumber world for offline scenarios.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Error, anyhow};
use cucumber::World;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use tether::{FetchMeta, Worker, WorkerConfig};
use tether_client::{
    Bootstrap, BootstrapConfig, ElementId, IndicatorRenderer, ManualFrames, MemoryDocument,
    PageSession,
};
use tether_core::{ClientId, ClientMessage, Registrar};
use tether_tower::{Intercept, InterceptService};
use tower::{Layer, ServiceExt};
use tracing::instrument::WithSubscriber;

use crate::network::MockNetwork;
use crate::storage::FaultyStorage;
use crate::tracing::{SpanCollector, create_span_collector};

/// An open page with its offline indicator.
#[derive(Debug)]
pub struct Page {
    /// Live connection to the worker.
    pub session: PageSession,
    /// The page's document.
    pub document: Arc<MemoryDocument>,
    /// The page's frame clock.
    pub frames: Arc<ManualFrames>,
    /// The offline indicator element.
    pub indicator: ElementId,
}

impl Page {
    /// Identifier the worker knows this page by.
    pub fn client_id(&self) -> Result<ClientId, Error> {
        self.session
            .session()
            .map(|session| session.client_id())
            .ok_or_else(|| anyhow!("page is not connected to a worker"))
    }

    /// Runs the next frame once one has been requested, or gives up after a
    /// short wait.
    pub async fn render(&self) {
        let frames = self.frames.clone();
        let _ = tokio::time::timeout(Duration::from_millis(500), async move {
            while frames.pending() == 0 {
                tokio::task::yield_now().await;
            }
        })
        .await;
        self.frames.run_frame();
    }

    /// Whether the indicator is currently visible.
    pub fn indicator_visible(&self) -> bool {
        self.document.has_class(self.indicator, "offline_visible")
    }
}

/// Outcome of the last request made in a scenario.
#[derive(Debug)]
pub enum LastResponse {
    /// The request was answered.
    Answered {
        /// Response status.
        status: StatusCode,
        /// Response body.
        body: String,
    },
    /// The request failed.
    Failed(String),
}

#[derive(World)]
#[world(init = Self::new)]
pub struct OfflineWorld {
    pub storage: Arc<FaultyStorage>,
    pub network: MockNetwork,
    pub worker: Option<Worker>,
    pub service: Option<InterceptService<MockNetwork>>,
    pub pages: HashMap<String, Page>,
    pub last_response: Option<LastResponse>,
    pub span_collector: SpanCollector,
}

impl OfflineWorld {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(FaultyStorage::new()),
            network: MockNetwork::new(),
            worker: None,
            service: None,
            pages: HashMap::new(),
            last_response: None,
            span_collector: create_span_collector(),
        }
    }

    /// Starts a worker for `generation` over the scenario's storage.
    pub fn start_worker(&mut self, generation: &str) -> Worker {
        let config = WorkerConfig::builder().generation(generation.to_owned()).build();
        let worker = Worker::new(config, self.storage.clone());
        self.service = Some(Intercept::new(worker.clone()).layer(self.network.clone()));
        self.worker = Some(worker.clone());
        worker
    }

    pub fn worker(&self) -> Result<&Worker, Error> {
        self.worker
            .as_ref()
            .ok_or_else(|| anyhow!("no worker started"))
    }

    pub fn page(&self, name: &str) -> Result<&Page, Error> {
        self.pages
            .get(name)
            .ok_or_else(|| anyhow!("page {name} is not open"))
    }

    /// Opens a page and runs its bootstrap against the current worker.
    pub async fn open_page(&mut self, name: &str) -> Result<(), Error> {
        let worker = self.worker()?.clone();
        let config = BootstrapConfig::default();
        let document = Arc::new(MemoryDocument::new());
        let indicator = document.add_element(&[config.indicator_class.as_str()]);
        let frames = Arc::new(ManualFrames::new());
        let renderer = IndicatorRenderer::new(
            document.clone(),
            frames.clone(),
            config.indicator_class.clone(),
            config.visible_class.clone(),
        );

        let session = Bootstrap::new(config, renderer)
            .start(Some(Arc::new(worker) as Arc<dyn Registrar>))
            .await;
        if let PageSession::Degraded(err) = &session {
            return Err(anyhow!("page {name} failed to start: {err}"));
        }

        let page = Page {
            session,
            document,
            frames,
            indicator,
        };
        page.render().await;
        self.pages.insert(name.to_owned(), page);
        Ok(())
    }

    /// Sends `method uri` through the interceptor.
    pub async fn request(
        &mut self,
        method: Method,
        uri: &str,
        meta: FetchMeta,
    ) -> Result<(), Error> {
        let service = self
            .service
            .clone()
            .ok_or_else(|| anyhow!("no worker started"))?;
        let mut request = Request::builder().method(method).uri(uri).body(())?;
        request.extensions_mut().insert(meta);

        // The body is read under the collector too: reading it to the end
        // triggers the cache write.
        let outcome = async move {
            match service.oneshot(request).await {
                Ok(response) => {
                    let status = response.status();
                    let bytes = response.into_body().collect().await?.to_bytes();
                    Ok::<_, Error>(LastResponse::Answered {
                        status,
                        body: String::from_utf8(bytes.to_vec())?,
                    })
                }
                Err(err) => Ok(LastResponse::Failed(err.to_string())),
            }
        }
        .with_subscriber(self.span_collector.dispatch().clone())
        .await?;

        self.last_response = Some(outcome);
        Ok(())
    }

    /// Navigation issued by page `name`.
    pub async fn navigate(&mut self, name: &str, uri: &str) -> Result<(), Error> {
        let client = self.page(name)?.client_id()?;
        self.request(Method::GET, uri, FetchMeta::navigate(client)).await
    }

    /// Page `name` pulls the current connectivity state.
    pub fn request_offline_mode(&self, name: &str) -> Result<(), Error> {
        let page = self.page(name)?;
        let session = page
            .session
            .session()
            .ok_or_else(|| anyhow!("page {name} is not connected"))?;
        session.post(ClientMessage::RequestOfflineMode)?;
        Ok(())
    }

    /// Waits for every lifecycle task of the current worker.
    pub async fn settle(&self) -> Result<(), Error> {
        let settled = self
            .worker()?
            .lifecycle()
            .settled_timeout(Duration::from_secs(5))
            .await;
        if settled {
            Ok(())
        } else {
            Err(anyhow!("lifecycle tasks did not complete within timeout"))
        }
    }
}

impl Default for OfflineWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OfflineWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineWorld")
            .field("worker", &self.worker)
            .field("pages", &self.pages.keys().collect::<Vec<_>>())
            .field("last_response", &self.last_response)
            .field("network_calls", &self.network.calls())
            .finish()
    }
}
