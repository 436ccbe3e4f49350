use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tether::{FetchMeta, Worker, WorkerConfig};
use tether_client::{
    Bootstrap, BootstrapConfig, IndicatorRenderer, ManualFrames, MemoryDocument, PageSession,
};
use tether_core::{
    ClientId, ClientMessage, DeliveryError, MessagePort, Registrar, Registration,
    RegistrationError, RegistrationOptions, WorkerState,
};
use tether_moka::MokaStorage;
use tokio::sync::{mpsc, watch};

struct Page {
    document: Arc<MemoryDocument>,
    frames: Arc<ManualFrames>,
    bootstrap: Bootstrap,
}

fn page(config: BootstrapConfig) -> Page {
    let document = Arc::new(MemoryDocument::new());
    let frames = Arc::new(ManualFrames::new());
    let renderer = IndicatorRenderer::new(
        document.clone(),
        frames.clone(),
        config.indicator_class.clone(),
        config.visible_class.clone(),
    );
    Page {
        document,
        frames,
        bootstrap: Bootstrap::new(config, renderer),
    }
}

async fn next_frame(frames: &ManualFrames) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while frames.pending() == 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("no frame was requested");
    frames.run_frame();
}

#[tokio::test]
async fn startup_handshake_hides_indicator() {
    let worker = Worker::new(WorkerConfig::default(), MokaStorage::default());
    let page = page(BootstrapConfig::default());
    let banner = page.document.add_element(&["offline", "offline_visible"]);

    let session = page
        .bootstrap
        .start(Some(Arc::new(worker.clone()) as Arc<dyn Registrar>))
        .await;

    assert!(session.is_connected());
    assert_eq!(worker.state(), WorkerState::Activated);
    next_frame(&page.frames).await;
    assert!(!page.document.has_class(banner, "offline_visible"));
}

#[tokio::test]
async fn failed_navigation_push_shows_indicator() {
    let worker = Worker::new(WorkerConfig::default(), MokaStorage::default());
    let page = page(BootstrapConfig::default());
    let banner = page.document.add_element(&["offline"]);

    let session = page
        .bootstrap
        .start(Some(Arc::new(worker.clone()) as Arc<dyn Registrar>))
        .await;
    let client = session.session().unwrap().client_id();
    next_frame(&page.frames).await;

    worker.record_navigation(&FetchMeta::navigate(client), true);
    next_frame(&page.frames).await;

    assert!(page.document.has_class(banner, "offline_visible"));
}

#[tokio::test]
async fn pull_after_failed_navigation_reports_offline() {
    let worker = Worker::new(WorkerConfig::default(), MokaStorage::default());
    let page = page(BootstrapConfig::default());
    let banner = page.document.add_element(&["offline"]);

    let session = page
        .bootstrap
        .start(Some(Arc::new(worker.clone()) as Arc<dyn Registrar>))
        .await;
    next_frame(&page.frames).await;

    worker.record_navigation(&FetchMeta::navigate(worker.clients().reserve()), true);
    session
        .session()
        .unwrap()
        .post(ClientMessage::RequestOfflineMode)
        .unwrap();
    next_frame(&page.frames).await;

    assert!(page.document.has_class(banner, "offline_visible"));
}

#[tokio::test]
async fn unsupported_environment_degrades() {
    let page = page(BootstrapConfig::default());
    let session = page.bootstrap.start(None).await;

    assert!(matches!(
        session,
        PageSession::Degraded(RegistrationError::Unsupported)
    ));
    assert_eq!(page.frames.pending(), 0);
}

#[tokio::test]
async fn rejected_registration_degrades() {
    let worker = Worker::new(WorkerConfig::default(), MokaStorage::default());
    let page = page(BootstrapConfig {
        script_url: "/missing.js".to_owned(),
        ..BootstrapConfig::default()
    });

    let session = page
        .bootstrap
        .start(Some(Arc::new(worker.clone()) as Arc<dyn Registrar>))
        .await;

    assert!(matches!(
        session,
        PageSession::Degraded(RegistrationError::ScriptMismatch(_))
    ));
    assert_eq!(worker.state(), WorkerState::Installing);
}

struct NullPort;

impl MessagePort for NullPort {
    fn post_message(&self, _message: ClientMessage) -> Result<(), DeliveryError> {
        Err(DeliveryError::Closed)
    }
}

/// Registrar whose worker dies before activating.
struct DyingRegistrar;

#[async_trait]
impl Registrar for DyingRegistrar {
    async fn register(
        &self,
        _script_url: &str,
        options: RegistrationOptions,
    ) -> Result<Registration, RegistrationError> {
        let (_tx, inbox) = mpsc::unbounded_channel();
        let (_state_tx, state) = watch::channel(WorkerState::Installing);
        Ok(Registration::new(
            ClientId::new(1),
            options.scope,
            Arc::new(NullPort),
            inbox,
            state,
        ))
    }
}

#[tokio::test]
async fn worker_dying_before_ready_degrades() {
    let page = page(BootstrapConfig::default());
    let session = page
        .bootstrap
        .start(Some(Arc::new(DyingRegistrar) as Arc<dyn Registrar>))
        .await;

    assert!(matches!(
        session,
        PageSession::Degraded(RegistrationError::WorkerGone)
    ));
}

#[tokio::test]
async fn dropped_sessions_leave_no_registrations() {
    let worker = Worker::new(WorkerConfig::default(), MokaStorage::default());

    for _ in 0..100 {
        let page = page(BootstrapConfig::default());
        let session = page
            .bootstrap
            .start(Some(Arc::new(worker.clone()) as Arc<dyn Registrar>))
            .await;
        assert!(session.is_connected());
        drop(session);
    }

    assert!(worker.clients().is_empty());
}

#[tokio::test]
async fn page_from_failed_navigation_gets_later_pushes() {
    let worker = Worker::new(WorkerConfig::default(), MokaStorage::default());
    let reserved = worker.reserve_client();
    let page = page(BootstrapConfig::default());
    let banner = page.document.add_element(&["offline"]);

    let session = page
        .bootstrap
        .clone()
        .with_client_id(reserved)
        .start(Some(Arc::new(worker.clone()) as Arc<dyn Registrar>))
        .await;
    assert_eq!(session.session().unwrap().client_id(), reserved);
    next_frame(&page.frames).await;
    assert!(!page.document.has_class(banner, "offline_visible"));

    worker.record_navigation(&FetchMeta::navigate(reserved), true);
    next_frame(&page.frames).await;

    assert!(page.document.has_class(banner, "offline_visible"));
}
