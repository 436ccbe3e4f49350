//! Page startup: register, wait for the worker, ask for connectivity.

use std::sync::Arc;

use tether_core::{
    ClientId, ClientMessage, DeliveryError, MessagePort, Registrar, RegistrationError,
    RegistrationOptions,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::BootstrapConfig;
use crate::renderer::IndicatorRenderer;

/// Starts the page side of the offline layer.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    config: BootstrapConfig,
    renderer: IndicatorRenderer,
    client_id: Option<ClientId>,
}

/// What a page ended up with after [`Bootstrap::start`].
#[derive(Debug)]
pub enum PageSession {
    /// The worker is active and pushes connectivity updates.
    Connected(Session),
    /// No worker: the page runs without offline support.
    Degraded(RegistrationError),
}

impl PageSession {
    /// Whether a worker is attached.
    pub fn is_connected(&self) -> bool {
        matches!(self, PageSession::Connected(_))
    }

    /// The live session, if any.
    pub fn session(&self) -> Option<&Session> {
        match self {
            PageSession::Connected(session) => Some(session),
            PageSession::Degraded(_) => None,
        }
    }
}

/// Live connection between a page and its worker.
///
/// Dropping the session stops listening for pushes and disconnects the page
/// from the worker.
pub struct Session {
    client_id: ClientId,
    port: Arc<dyn MessagePort>,
    listener: JoinHandle<()>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("client_id", &self.client_id)
            .field("listening", &!self.listener.is_finished())
            .finish()
    }
}

impl Session {
    /// Identifier the worker knows this page by.
    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Posts a message to the worker.
    pub fn post(&self, message: ClientMessage) -> Result<(), DeliveryError> {
        self.port.post_message(message)
    }

    /// Whether the page is still receiving pushes from the worker.
    pub fn is_listening(&self) -> bool {
        !self.listener.is_finished()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.listener.abort();
        self.port.close();
    }
}

impl Bootstrap {
    /// Creates a bootstrap rendering connectivity through `renderer`.
    pub fn new(config: BootstrapConfig, renderer: IndicatorRenderer) -> Self {
        Self {
            config,
            renderer,
            client_id: None,
        }
    }

    /// Registers under the identifier the navigation reserved for this page.
    pub fn with_client_id(mut self, id: ClientId) -> Self {
        self.client_id = Some(id);
        self
    }

    /// Configuration in use.
    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    /// Registers the worker, waits until it is active, and sends the
    /// initial `requestOfflineMode`.
    ///
    /// `registrar` is `None` when the environment has no worker support.
    /// Every failure degrades the page instead of erroring.
    pub async fn start(&self, registrar: Option<Arc<dyn Registrar>>) -> PageSession {
        let Some(registrar) = registrar else {
            info!("background workers unsupported, running without offline support");
            return PageSession::Degraded(RegistrationError::Unsupported);
        };

        let mut options = RegistrationOptions::scope(self.config.scope.clone());
        if let Some(id) = self.client_id {
            options = options.client_id(id);
        }
        let mut registration = match registrar.register(&self.config.script_url, options).await {
            Ok(registration) => registration,
            Err(err) => {
                error!(script = %self.config.script_url, error = %err, "worker registration failed");
                return PageSession::Degraded(err);
            }
        };

        if let Err(err) = registration.ready().await {
            error!(script = %self.config.script_url, error = %err, "worker never became ready");
            let (_, port, _) = registration.into_channel();
            port.close();
            return PageSession::Degraded(err);
        }

        let (client_id, port, inbox) = registration.into_channel();
        let listener = tokio::spawn(listen(client_id, inbox, self.renderer.clone()));

        if let Err(err) = port.post_message(ClientMessage::RequestOfflineMode) {
            warn!(client = %client_id, error = %err, "offline mode request not delivered");
        }

        debug!(client = %client_id, "page connected to worker");
        PageSession::Connected(Session {
            client_id,
            port,
            listener,
        })
    }
}

async fn listen(
    client_id: ClientId,
    mut inbox: mpsc::UnboundedReceiver<ClientMessage>,
    renderer: IndicatorRenderer,
) {
    while let Some(message) = inbox.recv().await {
        match message {
            ClientMessage::OfflineMode { val } => renderer.schedule(val),
            ClientMessage::RequestOfflineMode => {
                debug!(client = %client_id, "ignoring page-bound requestOfflineMode");
            }
        }
    }
    debug!(client = %client_id, "worker channel closed");
}
