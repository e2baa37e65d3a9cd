// ── Console facade ──
//
// Lifecycle management for one room server connection: initial
// hydration, the event feed, command routing, and reactive access to
// the projection through the DataStore.

use std::sync::Arc;

use tokio::sync::{Mutex, broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use roomctl_api::transport::{BasicCredentials, TlsMode, TransportConfig};
use roomctl_api::{RoomsClient, ServerEvent};

use crate::command::{Command, CommandResult};
use crate::config::{ConsoleConfig, TlsVerification};
use crate::dispatcher::Dispatcher;
use crate::error::CoreError;
use crate::feed::{EventFeed, FeedOptions, FeedState};
use crate::model::{PullStatus, RoomEntry, RoomsConfig};
use crate::store::{DataStore, StoreSnapshot};
use crate::stream::RoomStream;

// ── ConnectionState ──────────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ── Console ──────────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable. Does not talk to the server until
/// [`connect()`](Self::connect) is called.
#[derive(Clone)]
pub struct Console {
    inner: Arc<ConsoleInner>,
}

struct ConsoleInner {
    config: ConsoleConfig,
    dispatcher: Dispatcher,
    connection_state: watch::Sender<ConnectionState>,
    event_tx: broadcast::Sender<Arc<ServerEvent>>,
    feed: Mutex<Option<EventFeed>>,
    cancel: Mutex<CancellationToken>,
}

impl Console {
    /// Build the HTTP client and an empty store. Fails only when the URL
    /// or TLS settings are unusable.
    pub fn new(config: ConsoleConfig) -> Result<Self, CoreError> {
        let transport = build_transport(&config);
        let client = RoomsClient::new(config.url.as_str(), &transport)?;
        let dispatcher = Dispatcher::new(Arc::new(client), Arc::new(DataStore::new()));
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);

        Ok(Self {
            inner: Arc::new(ConsoleInner {
                config,
                dispatcher,
                connection_state,
                event_tx,
                feed: Mutex::new(None),
                cancel: Mutex::new(CancellationToken::new()),
            }),
        })
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<DataStore> {
        self.inner.dispatcher.store()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    // ── Connection lifecycle ─────────────────────────────────────────

    /// Load the rooms config and room list, then start the event feed
    /// if enabled.
    ///
    /// Reconnecting stops any feed left from an earlier `connect()`
    /// first. A rejected subscription fails the call with
    /// [`CoreError::Subscription`]; the loaded projection is kept.
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.stop_feed().await;
        self.inner
            .connection_state
            .send_replace(ConnectionState::Connecting);

        if let Err(e) = self.start().await {
            self.inner
                .connection_state
                .send_replace(ConnectionState::Failed);
            return Err(e);
        }

        self.inner
            .connection_state
            .send_replace(ConnectionState::Connected);
        info!(url = %self.inner.config.url, "connected to room server");
        Ok(())
    }

    async fn start(&self) -> Result<(), CoreError> {
        self.hydrate().await?;
        if !self.inner.config.events_enabled {
            return Ok(());
        }

        let cancel = CancellationToken::new();
        *self.inner.cancel.lock().await = cancel.clone();
        let options = FeedOptions {
            hydrate_created: self.inner.config.hydrate_created,
        };
        let feed = EventFeed::start(self.inner.dispatcher.clone(), options, cancel.clone())
            .await
            .inspect_err(|e| warn!(error = %e, "event subscription rejected"))?;
        self.spawn_relay(&feed, cancel);
        *self.inner.feed.lock().await = Some(feed);
        Ok(())
    }

    /// Cancel the current feed and its relay, waiting for the feed task.
    async fn stop_feed(&self) {
        self.inner.cancel.lock().await.cancel();
        if let Some(feed) = self.inner.feed.lock().await.take() {
            feed.shutdown().await;
        }
    }

    async fn hydrate(&self) -> Result<(), CoreError> {
        let dispatcher = &self.inner.dispatcher;
        let (config, rooms) = tokio::join!(dispatcher.rooms_config(), dispatcher.list_rooms(&[]));
        config?;
        rooms?;
        debug!(rooms = self.store().room_count(), "initial load complete");
        Ok(())
    }

    /// Forward feed events to the console's own broadcast so receivers
    /// obtained before `connect()` keep working across reconnects.
    fn spawn_relay(&self, feed: &EventFeed, cancel: CancellationToken) {
        let mut rx = feed.subscribe();
        let tx = self.inner.event_tx.clone();
        tokio::spawn(async move {
            loop {
                let received = tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    received = rx.recv() => received,
                };
                match received {
                    Ok(event) => {
                        let _ = tx.send(event);
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "event relay lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    /// Stop the event feed and mark the console disconnected. The store
    /// keeps its last projection.
    pub async fn disconnect(&self) {
        self.stop_feed().await;
        self.inner
            .connection_state
            .send_replace(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    // ── Command execution ────────────────────────────────────────────

    /// Execute a command against the server.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        if *self.inner.connection_state.borrow() != ConnectionState::Connected {
            return Err(CoreError::NotConnected);
        }
        self.inner.dispatcher.execute(cmd).await
    }

    // ── One-shot convenience ─────────────────────────────────────────

    /// Connect without the event feed, run the closure, disconnect.
    pub async fn oneshot<F, Fut, T>(config: ConsoleConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Console) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.events_enabled = false;

        let console = Console::new(cfg)?;
        console.connect().await?;
        let result = f(console.clone()).await;
        console.disconnect().await;
        result
    }

    // ── State observation ────────────────────────────────────────────

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    /// Feed state, or `None` when no feed is running.
    pub async fn feed_state(&self) -> Option<watch::Receiver<FeedState>> {
        self.inner.feed.lock().await.as_ref().map(EventFeed::state)
    }

    /// Subscribe to server events as they are folded into the store.
    pub fn events(&self) -> broadcast::Receiver<Arc<ServerEvent>> {
        self.inner.event_tx.subscribe()
    }

    // ── Store accessors ──────────────────────────────────────────────

    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.store().snapshot()
    }

    pub fn rooms_snapshot(&self) -> Arc<Vec<Arc<RoomEntry>>> {
        self.store().rooms_snapshot()
    }

    pub fn rooms(&self) -> RoomStream {
        self.store().subscribe_rooms()
    }

    pub fn rooms_config(&self) -> Option<Arc<RoomsConfig>> {
        self.store().rooms_config()
    }

    pub fn pull_status(&self) -> Arc<PullStatus> {
        self.store().pull_status()
    }
}

const EVENT_CHANNEL_SIZE: usize = 256;

fn build_transport(config: &ConsoleConfig) -> TransportConfig {
    let tls = match &config.tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    };
    let credentials = config.credentials.as_ref().map(|c| BasicCredentials {
        username: c.username.clone(),
        password: c.password.clone(),
    });

    TransportConfig {
        tls,
        timeout: config.timeout,
        cookie_jar: None,
        credentials,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use secrecy::{ExposeSecret, SecretString};
    use url::Url;

    use super::*;
    use crate::config::Credentials;

    fn config() -> ConsoleConfig {
        ConsoleConfig::new(Url::parse("http://127.0.0.1:1").expect("url"))
    }

    #[test]
    fn transport_carries_credentials_and_tls() {
        let mut cfg = config();
        cfg.tls = TlsVerification::CustomCa(PathBuf::from("/tmp/ca.pem"));
        cfg.credentials = Some(Credentials {
            username: "admin".into(),
            password: SecretString::from("s3cret"),
        });

        let transport = build_transport(&cfg);

        assert!(matches!(transport.tls, TlsMode::CustomCa(ref p) if p == &PathBuf::from("/tmp/ca.pem")));
        let creds = transport.credentials.expect("credentials");
        assert_eq!(creds.username, "admin");
        assert_eq!(creds.password.expose_secret(), "s3cret");
        assert_eq!(transport.timeout, ConsoleConfig::DEFAULT_TIMEOUT);
    }

    #[tokio::test]
    async fn execute_requires_connection() {
        let console = Console::new(config()).expect("console");
        let err = console
            .execute(Command::PullStatus)
            .await
            .expect_err("not connected");
        assert!(matches!(err, CoreError::NotConnected));
        assert_eq!(*console.connection_state().borrow(), ConnectionState::Disconnected);
    }
}
