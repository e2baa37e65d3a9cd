// ── Event feed adapter ──
//
// Folds server-sent room and pull events into the DataStore through the
// same mutation surface the dispatcher uses, and rebroadcasts every
// event for observers. One subscription per feed; no reconnect.

use std::sync::Arc;

use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use roomctl_api::types::{RoomEvent, RoomEventAction};
use roomctl_api::{EventSubscription, ServerEvent};

use crate::dispatcher::Dispatcher;
use crate::error::CoreError;
use crate::model::{InsertPosition, PullStatus, RoomPatch, RoomUpsert};
use crate::store::DataStore;

const EVENT_CHANNEL_SIZE: usize = 256;

// ── FeedState ────────────────────────────────────────────────────────

/// Lifecycle of the event subscription, observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedState {
    Connecting,
    Live,
    /// Server ended the stream, or the feed was shut down.
    Closed,
    /// The stream broke while reading.
    Failed(String),
}

impl FeedState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Failed(_))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FeedOptions {
    /// Fetch the full entry when `created` names a room the store lacks.
    pub hydrate_created: bool,
}

// ── Folding ──────────────────────────────────────────────────────────

/// What folding one event did to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Fold {
    Applied,
    /// `created` inserted a skeleton entry for a room not seen before.
    CreatedUnknown(String),
    Skipped,
}

/// Apply one server event to the store.
pub(crate) fn fold_event(store: &DataStore, event: &ServerEvent) -> Fold {
    match event {
        ServerEvent::Rooms(room_event) => fold_room_event(store, room_event),
        ServerEvent::Pull(status) => {
            store.set_pull_status(PullStatus::from(status.clone()));
            Fold::Applied
        }
        ServerEvent::Unknown { event, .. } => {
            debug!(event = %event, "ignoring unknown server event");
            Fold::Skipped
        }
    }
}

fn fold_room_event(store: &DataStore, event: &RoomEvent) -> Fold {
    let id = event.id.as_str();
    let patch = match &event.action {
        RoomEventAction::Created => {
            let inserted = store.upsert_room(
                RoomUpsert::Patch(RoomPatch::new(id)),
                InsertPosition::Front,
            );
            return if inserted {
                Fold::CreatedUnknown(id.to_owned())
            } else {
                Fold::Applied
            };
        }
        RoomEventAction::Destroyed => {
            store.remove_room(id);
            return Fold::Applied;
        }
        RoomEventAction::Started => RoomPatch {
            running: Some(true),
            paused: Some(false),
            status: Some("Up".into()),
            ..RoomPatch::new(id)
        },
        RoomEventAction::Ready => RoomPatch {
            is_ready: Some(true),
            ..RoomPatch::new(id)
        },
        RoomEventAction::Stopped => RoomPatch {
            running: Some(false),
            paused: Some(false),
            is_ready: Some(false),
            status: Some("Exited".into()),
            ..RoomPatch::new(id)
        },
        RoomEventAction::Paused => RoomPatch {
            running: Some(false),
            paused: Some(true),
            is_ready: Some(false),
            status: Some("Paused".into()),
            ..RoomPatch::new(id)
        },
        RoomEventAction::Other(action) => {
            debug!(room_id = %id, action = %action, "ignoring unknown room action");
            return Fold::Skipped;
        }
    };

    store.upsert_room(RoomUpsert::Patch(patch), InsertPosition::Front);
    Fold::Applied
}

// ── EventFeed ────────────────────────────────────────────────────────

/// Handle to a running event subscription.
pub struct EventFeed {
    state: watch::Receiver<FeedState>,
    events: broadcast::Sender<Arc<ServerEvent>>,
    cancel: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl EventFeed {
    /// Subscribe to the server event stream and spawn the folding task.
    ///
    /// Fails with [`CoreError::Subscription`] (or another connectivity
    /// error) when the subscription cannot be established.
    pub async fn start(
        dispatcher: Dispatcher,
        options: FeedOptions,
        cancel: CancellationToken,
    ) -> Result<Self, CoreError> {
        let (state_tx, state_rx) = watch::channel(FeedState::Connecting);

        let subscription = match dispatcher.client().subscribe_events().await {
            Ok(sub) => sub,
            Err(e) => {
                let err = CoreError::from(e);
                state_tx.send_replace(FeedState::Failed(err.to_string()));
                return Err(err);
            }
        };

        state_tx.send_replace(FeedState::Live);
        info!("event feed live");

        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let task = FeedTask {
            dispatcher,
            options,
            state: state_tx,
            events: events.clone(),
            cancel: cancel.clone(),
        };
        let handle = tokio::spawn(task.run(subscription));

        Ok(Self {
            state: state_rx,
            events,
            cancel,
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Subscribe to feed state changes.
    pub fn state(&self) -> watch::Receiver<FeedState> {
        self.state.clone()
    }

    /// Subscribe to every event the feed folds.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<ServerEvent>> {
        self.events.subscribe()
    }

    /// Stop the folding task and wait for it to finish.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.lock().await.take() {
            let _ = handle.await;
        }
    }
}

struct FeedTask {
    dispatcher: Dispatcher,
    options: FeedOptions,
    state: watch::Sender<FeedState>,
    events: broadcast::Sender<Arc<ServerEvent>>,
    cancel: CancellationToken,
}

impl FeedTask {
    async fn run(self, mut subscription: EventSubscription) {
        let final_state = loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break FeedState::Closed,
                item = subscription.next_event() => match item {
                    Some(Ok(event)) => self.handle(event),
                    Some(Err(roomctl_api::Error::Deserialization { message, .. })) => {
                        warn!(error = %message, "skipping malformed server event");
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "event feed failed");
                        break FeedState::Failed(e.to_string());
                    }
                    None => {
                        info!("event feed closed by server");
                        break FeedState::Closed;
                    }
                },
            }
        };
        self.state.send_replace(final_state);
    }

    fn handle(&self, event: ServerEvent) {
        let store = self.dispatcher.store();
        if let Fold::CreatedUnknown(id) = fold_event(store, &event) {
            if self.options.hydrate_created {
                self.hydrate(id);
            }
        }
        // No receivers is fine.
        let _ = self.events.send(Arc::new(event));
    }

    fn hydrate(&self, id: String) {
        let dispatcher = self.dispatcher.clone();
        tokio::spawn(async move {
            if let Err(e) = dispatcher.get_room(&id).await {
                warn!(room_id = %id, error = %e, "failed to hydrate created room");
            }
        });
    }
}
