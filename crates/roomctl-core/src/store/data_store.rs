// ── Central reactive data store ──
//
// Single owner of all projected server state. Every mutation runs under
// one lock, bumps the store version, and publishes copy-on-write
// snapshots to `watch` subscribers.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::watch;
use tracing::trace;

use super::collection::RoomCollection;
use crate::model::{
    InsertPosition, PullStatus, ReferenceTables, RoomEntry, RoomUpsert, RoomsConfig,
};
use crate::stream::RoomStream;

/// Point-in-time view of the whole store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreSnapshot {
    pub rooms: Arc<Vec<Arc<RoomEntry>>>,
    pub rooms_config: Option<Arc<RoomsConfig>>,
    pub pull_status: Arc<PullStatus>,
    /// Bumped once per effective mutation.
    pub version: u64,
}

/// Which parts of the store a mutation touched.
#[derive(Debug, Clone, Copy, Default)]
struct Touched {
    rooms: bool,
    rooms_config: bool,
    pull_status: bool,
}

impl Touched {
    const NOTHING: Self = Self {
        rooms: false,
        rooms_config: false,
        pull_status: false,
    };
    const ROOMS: Self = Self {
        rooms: true,
        ..Self::NOTHING
    };

    fn any(self) -> bool {
        self.rooms || self.rooms_config || self.pull_status
    }
}

struct StoreState {
    rooms: RoomCollection,
    current: Arc<StoreSnapshot>,
}

/// Reactive projection of rooms, pull status, and rooms config.
///
/// Reads are served from the last published snapshot and never block on
/// writers for longer than one mutation. Mutations are crate-private:
/// only the dispatcher and the event feed change state.
pub struct DataStore {
    state: Mutex<StoreState>,
    snapshot: watch::Sender<Arc<StoreSnapshot>>,
    rooms: watch::Sender<Arc<Vec<Arc<RoomEntry>>>>,
    rooms_config: watch::Sender<Option<Arc<RoomsConfig>>>,
    pull_status: watch::Sender<Arc<PullStatus>>,
}

impl DataStore {
    pub fn new() -> Self {
        let initial = Arc::new(StoreSnapshot::default());
        let (snapshot, _) = watch::channel(Arc::clone(&initial));
        let (rooms, _) = watch::channel(Arc::clone(&initial.rooms));
        let (rooms_config, _) = watch::channel(None);
        let (pull_status, _) = watch::channel(Arc::clone(&initial.pull_status));

        Self {
            state: Mutex::new(StoreState {
                rooms: RoomCollection::new(),
                current: initial,
            }),
            snapshot,
            rooms,
            rooms_config,
            pull_status,
        }
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Replace the cached rooms config.
    pub(crate) fn set_rooms_config(&self, config: RoomsConfig) {
        let config = Arc::new(config);
        self.mutate(|_, next| {
            next.rooms_config = Some(config);
            Touched {
                rooms_config: true,
                ..Touched::NOTHING
            }
        });
    }

    /// Replace the whole room list with `entries`, in order.
    pub(crate) fn replace_room_list(&self, entries: Vec<RoomEntry>) {
        self.mutate(|rooms, _| {
            rooms.replace_all(entries);
            Touched::ROOMS
        });
    }

    /// Insert or merge one room. Returns `true` if the room was new.
    pub(crate) fn upsert_room(&self, upsert: RoomUpsert, position: InsertPosition) -> bool {
        let mut inserted = false;
        self.mutate(|rooms, _| {
            let noop = matches!(&upsert, RoomUpsert::Patch(p) if p.is_empty())
                && rooms.get(upsert.id()).is_some();
            if noop {
                return Touched::NOTHING;
            }
            inserted = rooms.upsert(upsert, position);
            Touched::ROOMS
        });
        inserted
    }

    /// Remove a room. A missing id changes nothing and publishes nothing.
    pub(crate) fn remove_room(&self, id: &str) -> Option<Arc<RoomEntry>> {
        let mut removed = None;
        self.mutate(|rooms, _| {
            removed = rooms.remove(id);
            if removed.is_some() {
                Touched::ROOMS
            } else {
                Touched::NOTHING
            }
        });
        removed
    }

    /// Replace `old_id` with `entry` as one atomic mutation.
    pub(crate) fn swap_room(&self, old_id: &str, entry: RoomEntry, position: InsertPosition) {
        self.mutate(|rooms, _| {
            rooms.remove(old_id);
            rooms.upsert(RoomUpsert::Full(entry), position);
            Touched::ROOMS
        });
    }

    /// Replace the pull status wholesale.
    pub(crate) fn set_pull_status(&self, status: PullStatus) {
        let status = Arc::new(status);
        self.mutate(|_, next| {
            next.pull_status = status;
            Touched {
                pull_status: true,
                ..Touched::NOTHING
            }
        });
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.snapshot.borrow().clone()
    }

    pub fn rooms_snapshot(&self) -> Arc<Vec<Arc<RoomEntry>>> {
        self.rooms.borrow().clone()
    }

    pub fn room(&self, id: &str) -> Option<Arc<RoomEntry>> {
        self.lock().rooms.get(id)
    }

    /// First room with the given display name.
    pub fn room_by_name(&self, name: &str) -> Option<Arc<RoomEntry>> {
        self.rooms
            .borrow()
            .iter()
            .find(|r| r.name == name)
            .map(Arc::clone)
    }

    pub fn room_count(&self) -> usize {
        self.lock().rooms.len()
    }

    pub fn rooms_config(&self) -> Option<Arc<RoomsConfig>> {
        self.rooms_config.borrow().clone()
    }

    pub fn pull_status(&self) -> Arc<PullStatus> {
        self.pull_status.borrow().clone()
    }

    pub fn version(&self) -> u64 {
        self.snapshot.borrow().version
    }

    pub fn reference(&self) -> &'static ReferenceTables {
        ReferenceTables::get()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe(&self) -> watch::Receiver<Arc<StoreSnapshot>> {
        self.snapshot.subscribe()
    }

    pub fn subscribe_rooms(&self) -> RoomStream {
        RoomStream::new(self.rooms.subscribe())
    }

    pub fn subscribe_pull_status(&self) -> watch::Receiver<Arc<PullStatus>> {
        self.pull_status.subscribe()
    }

    pub fn subscribe_rooms_config(&self) -> watch::Receiver<Option<Arc<RoomsConfig>>> {
        self.rooms_config.subscribe()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        // No mutation panics mid-way; poison carries no partial state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one mutation and publish the result.
    ///
    /// The lock is held across publication so subscribers observe
    /// snapshots in mutation order.
    fn mutate<F>(&self, f: F)
    where
        F: FnOnce(&mut RoomCollection, &mut StoreSnapshot) -> Touched,
    {
        let mut state = self.lock();
        let StoreState { rooms, current } = &mut *state;

        let mut next = (**current).clone();
        let touched = f(rooms, &mut next);
        if !touched.any() {
            return;
        }

        if touched.rooms {
            next.rooms = Arc::new(rooms.to_vec());
        }
        next.version = current.version + 1;
        let next = Arc::new(next);
        *current = Arc::clone(&next);

        trace!(
            version = next.version,
            rooms = next.rooms.len(),
            "store mutated"
        );

        if touched.rooms {
            self.rooms.send_replace(Arc::clone(&next.rooms));
        }
        if touched.rooms_config {
            self.rooms_config.send_replace(next.rooms_config.clone());
        }
        if touched.pull_status {
            self.pull_status.send_replace(Arc::clone(&next.pull_status));
        }
        self.snapshot.send_replace(next);
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}
