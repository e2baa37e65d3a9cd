// ── Command dispatcher ──
//
// One remote call per operation, then at most one store mutation with
// the server-confirmed value. Nothing touches the store before the call
// succeeds, and failures leave it as it was.

use std::sync::Arc;

use tracing::debug;

use roomctl_api::RoomsClient;
use roomctl_api::types::PullStart;

use crate::command::{Command, CommandResult, CreateRoomRequest, PullRequest, RecreateRoomRequest};
use crate::error::CoreError;
use crate::model::{
    InsertPosition, PullStatus, RoomEntry, RoomPatch, RoomSettings, RoomStats, RoomUpsert,
    RoomsConfig,
};
use crate::store::DataStore;

/// Performs remote calls and commits their results to the store.
///
/// Cheaply cloneable. Operations are independent async calls, so several
/// can be in flight at once; their mutations land in completion order.
#[derive(Clone)]
pub struct Dispatcher {
    client: Arc<RoomsClient>,
    store: Arc<DataStore>,
}

impl Dispatcher {
    pub fn new(client: Arc<RoomsClient>, store: Arc<DataStore>) -> Self {
        Self { client, store }
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.store
    }

    pub fn client(&self) -> &Arc<RoomsClient> {
        &self.client
    }

    // ── Config ───────────────────────────────────────────────────────

    pub async fn rooms_config(&self) -> Result<RoomsConfig, CoreError> {
        let config = RoomsConfig::from(self.client.rooms_config().await?);
        self.store.set_rooms_config(config.clone());
        Ok(config)
    }

    // ── Rooms ────────────────────────────────────────────────────────

    /// Fetch the room list and make it the store's room list.
    ///
    /// With label filters the store ends up holding only matching rooms.
    pub async fn list_rooms(&self, labels: &[(String, String)]) -> Result<Vec<RoomEntry>, CoreError> {
        let rooms: Vec<RoomEntry> = self
            .client
            .list_rooms(labels)
            .await?
            .into_iter()
            .map(RoomEntry::from)
            .collect();
        debug!(count = rooms.len(), "room list loaded");
        self.store.replace_room_list(rooms.clone());
        Ok(rooms)
    }

    /// Create a room without starting it.
    pub async fn create_room(&self, settings: &RoomSettings) -> Result<RoomEntry, CoreError> {
        self.create(settings, false).await
    }

    pub async fn create_and_start_room(
        &self,
        settings: &RoomSettings,
    ) -> Result<RoomEntry, CoreError> {
        self.create(settings, true).await
    }

    async fn create(&self, settings: &RoomSettings, start: bool) -> Result<RoomEntry, CoreError> {
        let entry = RoomEntry::from(self.client.create_room(settings, start).await?);
        debug!(room_id = %entry.id, name = %entry.name, start, "room created");
        self.store
            .upsert_room(RoomUpsert::Full(entry.clone()), InsertPosition::Front);
        Ok(entry)
    }

    pub async fn get_room(&self, id: &str) -> Result<RoomEntry, CoreError> {
        let entry = RoomEntry::from(self.client.get_room(id).await?);
        self.store
            .upsert_room(RoomUpsert::Full(entry.clone()), InsertPosition::Back);
        Ok(entry)
    }

    pub async fn get_room_by_name(&self, name: &str) -> Result<RoomEntry, CoreError> {
        let entry = RoomEntry::from(self.client.get_room_by_name(name).await?);
        self.store
            .upsert_room(RoomUpsert::Full(entry.clone()), InsertPosition::Back);
        Ok(entry)
    }

    pub async fn remove_room(&self, id: &str) -> Result<(), CoreError> {
        self.client.remove_room(id).await?;
        debug!(room_id = %id, "room removed");
        self.store.remove_room(id);
        Ok(())
    }

    pub async fn start_room(&self, id: &str) -> Result<(), CoreError> {
        self.client.start_room(id).await?;
        self.store.upsert_room(
            RoomUpsert::Patch(RoomPatch {
                running: Some(true),
                paused: Some(false),
                status: Some("Up".into()),
                ..RoomPatch::new(id)
            }),
            InsertPosition::Front,
        );
        Ok(())
    }

    pub async fn stop_room(&self, id: &str) -> Result<(), CoreError> {
        self.client.stop_room(id).await?;
        self.store.upsert_room(
            RoomUpsert::Patch(RoomPatch {
                running: Some(false),
                paused: Some(false),
                status: Some("Exited".into()),
                ..RoomPatch::new(id)
            }),
            InsertPosition::Front,
        );
        Ok(())
    }

    pub async fn pause_room(&self, id: &str) -> Result<(), CoreError> {
        self.client.pause_room(id).await?;
        self.store.upsert_room(
            RoomUpsert::Patch(RoomPatch {
                running: Some(false),
                paused: Some(true),
                status: Some("Paused".into()),
                ..RoomPatch::new(id)
            }),
            InsertPosition::Front,
        );
        Ok(())
    }

    /// Restart leaves the projection alone; the event feed reports the
    /// resulting transitions.
    pub async fn restart_room(&self, id: &str) -> Result<(), CoreError> {
        self.client.restart_room(id).await?;
        Ok(())
    }

    /// Recreate a room's container. The server assigns a new id, so the
    /// old entry is swapped for the returned one in a single mutation.
    pub async fn recreate_room(
        &self,
        id: &str,
        settings: Option<&RoomSettings>,
        start: Option<bool>,
    ) -> Result<RoomEntry, CoreError> {
        let entry = RoomEntry::from(self.client.recreate_room(id, settings, start).await?);
        debug!(old_id = %id, room_id = %entry.id, "room recreated");
        self.store
            .swap_room(id, entry.clone(), InsertPosition::Front);
        Ok(entry)
    }

    pub async fn room_settings(&self, id: &str) -> Result<RoomSettings, CoreError> {
        Ok(self.client.room_settings(id).await?)
    }

    pub async fn room_stats(&self, id: &str) -> Result<RoomStats, CoreError> {
        Ok(self.client.room_stats(id).await?)
    }

    // ── Pull ─────────────────────────────────────────────────────────

    pub async fn pull_start(&self, request: &PullRequest) -> Result<PullStatus, CoreError> {
        let status = PullStatus::from(self.client.pull_start(&PullStart::from(request)).await?);
        debug!(image = %request.image, active = status.active, "pull started");
        self.store.set_pull_status(status.clone());
        Ok(status)
    }

    pub async fn pull_status(&self) -> Result<PullStatus, CoreError> {
        let status = PullStatus::from(self.client.pull_status().await?);
        self.store.set_pull_status(status.clone());
        Ok(status)
    }

    /// Ask the server to abort the running pull. The next status poll
    /// reflects the outcome.
    pub async fn pull_stop(&self) -> Result<(), CoreError> {
        self.client.pull_stop().await?;
        Ok(())
    }

    // ── Export ───────────────────────────────────────────────────────

    pub async fn export_compose(&self) -> Result<String, CoreError> {
        Ok(self.client.export_compose().await?)
    }

    // ── Command routing ──────────────────────────────────────────────

    /// Route a [`Command`] to the matching operation.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        match cmd {
            Command::RefreshRoomsConfig => self.rooms_config().await.map(CommandResult::RoomsConfig),
            Command::ListRooms { labels } => self.list_rooms(&labels).await.map(CommandResult::Rooms),
            Command::CreateRoom(req) => {
                let CreateRoomRequest { settings, start } = *req;
                self.create(&settings, start).await.map(CommandResult::Room)
            }
            Command::GetRoom { id } => self.get_room(&id).await.map(CommandResult::Room),
            Command::GetRoomByName { name } => {
                self.get_room_by_name(&name).await.map(CommandResult::Room)
            }
            Command::RemoveRoom { id } => self.remove_room(&id).await.map(|()| CommandResult::Ok),
            Command::StartRoom { id } => self.start_room(&id).await.map(|()| CommandResult::Ok),
            Command::StopRoom { id } => self.stop_room(&id).await.map(|()| CommandResult::Ok),
            Command::PauseRoom { id } => self.pause_room(&id).await.map(|()| CommandResult::Ok),
            Command::RestartRoom { id } => {
                self.restart_room(&id).await.map(|()| CommandResult::Ok)
            }
            Command::RecreateRoom { id, request } => {
                let RecreateRoomRequest { settings, start } = *request;
                self.recreate_room(&id, settings.as_ref(), start)
                    .await
                    .map(CommandResult::Room)
            }
            Command::RoomSettings { id } => self
                .room_settings(&id)
                .await
                .map(|s| CommandResult::Settings(Box::new(s))),
            Command::RoomStats { id } => self.room_stats(&id).await.map(CommandResult::Stats),
            Command::PullStart(req) => self.pull_start(&req).await.map(CommandResult::Pull),
            Command::PullStatus => self.pull_status().await.map(CommandResult::Pull),
            Command::PullStop => self.pull_stop().await.map(|()| CommandResult::Ok),
            Command::ExportCompose => self.export_compose().await.map(CommandResult::Compose),
        }
    }
}
