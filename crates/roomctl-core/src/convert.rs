// ── API-to-domain type conversions ──
//
// Bridges raw `roomctl_api` wire types into `roomctl_core::model` types
// and back for request bodies.

use secrecy::ExposeSecret;

use roomctl_api::types::{
    PullLayer as WireLayer, PullStart, PullStatusResponse, RoomEntryResponse, RoomsConfigResponse,
};

use crate::command::PullRequest;
use crate::model::{LayerProgress, PullLayer, PullStatus, RoomEntry, RoomsConfig};

// ── Rooms ──────────────────────────────────────────────────────────

impl From<RoomEntryResponse> for RoomEntry {
    fn from(r: RoomEntryResponse) -> Self {
        Self {
            id: r.id,
            url: r.url,
            name: r.name,
            neko_image: r.neko_image,
            is_outdated: r.is_outdated,
            max_connections: r.max_connections,
            running: r.running,
            paused: r.paused,
            is_ready: r.is_ready,
            status: r.status,
            created: r.created,
            labels: r.labels.into_iter().collect(),
        }
    }
}

impl From<RoomsConfigResponse> for RoomsConfig {
    fn from(c: RoomsConfigResponse) -> Self {
        Self {
            connections: c.connections,
            neko_images: c.neko_images,
            storage_enabled: c.storage_enabled,
            uses_mux: c.uses_mux,
        }
    }
}

// ── Pull ───────────────────────────────────────────────────────────

impl From<WireLayer> for PullLayer {
    fn from(l: WireLayer) -> Self {
        Self {
            id: l.id,
            status: l.status,
            progress: l.progress,
            progress_detail: l.progress_detail.map(|d| LayerProgress {
                current: d.current,
                total: d.total,
            }),
        }
    }
}

impl From<PullStatusResponse> for PullStatus {
    fn from(p: PullStatusResponse) -> Self {
        Self {
            active: p.active,
            started: p.started,
            layers: p.layers.into_iter().map(PullLayer::from).collect(),
            status: p.status,
            finished: p.finished,
        }
    }
}

impl From<&PullRequest> for PullStart {
    fn from(req: &PullRequest) -> Self {
        let (registry_user, registry_pass) = req.registry.as_ref().map_or_else(
            || (String::new(), String::new()),
            |auth| {
                (
                    auth.username.clone(),
                    auth.password.expose_secret().to_owned(),
                )
            },
        );
        Self {
            neko_image: req.image.clone(),
            registry_user,
            registry_pass,
        }
    }
}
