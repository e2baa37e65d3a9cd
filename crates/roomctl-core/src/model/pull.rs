// ── Image pull domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Byte counters for a single layer download.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerProgress {
    pub current: u64,
    pub total: u64,
}

/// Progress of one image layer as reported by the docker daemon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullLayer {
    pub id: String,
    pub status: String,
    pub progress: String,
    pub progress_detail: Option<LayerProgress>,
}

/// Global image-pull status. There is exactly one per server and every
/// update replaces it wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullStatus {
    pub active: bool,
    pub started: Option<DateTime<Utc>>,
    pub layers: Vec<PullLayer>,
    /// Free-form status lines (`Digest: ...`, `Status: ...`).
    pub status: Vec<String>,
    pub finished: Option<DateTime<Utc>>,
}

impl PullStatus {
    /// A pull ran and has completed (successfully or not).
    pub fn is_finished(&self) -> bool {
        !self.active && self.finished.is_some()
    }

    /// Summed layer counters, skipping layers without details.
    pub fn totals(&self) -> LayerProgress {
        self.layers
            .iter()
            .filter_map(|l| l.progress_detail)
            .fold(LayerProgress::default(), |acc, p| LayerProgress {
                current: acc.current.saturating_add(p.current),
                total: acc.total.saturating_add(p.total),
            })
    }
}
