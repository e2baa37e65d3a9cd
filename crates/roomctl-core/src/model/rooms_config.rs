use serde::{Deserialize, Serialize};

/// Server capability descriptor. Fetched once per connection and cached
/// until explicitly re-fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomsConfig {
    /// Total WebRTC connections the server can hand out.
    pub connections: u16,
    /// Images a room may be created from.
    pub neko_images: Vec<String>,
    pub storage_enabled: bool,
    /// All rooms share one UDP/TCP port pair.
    pub uses_mux: bool,
}

impl RoomsConfig {
    pub fn allows_image(&self, image: &str) -> bool {
        self.neko_images.iter().any(|i| i == image)
    }
}
