// roomctl-api: Async Rust client for the room management API (rooms, image pulls, events)

pub mod client;
pub mod error;
pub mod events;
pub mod transport;
pub mod types;

pub use client::RoomsClient;
pub use error::Error;
pub use events::{EventSubscription, ServerEvent, SseDecoder, SseFrame};
pub use transport::{BasicCredentials, TlsMode, TransportConfig};
