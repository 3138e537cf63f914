//! plauderei-signaling – TCP Control Layer
//!
//! Dieser Crate implementiert die Relay-Schicht von Plauderei. Er verwaltet
//! TCP-Verbindungen, die Verbindungs-Registry, Praesenz-Broadcasts,
//! Nachrichten-Weiterleitung und Anruf-Signalisierung.
//!
//! ## Architektur
//!
//! ```text
//! TCP Listener (SignalingServer)
//!     |
//!     v
//! ClientConnection (pro Verbindung ein Task)
//!     |
//!     v
//! MessageDispatcher
//!     |
//!     +-- PresenceHandler (Identify)
//!     +-- ChatHandler     (Send, Delivered, Read, History)
//!     +-- CallHandler     (Request, Accept, Reject, Cancel, End, Signal)
//!
//! ConnectionRegistry – Verbindungen, Benutzer-Index, Send-Queues
//! PresencePublisher  – Online/Offline-Flanken + Snapshots verteilen
//! ```

pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod presence;
pub mod registry;
pub mod server_state;
pub mod tcp;

#[cfg(test)]
mod tests;

// Bequeme Re-Exporte
pub use connection::ClientConnection;
pub use dispatcher::MessageDispatcher;
pub use error::{SignalingError, SignalingResult};
pub use presence::PresencePublisher;
pub use registry::{ConnectionRegistry, IdentifyErgebnis};
pub use server_state::{SignalingConfig, SignalingState};
pub use tcp::SignalingServer;
