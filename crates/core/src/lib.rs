//! plauderei-core – Gemeinsame Typen und IDs
//!
//! Dieses Crate stellt die fundamentalen Identifikationstypen bereit,
//! die von allen anderen Plauderei-Crates gemeinsam genutzt werden.

pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use types::{CallId, ConnectionId, MessageId, UserId};
