//! plauderei-chat – Nachrichten-Pipeline
//!
//! Dieses Crate implementiert die Server-Seite der Nachrichtenzustellung:
//! - Eingabe-Validierung vor jeder Persistierung
//! - genau ein Store-Schreibvorgang pro Sendevorgang
//! - monotone Status-Uebergaenge (sent -> delivered -> read)
//! - Konversationsverlauf
//!
//! Die Weiterleitung an verbundene Geraete uebernimmt das Signaling-Crate;
//! hier endet die Verantwortung am Repository.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

// Bequeme Re-Exporte
pub use error::{NachrichtenError, NachrichtenResult};
pub use service::NachrichtenService;
pub use types::{raum_label, Nachricht};
