//! plauderei-call – Anruf-Zustandsverwaltung
//!
//! Verwaltet die Tabelle der laufenden Anrufversuche und erzwingt die
//! Zustandsmaschine:
//!
//! ```text
//! Klingelt --> Aktiv --> Beendet
//!     |\-> Abgelehnt
//!      \-> Abgebrochen
//! ```
//!
//! Terminale Zustaende werden nicht gespeichert: der Eintrag verschwindet
//! mit dem Uebergang aus der Tabelle. Medien und Session-Aushandlung
//! laufen ausserhalb; hier lebt nur die Signalisierungs-Sicht.

pub mod error;
pub mod state;

pub use error::{CallError, CallResult};
pub use state::{Call, CallRegister, CallStatus};
