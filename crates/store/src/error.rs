//! Fehlertypen der Persistenz-Schicht

use plauderei_core::types::MessageId;
use thiserror::Error;

/// Fehler der Persistenz-Schicht
#[derive(Debug, Error)]
pub enum StoreError {
    /// Nachricht existiert nicht
    #[error("Nachricht nicht gefunden: {0}")]
    NichtGefunden(MessageId),

    /// Interner Fehler der Engine (z.B. Verbindung verloren)
    #[error("Interner Store-Fehler: {0}")]
    Intern(String),
}

/// Ergebnis-Alias fuer Store-Operationen
pub type Result<T> = std::result::Result<T, StoreError>;
