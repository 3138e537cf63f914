//! Fehlertypen fuer das Chat-Crate

use thiserror::Error;

/// Chat-Fehlertypen
#[derive(Debug, Error)]
pub enum NachrichtenError {
    #[error("Nachricht nicht gefunden: {0}")]
    NichtGefunden(String),

    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),

    #[error("Speicher-Fehler: {0}")]
    Speicher(#[from] plauderei_store::StoreError),
}

pub type NachrichtenResult<T> = Result<T, NachrichtenError>;
