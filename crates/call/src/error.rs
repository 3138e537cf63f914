//! Fehlertypen der Anruf-Verwaltung

use plauderei_core::types::CallId;
use thiserror::Error;

/// Anruf-Fehlertypen
#[derive(Debug, Error)]
pub enum CallError {
    /// Anruf existiert nicht oder befindet sich nicht im erwarteten Zustand
    #[error("Ungueltiger Anruf-Zustand fuer {0}")]
    UngueltigerZustand(CallId),
}

pub type CallResult<T> = Result<T, CallError>;
