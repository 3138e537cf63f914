//! Gemeinsame Identifikationstypen fuer Plauderei
//!
//! Alle IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! verschiedenen ID-Arten zur Compilezeit auszuschliessen.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use uuid::Uuid;

/// Eindeutige Benutzer-ID
///
/// Wird vom vorgelagerten Identity-Provider vergeben; der Relay-Server
/// uebernimmt sie unveraendert aus dem Identify-Event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Erstellt eine neue zufaellige UserId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }

    /// Prueft ob die ID die Nil-UUID ist (ungueltiger Platzhalter)
    pub fn ist_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "user:{}", self.0)
    }
}

/// Opaker Handle fuer eine einzelne Transport-Verbindung
///
/// Wird beim TCP-Accept vergeben und lebt bis zum Disconnect. Ein Benutzer
/// kann mehrere Verbindungen gleichzeitig halten (Multi-Device).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Erstellt einen neuen zufaelligen Verbindungs-Handle
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn:{}", self.0)
    }
}

/// Eindeutige Nachrichten-ID
///
/// Wird vom Store bei der Persistierung vergeben.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    /// Erstellt eine neue zufaellige MessageId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "msg:{}", self.0)
    }
}

/// Laufende Sequenznummer fuer CallIds innerhalb eines Prozesses
static CALL_SEQUENZ: AtomicU32 = AtomicU32::new(0);

/// Eindeutige Kennung eines Anrufversuchs
///
/// Aufgebaut aus Anrufer, Ziel und Erstellungszeitpunkt, damit parallele
/// und aufeinanderfolgende Versuche zwischen demselben Paar unterscheidbar
/// bleiben. Eine Sequenznummer schuetzt vor Kollisionen innerhalb derselben
/// Millisekunde.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(pub String);

impl CallId {
    /// Erstellt eine neue CallId fuer einen Anrufversuch
    pub fn neu(anrufer: &UserId, ziel: &UserId) -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        let sequenz = CALL_SEQUENZ.fetch_add(1, Ordering::Relaxed);
        Self(format!(
            "{}:{}:{}-{}",
            anrufer.inner(),
            ziel.inner(),
            millis,
            sequenz
        ))
    }

    /// Gibt die innere String-Repraesentation zurueck
    pub fn als_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "call:{}", self.0)
    }
}
