//! Domain-Typen des Chat-Crates

use chrono::{DateTime, Utc};
use plauderei_core::types::{MessageId, UserId};
use plauderei_store::{NachrichtRecord, NachrichtStatus};

/// Nachricht in der Domain-Sicht des Servers
#[derive(Debug, Clone)]
pub struct Nachricht {
    pub id: MessageId,
    pub sender_id: UserId,
    pub empfaenger_id: UserId,
    pub content: String,
    pub sender_name: String,
    pub raum: String,
    pub temp_id: Option<String>,
    pub status: NachrichtStatus,
    pub erstellt_am: DateTime<Utc>,
}

impl From<NachrichtRecord> for Nachricht {
    fn from(record: NachrichtRecord) -> Self {
        Self {
            id: record.id,
            sender_id: record.sender_id,
            empfaenger_id: record.empfaenger_id,
            content: record.content,
            sender_name: record.sender_name,
            raum: record.raum,
            temp_id: record.temp_id,
            status: record.status,
            erstellt_am: record.erstellt_am,
        }
    }
}

/// Kanonisches Konversations-Label fuer ein Benutzerpaar
///
/// Unabhaengig von der Richtung: beide Teilnehmer landen im selben Raum.
pub fn raum_label(a: &UserId, b: &UserId) -> String {
    let (klein, gross) = if a <= b { (a, b) } else { (b, a) };
    format!("{}:{}", klein.inner(), gross.inner())
}
