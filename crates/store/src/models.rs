//! Datensatz-Modelle der Nachrichten-Persistenz

use chrono::{DateTime, Utc};
use plauderei_core::types::{MessageId, UserId};

/// Zustellstatus einer Nachricht
///
/// Die Ordnung ist Teil des Vertrags: `Gesendet < Zugestellt < Gelesen`.
/// Status-Uebergaenge duerfen nur aufsteigend erfolgen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NachrichtStatus {
    /// Persistiert, Empfaenger noch nicht erreicht
    Gesendet,
    /// An mindestens ein Geraet des Empfaengers uebergeben
    Zugestellt,
    /// Vom Empfaenger zur Kenntnis genommen
    Gelesen,
}

impl NachrichtStatus {
    /// Draht-Repraesentation des Status
    pub fn als_str(&self) -> &'static str {
        match self {
            Self::Gesendet => "sent",
            Self::Zugestellt => "delivered",
            Self::Gelesen => "read",
        }
    }
}

impl std::fmt::Display for NachrichtStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.als_str())
    }
}

/// Eingabedaten fuer eine neue Nachricht (vor Persistierung)
#[derive(Debug, Clone)]
pub struct NeueNachricht {
    pub sender_id: UserId,
    pub empfaenger_id: UserId,
    pub content: String,
    /// Denormalisierter Anzeigename des Absenders
    pub sender_name: String,
    /// Konversations-Label
    pub raum: String,
    /// Client-seitige Korrelations-ID
    pub temp_id: Option<String>,
}

/// Persistierter Nachrichten-Datensatz
#[derive(Debug, Clone)]
pub struct NachrichtRecord {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_ordnung_aufsteigend() {
        assert!(NachrichtStatus::Gesendet < NachrichtStatus::Zugestellt);
        assert!(NachrichtStatus::Zugestellt < NachrichtStatus::Gelesen);
    }

    #[test]
    fn status_draht_namen() {
        assert_eq!(NachrichtStatus::Gesendet.als_str(), "sent");
        assert_eq!(NachrichtStatus::Zugestellt.als_str(), "delivered");
        assert_eq!(NachrichtStatus::Gelesen.als_str(), "read");
    }
}
