//! In-Memory-Implementierung des `MessageRepository`
//!
//! Haelt alle Nachrichten in einer DashMap. Eine prozessweite Sequenznummer
//! pro Datensatz stellt stabile chronologische Ordnung im Verlauf sicher,
//! auch wenn zwei Nachrichten im selben Zeitstempel-Tick landen.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use plauderei_core::types::{MessageId, UserId};

use crate::error::{Result, StoreError};
use crate::models::{NachrichtRecord, NachrichtStatus, NeueNachricht};
use crate::repository::MessageRepository;

/// In-Memory-Nachrichtenspeicher
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
}

struct MemoryStoreInner {
    /// MessageId -> (Einfuege-Sequenz, Datensatz)
    nachrichten: DashMap<MessageId, (u64, NachrichtRecord)>,
    /// Monoton steigende Einfuege-Sequenz
    sequenz: AtomicU64,
}

impl MemoryStore {
    /// Erstellt einen leeren Store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryStoreInner {
                nachrichten: DashMap::new(),
                sequenz: AtomicU64::new(0),
            }),
        }
    }

    /// Anzahl der gespeicherten Nachrichten
    pub fn anzahl(&self) -> usize {
        self.inner.nachrichten.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageRepository for MemoryStore {
    async fn speichern(&self, nachricht: NeueNachricht) -> Result<NachrichtRecord> {
        let record = NachrichtRecord {
            id: MessageId::new(),
            sender_id: nachricht.sender_id,
            empfaenger_id: nachricht.empfaenger_id,
            content: nachricht.content,
            sender_name: nachricht.sender_name,
            raum: nachricht.raum,
            temp_id: nachricht.temp_id,
            status: NachrichtStatus::Gesendet,
            erstellt_am: Utc::now(),
        };
        let seq = self.inner.sequenz.fetch_add(1, Ordering::Relaxed);
        self.inner
            .nachrichten
            .insert(record.id, (seq, record.clone()));
        Ok(record)
    }

    async fn status_aktualisieren(
        &self,
        id: MessageId,
        neuer_status: NachrichtStatus,
    ) -> Result<NachrichtRecord> {
        // Entry-Lock der DashMap: Lesen und Schreiben des Status sind eine
        // unteilbare Operation, damit parallele Uebergaenge nie abwaerts
        // ueberschreiben.
        let mut eintrag = self
            .inner
            .nachrichten
            .get_mut(&id)
            .ok_or(StoreError::NichtGefunden(id))?;
        if neuer_status > eintrag.1.status {
            eintrag.1.status = neuer_status;
        }
        Ok(eintrag.1.clone())
    }

    async fn laden(&self, id: MessageId) -> Result<Option<NachrichtRecord>> {
        Ok(self.inner.nachrichten.get(&id).map(|e| e.1.clone()))
    }

    async fn verlauf(&self, a: UserId, b: UserId) -> Result<Vec<NachrichtRecord>> {
        let mut eintraege: Vec<(u64, NachrichtRecord)> = self
            .inner
            .nachrichten
            .iter()
            .filter(|e| {
                let r = &e.1;
                (r.sender_id == a && r.empfaenger_id == b)
                    || (r.sender_id == b && r.empfaenger_id == a)
            })
            .map(|e| (e.0, e.1.clone()))
            .collect();
        eintraege.sort_by_key(|(seq, _)| *seq);
        Ok(eintraege.into_iter().map(|(_, r)| r).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_nachricht(sender: UserId, empfaenger: UserId, text: &str) -> NeueNachricht {
        NeueNachricht {
            sender_id: sender,
            empfaenger_id: empfaenger,
            content: text.to_string(),
            sender_name: "Anna".to_string(),
            raum: "a:b".to_string(),
            temp_id: None,
        }
    }

    #[tokio::test]
    async fn speichern_vergibt_id_und_status_gesendet() {
        let store = MemoryStore::new();
        let record = store
            .speichern(test_nachricht(UserId::new(), UserId::new(), "Hallo"))
            .await
            .unwrap();
        assert_eq!(record.status, NachrichtStatus::Gesendet);
        assert_eq!(store.anzahl(), 1);

        let geladen = store.laden(record.id).await.unwrap().unwrap();
        assert_eq!(geladen.content, "Hallo");
    }

    #[tokio::test]
    async fn status_aktualisieren_nur_aufwaerts() {
        let store = MemoryStore::new();
        let record = store
            .speichern(test_nachricht(UserId::new(), UserId::new(), "Hi"))
            .await
            .unwrap();

        let r = store
            .status_aktualisieren(record.id, NachrichtStatus::Gelesen)
            .await
            .unwrap();
        assert_eq!(r.status, NachrichtStatus::Gelesen);

        // Verspaetetes Zugestellt nach Gelesen bleibt wirkungslos
        let r = store
            .status_aktualisieren(record.id, NachrichtStatus::Zugestellt)
            .await
            .unwrap();
        assert_eq!(r.status, NachrichtStatus::Gelesen);
    }

    #[tokio::test]
    async fn status_aktualisieren_unbekannte_id() {
        let store = MemoryStore::new();
        let result = store
            .status_aktualisieren(MessageId::new(), NachrichtStatus::Zugestellt)
            .await;
        assert!(matches!(result, Err(StoreError::NichtGefunden(_))));
    }

    #[tokio::test]
    async fn verlauf_beide_richtungen_chronologisch() {
        let store = MemoryStore::new();
        let anna = UserId::new();
        let ben = UserId::new();
        let carla = UserId::new();

        store
            .speichern(test_nachricht(anna, ben, "erste"))
            .await
            .unwrap();
        store
            .speichern(test_nachricht(ben, anna, "zweite"))
            .await
            .unwrap();
        // Fremde Konversation darf nicht auftauchen
        store
            .speichern(test_nachricht(anna, carla, "fremd"))
            .await
            .unwrap();
        store
            .speichern(test_nachricht(anna, ben, "dritte"))
            .await
            .unwrap();

        let verlauf = store.verlauf(anna, ben).await.unwrap();
        let texte: Vec<&str> = verlauf.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(texte, vec!["erste", "zweite", "dritte"]);
    }

    #[tokio::test]
    async fn verlauf_leerer_store() {
        let store = MemoryStore::new();
        let verlauf = store.verlauf(UserId::new(), UserId::new()).await.unwrap();
        assert!(verlauf.is_empty());
    }
}
