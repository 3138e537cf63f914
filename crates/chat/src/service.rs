//! NachrichtenService – Validierung, Persistierung, Status-Uebergaenge

use std::sync::Arc;

use tracing::debug;

use plauderei_core::types::{MessageId, UserId};
use plauderei_store::{MessageRepository, NachrichtStatus, NeueNachricht};

use crate::{
    error::{NachrichtenError, NachrichtenResult},
    types::Nachricht,
};

/// Maximale Nachrichtenlaenge in Bytes
const MAX_NACHRICHTEN_LAENGE: usize = 4096;

/// NachrichtenService verwaltet den persistenten Teil der Zustell-Pipeline
pub struct NachrichtenService<R: MessageRepository> {
    repo: Arc<R>,
}

impl<R: MessageRepository> NachrichtenService<R> {
    /// Erstellt einen neuen NachrichtenService
    pub fn neu(repo: Arc<R>) -> Arc<Self> {
        Arc::new(Self { repo })
    }

    /// Nachricht validieren und persistieren
    ///
    /// Genau ein Store-Schreibvorgang pro Aufruf; eine mitgelieferte
    /// temp_id wird unveraendert durchgereicht und loest keine
    /// Deduplizierung aus.
    pub async fn senden(
        &self,
        sender_id: UserId,
        empfaenger_id: UserId,
        content: &str,
        sender_name: &str,
        raum: &str,
        temp_id: Option<String>,
    ) -> NachrichtenResult<Nachricht> {
        if sender_id.ist_nil() || empfaenger_id.ist_nil() {
            return Err(NachrichtenError::UngueltigeEingabe(
                "Sender und Empfaenger muessen gesetzt sein".into(),
            ));
        }

        if content.trim().is_empty() {
            return Err(NachrichtenError::UngueltigeEingabe(
                "Nachrichteninhalt darf nicht leer sein".into(),
            ));
        }

        if content.len() > MAX_NACHRICHTEN_LAENGE {
            return Err(NachrichtenError::UngueltigeEingabe(format!(
                "Nachricht zu lang: {} Bytes (Maximum: {})",
                content.len(),
                MAX_NACHRICHTEN_LAENGE
            )));
        }

        if raum.trim().is_empty() {
            return Err(NachrichtenError::UngueltigeEingabe(
                "Raum-Label darf nicht leer sein".into(),
            ));
        }

        let record = self
            .repo
            .speichern(NeueNachricht {
                sender_id,
                empfaenger_id,
                content: content.to_string(),
                sender_name: sender_name.to_string(),
                raum: raum.to_string(),
                temp_id,
            })
            .await?;

        debug!(message_id = %record.id, sender = %sender_id, "Nachricht persistiert");
        Ok(record.into())
    }

    /// Nachricht als zugestellt markieren
    ///
    /// Der Uebergang ist monoton: liegt der Status bereits auf `Gelesen`,
    /// bleibt er dort und der kanonische Datensatz wird zurueckgegeben.
    pub async fn als_zugestellt(&self, id: MessageId) -> NachrichtenResult<Nachricht> {
        let record = self
            .repo
            .status_aktualisieren(id, NachrichtStatus::Zugestellt)
            .await
            .map_err(nicht_gefunden_oder_speicher)?;
        Ok(record.into())
    }

    /// Nachricht als gelesen markieren
    ///
    /// Nur der Empfaenger darf eine Nachricht als gelesen melden.
    pub async fn als_gelesen(&self, id: MessageId, leser: UserId) -> NachrichtenResult<Nachricht> {
        let existing = self
            .repo
            .laden(id)
            .await?
            .ok_or_else(|| NachrichtenError::NichtGefunden(id.to_string()))?;

        if existing.empfaenger_id != leser {
            return Err(NachrichtenError::UngueltigeEingabe(
                "Nur der Empfaenger kann eine Nachricht als gelesen markieren".into(),
            ));
        }

        let record = self
            .repo
            .status_aktualisieren(id, NachrichtStatus::Gelesen)
            .await
            .map_err(nicht_gefunden_oder_speicher)?;
        Ok(record.into())
    }

    /// Konversationsverlauf zwischen zwei Benutzern laden
    /// (chronologisch aufsteigend)
    pub async fn verlauf(&self, a: UserId, b: UserId) -> NachrichtenResult<Vec<Nachricht>> {
        let records = self.repo.verlauf(a, b).await?;
        Ok(records.into_iter().map(Into::into).collect())
    }
}

/// Mappt eine unbekannte MessageId auf NichtGefunden statt Speicher-Fehler
fn nicht_gefunden_oder_speicher(err: plauderei_store::StoreError) -> NachrichtenError {
    match err {
        plauderei_store::StoreError::NichtGefunden(id) => {
            NachrichtenError::NichtGefunden(id.to_string())
        }
        andere => NachrichtenError::Speicher(andere),
    }
}
