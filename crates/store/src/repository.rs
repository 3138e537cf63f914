//! Repository-Trait der Nachrichten-Persistenz
//!
//! Das Repository-Pattern entkoppelt die Zustell-Logik von der konkreten
//! Engine. Der Kern kennt nur diese Schnittstelle; `MemoryStore` ist die
//! mitgelieferte Implementierung.

use plauderei_core::types::{MessageId, UserId};

use crate::error::Result;
use crate::models::{NachrichtRecord, NachrichtStatus, NeueNachricht};

/// Repository fuer Nachrichten-Datenzugriffe
#[allow(async_fn_in_trait)]
pub trait MessageRepository {
    /// Persistiert eine neue Nachricht mit Status `Gesendet` und vergibt
    /// die MessageId. Genau ein Aufruf pro Sendevorgang.
    async fn speichern(&self, nachricht: NeueNachricht) -> Result<NachrichtRecord>;

    /// Hebt den Status einer Nachricht an.
    ///
    /// Vertrag: nur aufsteigende Uebergaenge werden geschrieben. Liegt der
    /// gespeicherte Status bereits auf oder ueber `neuer_status`, bleibt
    /// der Datensatz unveraendert. Gibt in beiden Faellen den kanonischen
    /// Datensatz zurueck, damit ein verspaetetes `Zugestellt` nach
    /// `Gelesen` ein beobachtbares No-Op ist.
    async fn status_aktualisieren(
        &self,
        id: MessageId,
        neuer_status: NachrichtStatus,
    ) -> Result<NachrichtRecord>;

    /// Laedt eine einzelne Nachricht
    async fn laden(&self, id: MessageId) -> Result<Option<NachrichtRecord>>;

    /// Laedt den Verlauf einer Konversation zwischen zwei Benutzern,
    /// chronologisch aufsteigend
    async fn verlauf(&self, a: UserId, b: UserId) -> Result<Vec<NachrichtRecord>>;
}
