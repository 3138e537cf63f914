//! CallRegister – In-Memory Tabelle aller laufenden Anrufversuche
//!
//! Thread-safe durch DashMap. Zustandsuebergaenge laufen unter dem
//! per-Entry-Lock (Annehmen) bzw. via `remove_if` (terminale Uebergaenge),
//! damit von zwei gleichzeitigen Beenden-Anfragen genau eine gewinnt und
//! die andere den Anruf schlicht nicht mehr vorfindet.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use plauderei_core::types::{CallId, UserId};
use plauderei_protocol::control::CallType;

use crate::error::{CallError, CallResult};

// ---------------------------------------------------------------------------
// Call
// ---------------------------------------------------------------------------

/// Lebenszyklus-Zustand eines Anrufversuchs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    /// Einladung zugestellt, Antwort steht aus
    Klingelt,
    /// Angenommen, Session-Aushandlung laeuft bzw. ist abgeschlossen
    Aktiv,
    /// Von einer Partei beendet (terminal)
    Beendet,
    /// Vom Ziel abgelehnt (terminal)
    Abgelehnt,
    /// Vom Anrufer vor Annahme zurueckgezogen (terminal)
    Abgebrochen,
}

impl CallStatus {
    /// Terminale Zustaende verlassen die Tabelle
    pub fn ist_terminal(&self) -> bool {
        matches!(self, Self::Beendet | Self::Abgelehnt | Self::Abgebrochen)
    }
}

/// Zustand eines einzelnen Anrufversuchs
#[derive(Debug, Clone)]
pub struct Call {
    pub id: CallId,
    /// Initiator des Anrufs
    pub anrufer: UserId,
    /// Angerufener Benutzer
    pub ziel: UserId,
    pub typ: CallType,
    pub status: CallStatus,
    /// Zeitpunkt der Erstellung (fuer Dauer-Protokollierung)
    pub begonnen: Instant,
    /// Benutzer der angenommen hat (None solange es klingelt)
    pub angenommen_von: Option<UserId>,
}

impl Call {
    /// Gibt die jeweils andere Partei zurueck, sofern `user` beteiligt ist
    pub fn gegenpartei(&self, user: &UserId) -> Option<UserId> {
        if *user == self.anrufer {
            Some(self.ziel)
        } else if *user == self.ziel {
            Some(self.anrufer)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// CallRegister
// ---------------------------------------------------------------------------

/// Zentrale Tabelle aller nicht-terminalen Anrufversuche
///
/// Kein Exklusivitaets-Zwang: ein Benutzer kann in mehreren Anrufen
/// gleichzeitig stehen; gleichzeitiges Klingeln ist Sache des Clients.
#[derive(Clone)]
pub struct CallRegister {
    inner: Arc<DashMap<CallId, Call>>,
}

impl CallRegister {
    /// Erstellt ein leeres Register
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
        }
    }

    /// Legt einen neuen klingelnden Anruf an und vergibt die CallId
    pub fn erstellen(&self, anrufer: UserId, ziel: UserId, typ: CallType) -> Call {
        let call = Call {
            id: CallId::neu(&anrufer, &ziel),
            anrufer,
            ziel,
            typ,
            status: CallStatus::Klingelt,
            begonnen: Instant::now(),
            angenommen_von: None,
        };
        self.inner.insert(call.id.clone(), call.clone());
        tracing::debug!(call_id = %call.id, anrufer = %anrufer, ziel = %ziel, "Anruf angelegt");
        call
    }

    /// Laedt einen Anruf
    pub fn laden(&self, id: &CallId) -> Option<Call> {
        self.inner.get(id).map(|c| c.clone())
    }

    /// Nimmt einen klingelnden Anruf an (Klingelt -> Aktiv)
    ///
    /// Der Uebergang laeuft unter dem Entry-Lock; ein zweites Annehmen
    /// oder Annehmen nach Abbruch schlaegt fehl.
    pub fn annehmen(&self, id: &CallId, annehmer: UserId) -> CallResult<Call> {
        let mut eintrag = self
            .inner
            .get_mut(id)
            .ok_or_else(|| CallError::UngueltigerZustand(id.clone()))?;
        if eintrag.status != CallStatus::Klingelt {
            return Err(CallError::UngueltigerZustand(id.clone()));
        }
        eintrag.status = CallStatus::Aktiv;
        eintrag.angenommen_von = Some(annehmer);
        Ok(eintrag.clone())
    }

    /// Lehnt einen klingelnden Anruf ab (Klingelt -> Abgelehnt, terminal)
    pub fn ablehnen(&self, id: &CallId) -> CallResult<Call> {
        self.terminal_entfernen(id, CallStatus::Abgelehnt, |c| {
            c.status == CallStatus::Klingelt
        })
    }

    /// Zieht einen klingelnden Anruf zurueck (Klingelt -> Abgebrochen, terminal)
    pub fn abbrechen(&self, id: &CallId) -> CallResult<Call> {
        self.terminal_entfernen(id, CallStatus::Abgebrochen, |c| {
            c.status == CallStatus::Klingelt
        })
    }

    /// Beendet einen Anruf (Klingelt oder Aktiv -> Beendet, terminal)
    ///
    /// Liefert zusaetzlich die Dauer seit Erstellung fuer das Log.
    pub fn beenden(&self, id: &CallId) -> CallResult<(Call, Duration)> {
        let call = self.terminal_entfernen(id, CallStatus::Beendet, |c| {
            matches!(c.status, CallStatus::Klingelt | CallStatus::Aktiv)
        })?;
        let dauer = call.begonnen.elapsed();
        Ok((call, dauer))
    }

    /// Anzahl der nicht-terminalen Anrufe
    pub fn anzahl(&self) -> usize {
        self.inner.len()
    }

    /// Gemeinsamer Pfad fuer terminale Uebergaenge
    ///
    /// `remove_if` entfernt den Eintrag nur wenn `erlaubt` zutrifft; bei
    /// zwei gleichzeitigen Aufrufen sieht der Verlierer eine unbekannte
    /// CallId.
    fn terminal_entfernen(
        &self,
        id: &CallId,
        ziel_status: CallStatus,
        erlaubt: impl Fn(&Call) -> bool,
    ) -> CallResult<Call> {
        match self.inner.remove_if(id, |_, c| erlaubt(c)) {
            Some((_, mut call)) => {
                call.status = ziel_status;
                Ok(call)
            }
            None => Err(CallError::UngueltigerZustand(id.clone())),
        }
    }
}

impl Default for CallRegister {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
