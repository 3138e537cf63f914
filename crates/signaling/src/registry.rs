//! Connection-Registry – Verbindungen, Benutzer-Index und Send-Queues
//!
//! Die Registry fuehrt jede Transport-Verbindung ab dem TCP-Accept, also
//! schon vor der Identifikation. Ein Benutzer kann mehrere Verbindungen
//! gleichzeitig halten (Multi-Device); der Benutzer-Index bildet
//! `UserId -> Vec<ConnectionId>` ab.
//!
//! ## Praesenz-Flanken
//! Online gilt ein Benutzer sobald mindestens eine identifizierte
//! Verbindung existiert. Die Flanken (erste Verbindung hinzu, letzte
//! Verbindung weg) werden unter dem per-Entry-Lock des Benutzer-Index
//! bestimmt, damit parallele Registrierung und Trennung nie zwei
//! Online-Events oder ein verlorenes Offline-Event erzeugen.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use plauderei_core::types::{ConnectionId, UserId};
use plauderei_protocol::control::ControlMessage;
use std::sync::Arc;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Groesse der Send-Queue pro Verbindung
const SEND_QUEUE_GROESSE: usize = 64;

// ---------------------------------------------------------------------------
// VerbindungsEintrag
// ---------------------------------------------------------------------------

/// Registry-Eintrag einer einzelnen Verbindung
#[derive(Clone, Debug)]
struct VerbindungsEintrag {
    /// Gebundener Benutzer (None bis zur Identifikation)
    user_id: Option<UserId>,
    /// Send-Queue der Verbindung
    tx: mpsc::Sender<ControlMessage>,
}

impl VerbindungsEintrag {
    /// Sendet eine Nachricht nicht-blockierend an die Verbindung
    ///
    /// Gibt `false` zurueck wenn die Queue voll oder geschlossen ist.
    fn senden(&self, verbindungs_id: &ConnectionId, nachricht: ControlMessage) -> bool {
        match self.tx.try_send(nachricht) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(
                    verbindung = %verbindungs_id,
                    "Send-Queue voll – Nachricht verworfen"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(
                    verbindung = %verbindungs_id,
                    "Send-Queue geschlossen (Verbindung getrennt)"
                );
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// IdentifyErgebnis
// ---------------------------------------------------------------------------

/// Ausgang einer Identifikation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifyErgebnis {
    /// Erste Verbindung dieses Benutzers – Online-Flanke
    ErsteVerbindung,
    /// Weitere Verbindung eines bereits erreichbaren Benutzers
    WeitereVerbindung,
    /// Verbindung war bereits auf denselben Benutzer identifiziert
    BereitsIdentifiziert,
    /// Verbindung ist bereits an einen anderen Benutzer gebunden
    Konflikt,
    /// Verbindung unbekannt (bereits getrennt)
    Unbekannt,
}

// ---------------------------------------------------------------------------
// ConnectionRegistry
// ---------------------------------------------------------------------------

/// Zentrale Registry aller Transport-Verbindungen
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct ConnectionRegistry {
    inner: Arc<ConnectionRegistryInner>,
}

struct ConnectionRegistryInner {
    /// Alle Verbindungen, indiziert nach ConnectionId
    verbindungen: DashMap<ConnectionId, VerbindungsEintrag>,
    /// Benutzer-Index: UserId -> identifizierte Verbindungen
    benutzer: DashMap<UserId, Vec<ConnectionId>>,
}

impl ConnectionRegistry {
    /// Erstellt eine leere Registry
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(ConnectionRegistryInner {
                verbindungen: DashMap::new(),
                benutzer: DashMap::new(),
            }),
        }
    }

    /// Nimmt eine neue Verbindung auf und gibt ihre Empfangs-Queue zurueck
    ///
    /// Die `ClientConnection` liest aus dieser Queue und sendet via TCP.
    pub fn verbindung_hinzufuegen(
        &self,
        verbindungs_id: ConnectionId,
    ) -> mpsc::Receiver<ControlMessage> {
        let (tx, rx) = mpsc::channel(SEND_QUEUE_GROESSE);
        self.inner.verbindungen.insert(
            verbindungs_id,
            VerbindungsEintrag { user_id: None, tx },
        );
        tracing::debug!(verbindung = %verbindungs_id, "Verbindung registriert");
        rx
    }

    /// Bindet eine Verbindung an einen Benutzer
    ///
    /// `ErsteVerbindung` zeigt die Online-Flanke an: der Benutzer war vorher
    /// ueber keine Verbindung erreichbar. Wiederholte Identifikation mit
    /// derselben UserId ist idempotent; eine andere UserId wird abgelehnt.
    pub fn identifizieren(
        &self,
        verbindungs_id: ConnectionId,
        user_id: UserId,
    ) -> IdentifyErgebnis {
        // Verbindungs-Lock wird vor dem Benutzer-Index wieder freigegeben
        {
            let mut eintrag = match self.inner.verbindungen.get_mut(&verbindungs_id) {
                Some(e) => e,
                None => return IdentifyErgebnis::Unbekannt,
            };
            match eintrag.user_id {
                Some(bestehend) if bestehend == user_id => {
                    return IdentifyErgebnis::BereitsIdentifiziert;
                }
                Some(bestehend) => {
                    tracing::warn!(
                        verbindung = %verbindungs_id,
                        bestehend = %bestehend,
                        angefragt = %user_id,
                        "Identifikation mit abweichender UserId abgelehnt"
                    );
                    return IdentifyErgebnis::Konflikt;
                }
                None => eintrag.user_id = Some(user_id),
            }
        }

        // Flanke unter dem Entry-Lock des Benutzer-Index bestimmen
        let mut liste = self.inner.benutzer.entry(user_id).or_default();
        let erste = liste.is_empty();
        liste.push(verbindungs_id);
        drop(liste);

        tracing::debug!(
            verbindung = %verbindungs_id,
            user_id = %user_id,
            erste_verbindung = erste,
            "Verbindung identifiziert"
        );

        if erste {
            IdentifyErgebnis::ErsteVerbindung
        } else {
            IdentifyErgebnis::WeitereVerbindung
        }
    }

    /// Entfernt eine Verbindung aus der Registry
    ///
    /// Gibt bei identifizierten Verbindungen `(UserId, offline)` zurueck;
    /// `offline` ist die Offline-Flanke (letzte Verbindung des Benutzers).
    pub fn verbindung_entfernen(
        &self,
        verbindungs_id: &ConnectionId,
    ) -> Option<(UserId, bool)> {
        let (_, eintrag) = self.inner.verbindungen.remove(verbindungs_id)?;
        let user_id = eintrag.user_id?;

        let mut offline = false;
        if let Entry::Occupied(mut belegt) = self.inner.benutzer.entry(user_id) {
            belegt.get_mut().retain(|c| c != verbindungs_id);
            if belegt.get().is_empty() {
                belegt.remove();
                offline = true;
            }
        }

        tracing::debug!(
            verbindung = %verbindungs_id,
            user_id = %user_id,
            offline = offline,
            "Verbindung entfernt"
        );
        Some((user_id, offline))
    }

    /// Gibt alle Verbindungen eines Benutzers zurueck (Snapshot)
    pub fn verbindungen_von(&self, user_id: &UserId) -> Vec<ConnectionId> {
        self.inner
            .benutzer
            .get(user_id)
            .map(|liste| liste.clone())
            .unwrap_or_default()
    }

    /// Prueft ob ein Benutzer ueber mindestens eine Verbindung erreichbar ist
    pub fn ist_online(&self, user_id: &UserId) -> bool {
        self.inner.benutzer.contains_key(user_id)
    }

    /// Gibt alle erreichbaren Benutzer zurueck (sortiert, deterministisch)
    pub fn online_benutzer(&self) -> Vec<UserId> {
        let mut benutzer: Vec<UserId> =
            self.inner.benutzer.iter().map(|e| *e.key()).collect();
        benutzer.sort();
        benutzer
    }

    /// Sendet eine Nachricht an eine einzelne Verbindung
    pub fn an_verbindung_senden(
        &self,
        verbindungs_id: &ConnectionId,
        nachricht: ControlMessage,
    ) -> bool {
        match self.inner.verbindungen.get(verbindungs_id) {
            Some(eintrag) => eintrag.senden(verbindungs_id, nachricht),
            None => {
                tracing::debug!(verbindung = %verbindungs_id, "Senden an unbekannte Verbindung");
                false
            }
        }
    }

    /// Sendet eine Nachricht an alle Verbindungen eines Benutzers
    ///
    /// Gibt die Anzahl der erfolgreichen Sendungen zurueck.
    pub fn an_benutzer_senden(&self, user_id: &UserId, nachricht: ControlMessage) -> usize {
        let verbindungen = self.verbindungen_von(user_id);
        let mut gesendet = 0;
        for verbindungs_id in &verbindungen {
            if self.an_verbindung_senden(verbindungs_id, nachricht.clone()) {
                gesendet += 1;
            }
        }
        gesendet
    }

    /// Sendet eine Nachricht an alle Verbindungen
    pub fn an_alle_senden(&self, nachricht: ControlMessage) -> usize {
        let mut gesendet = 0;
        self.inner.verbindungen.iter().for_each(|eintrag| {
            if eintrag.value().senden(eintrag.key(), nachricht.clone()) {
                gesendet += 1;
            }
        });
        gesendet
    }

    /// Sendet eine Nachricht an alle Verbindungen ausser einer
    ///
    /// Nuetzlich um Flanken-Events zu verteilen ohne den Ausloeser zu
    /// informieren.
    pub fn an_alle_ausser_senden(
        &self,
        ausgeschlossen: &ConnectionId,
        nachricht: ControlMessage,
    ) -> usize {
        let mut gesendet = 0;
        self.inner.verbindungen.iter().for_each(|eintrag| {
            if eintrag.key() == ausgeschlossen {
                return;
            }
            if eintrag.value().senden(eintrag.key(), nachricht.clone()) {
                gesendet += 1;
            }
        });
        gesendet
    }

    /// Gibt die Anzahl aller Verbindungen zurueck (auch unidentifizierte)
    pub fn verbindungs_anzahl(&self) -> usize {
        self.inner.verbindungen.len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
