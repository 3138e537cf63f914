//! Presence-Publisher – Verteilt Online/Offline-Flanken und Snapshots
//!
//! Nach jeder Flanke geht zusaetzlich zum Delta-Event ein vollstaendiger
//! Snapshot an die Clients. Das kostet Bandbreite, haelt aber jeden Client
//! auch nach verpassten Deltas konsistent; Clients duerfen den Snapshot
//! als alleinige Wahrheit uebernehmen.

use plauderei_core::types::{ConnectionId, UserId};
use plauderei_protocol::control::{
    ControlMessage, ControlPayload, PresenceChanged, PresenceSnapshot,
};

use crate::registry::ConnectionRegistry;

/// Verteilt Praesenz-Ereignisse ueber die Registry
#[derive(Clone)]
pub struct PresencePublisher {
    registry: ConnectionRegistry,
}

impl PresencePublisher {
    /// Erstellt einen neuen Publisher
    pub fn neu(registry: ConnectionRegistry) -> Self {
        Self { registry }
    }

    /// Baut den aktuellen Praesenz-Snapshot
    pub fn schnappschuss(&self) -> PresenceSnapshot {
        PresenceSnapshot {
            online: self.registry.online_benutzer(),
        }
    }

    /// Meldet die Online-Flanke eines Benutzers
    ///
    /// Die ausloesende Verbindung wird uebersprungen: sie erhaelt den
    /// Snapshot als direkte Antwort auf ihr Identify.
    pub fn online_melden(&self, user_id: UserId, ausloeser: &ConnectionId) {
        let flanke = ControlMessage::event(ControlPayload::PresenceChanged(PresenceChanged {
            user_id,
            online: true,
        }));
        self.registry.an_alle_ausser_senden(ausloeser, flanke);

        let snapshot =
            ControlMessage::event(ControlPayload::PresenceSnapshot(self.schnappschuss()));
        self.registry.an_alle_ausser_senden(ausloeser, snapshot);

        tracing::info!(user_id = %user_id, "Benutzer online");
    }

    /// Meldet die Offline-Flanke eines Benutzers
    pub fn offline_melden(&self, user_id: UserId) {
        let flanke = ControlMessage::event(ControlPayload::PresenceChanged(PresenceChanged {
            user_id,
            online: false,
        }));
        self.registry.an_alle_senden(flanke);

        let snapshot =
            ControlMessage::event(ControlPayload::PresenceSnapshot(self.schnappschuss()));
        self.registry.an_alle_senden(snapshot);

        tracing::info!(user_id = %user_id, "Benutzer offline");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
