//! Presence-Handler – Identify und Snapshot-Auslieferung
//!
//! Identify bindet die Verbindung an einen Benutzer und liefert als direkte
//! Antwort den vollstaendigen Praesenz-Snapshot. Nur die erste Verbindung
//! eines Benutzers loest die Online-Flanke aus.

use plauderei_protocol::control::{
    ControlMessage, ControlPayload, ErrorCode, IdentifyRequest,
};
use plauderei_store::MessageRepository;
use std::sync::Arc;

use crate::dispatcher::DispatcherContext;
use crate::registry::IdentifyErgebnis;
use crate::server_state::SignalingState;

/// Verarbeitet ein Identify
pub async fn handle_identify<R: MessageRepository + 'static>(
    request: IdentifyRequest,
    request_id: u32,
    ctx: &mut DispatcherContext,
    state: &Arc<SignalingState<R>>,
) -> ControlMessage {
    if request.user_id.ist_nil() {
        return ControlMessage::error(
            request_id,
            ErrorCode::InvalidRequest,
            "Ungueltige Benutzer-ID",
        );
    }

    let ergebnis = state
        .registry
        .identifizieren(ctx.verbindungs_id, request.user_id);

    match ergebnis {
        IdentifyErgebnis::ErsteVerbindung => {
            ctx.user_id = Some(request.user_id);
            tracing::info!(
                user_id = %request.user_id,
                display_name = %request.display_name,
                verbindung = %ctx.verbindungs_id,
                "Benutzer identifiziert"
            );
            // Flanke an alle anderen; der Ausloeser bekommt den Snapshot
            // als direkte Antwort
            state
                .presence
                .online_melden(request.user_id, &ctx.verbindungs_id);
            snapshot_antwort(request_id, state)
        }
        IdentifyErgebnis::WeitereVerbindung | IdentifyErgebnis::BereitsIdentifiziert => {
            ctx.user_id = Some(request.user_id);
            tracing::debug!(
                user_id = %request.user_id,
                verbindung = %ctx.verbindungs_id,
                "Weitere Verbindung identifiziert"
            );
            snapshot_antwort(request_id, state)
        }
        IdentifyErgebnis::Konflikt => ControlMessage::error(
            request_id,
            ErrorCode::InvalidRequest,
            "Verbindung ist bereits an einen anderen Benutzer gebunden",
        ),
        IdentifyErgebnis::Unbekannt => ControlMessage::error(
            request_id,
            ErrorCode::InternalError,
            "Verbindung nicht registriert",
        ),
    }
}

fn snapshot_antwort<R: MessageRepository + 'static>(
    request_id: u32,
    state: &Arc<SignalingState<R>>,
) -> ControlMessage {
    ControlMessage::new(
        request_id,
        ControlPayload::PresenceSnapshot(state.presence.schnappschuss()),
    )
}
