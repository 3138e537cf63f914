//! Call-Handler – Anruf-Lebenszyklus und Session-Signal-Relay
//!
//! Der Server fuehrt nur die Signalisierungs-Sicht: klingelnde und aktive
//! Anrufe stehen im CallRegister, Session-Signale (Offer/Answer/Kandidaten)
//! werden zustandslos und best-effort durchgereicht. Medien laufen nie
//! ueber den Server.

use plauderei_call::CallStatus;
use plauderei_core::types::UserId;
use plauderei_protocol::control::{
    CallAcceptedEvent, CallIdPayload, CallInitiatedResponse, CallRejectedEvent,
    CallRequestPayload, ControlMessage, ControlPayload, ErrorCode, IncomingCallEvent,
    SignalRelayEvent, SignalRequest,
};
use plauderei_store::MessageRepository;
use std::sync::Arc;

use crate::server_state::SignalingState;

/// Verarbeitet einen Anruf-Wunsch
///
/// Ist das Ziel offline, entsteht kein Anruf: der Anrufer erhaelt sofort
/// eine Ablehnung ohne CallId.
pub async fn handle_anruf<R: MessageRepository + 'static>(
    request: CallRequestPayload,
    request_id: u32,
    user_id: UserId,
    state: &Arc<SignalingState<R>>,
) -> ControlMessage {
    // Erreichbarkeits-Snapshot vor der Anlage
    let ziel_verbindungen = state.registry.verbindungen_von(&request.target_id);
    if ziel_verbindungen.is_empty() {
        tracing::debug!(
            anrufer = %user_id,
            ziel = %request.target_id,
            "Anruf an offline Ziel abgelehnt"
        );
        return ControlMessage::new(
            request_id,
            ControlPayload::CallRejected(CallRejectedEvent {
                call_id: None,
                reason: "offline".to_string(),
            }),
        );
    }

    let call = state
        .anrufe
        .erstellen(user_id, request.target_id, request.call_type);

    let einladung = ControlMessage::event(ControlPayload::IncomingCall(IncomingCallEvent {
        call_id: call.id.clone(),
        caller_id: user_id,
        call_type: request.call_type,
    }));
    for verbindung in &ziel_verbindungen {
        state
            .registry
            .an_verbindung_senden(verbindung, einladung.clone());
    }

    tracing::info!(
        call_id = %call.id,
        anrufer = %user_id,
        ziel = %request.target_id,
        "Anruf klingelt"
    );

    ControlMessage::new(
        request_id,
        ControlPayload::CallInitiated(CallInitiatedResponse { call_id: call.id }),
    )
}

/// Verarbeitet das Annehmen eines klingelnden Anrufs
pub async fn handle_annehmen<R: MessageRepository + 'static>(
    request: CallIdPayload,
    request_id: u32,
    user_id: UserId,
    state: &Arc<SignalingState<R>>,
) -> ControlMessage {
    match state.anrufe.annehmen(&request.call_id, user_id) {
        Ok(call) => {
            let event = ControlMessage::event(ControlPayload::CallAccepted(CallAcceptedEvent {
                call_id: call.id.clone(),
                answerer_id: user_id,
            }));
            state.registry.an_benutzer_senden(&call.anrufer, event);

            tracing::info!(call_id = %call.id, annehmer = %user_id, "Anruf angenommen");

            ControlMessage::new(
                request_id,
                ControlPayload::CallAccepted(CallAcceptedEvent {
                    call_id: call.id,
                    answerer_id: user_id,
                }),
            )
        }
        Err(e) => {
            tracing::debug!(call_id = %request.call_id, fehler = %e, "Annehmen fehlgeschlagen");
            ControlMessage::error(
                request_id,
                ErrorCode::InvalidCallState,
                "Anruf klingelt nicht mehr",
            )
        }
    }
}

/// Verarbeitet das Ablehnen eines klingelnden Anrufs
pub async fn handle_ablehnen<R: MessageRepository + 'static>(
    request: CallIdPayload,
    request_id: u32,
    user_id: UserId,
    state: &Arc<SignalingState<R>>,
) -> ControlMessage {
    match state.anrufe.ablehnen(&request.call_id) {
        Ok(call) => {
            let event = ControlMessage::event(ControlPayload::CallRejected(CallRejectedEvent {
                call_id: Some(call.id.clone()),
                reason: "rejected".to_string(),
            }));
            state.registry.an_benutzer_senden(&call.anrufer, event);

            tracing::info!(call_id = %call.id, ablehner = %user_id, "Anruf abgelehnt");

            ControlMessage::new(request_id, ControlPayload::CallReject(request))
        }
        Err(e) => {
            tracing::debug!(call_id = %request.call_id, fehler = %e, "Ablehnen fehlgeschlagen");
            ControlMessage::error(
                request_id,
                ErrorCode::InvalidCallState,
                "Anruf klingelt nicht mehr",
            )
        }
    }
}

/// Verarbeitet das Zurueckziehen eines klingelnden Anrufs durch den Anrufer
pub async fn handle_abbrechen<R: MessageRepository + 'static>(
    request: CallIdPayload,
    request_id: u32,
    user_id: UserId,
    state: &Arc<SignalingState<R>>,
) -> ControlMessage {
    match state.anrufe.abbrechen(&request.call_id) {
        Ok(call) => {
            let event = ControlMessage::event(ControlPayload::CallCanceled(CallIdPayload {
                call_id: call.id.clone(),
            }));
            state.registry.an_benutzer_senden(&call.ziel, event);

            tracing::info!(call_id = %call.id, anrufer = %user_id, "Anruf zurueckgezogen");

            ControlMessage::new(request_id, ControlPayload::CallCancel(request))
        }
        Err(e) => {
            tracing::debug!(call_id = %request.call_id, fehler = %e, "Abbrechen fehlgeschlagen");
            ControlMessage::error(
                request_id,
                ErrorCode::InvalidCallState,
                "Anruf klingelt nicht mehr",
            )
        }
    }
}

/// Verarbeitet das Beenden eines Anrufs
///
/// Unbekannte CallIds sind ein gutartiges No-Op: bei zwei gleichzeitigen
/// Beenden-Anfragen raeumt genau eine auf, die andere findet den Anruf
/// nicht mehr vor und bekommt trotzdem eine Beendet-Antwort.
pub async fn handle_beenden<R: MessageRepository + 'static>(
    request: CallIdPayload,
    request_id: u32,
    user_id: UserId,
    state: &Arc<SignalingState<R>>,
) -> ControlMessage {
    match state.anrufe.beenden(&request.call_id) {
        Ok((call, dauer)) => {
            debug_assert_eq!(call.status, CallStatus::Beendet);

            if let Some(gegenpartei) = call.gegenpartei(&user_id) {
                let event = ControlMessage::event(ControlPayload::CallEnded(CallIdPayload {
                    call_id: call.id.clone(),
                }));
                state.registry.an_benutzer_senden(&gegenpartei, event);
            }

            tracing::info!(
                call_id = %call.id,
                beendet_von = %user_id,
                dauer_sek = dauer.as_secs(),
                "Anruf beendet"
            );

            ControlMessage::new(request_id, ControlPayload::CallEnded(request))
        }
        Err(e) => {
            tracing::debug!(
                call_id = %request.call_id,
                fehler = %e,
                "Beenden ohne laufenden Anruf (No-Op)"
            );
            ControlMessage::new(request_id, ControlPayload::CallEnded(request))
        }
    }
}

/// Leitet ein Session-Signal weiter (zustandslos, best-effort)
///
/// Ist das Ziel offline, wird das Signal kommentarlos verworfen; eine
/// Antwort an den Absender gibt es in keinem Fall.
pub async fn handle_signal<R: MessageRepository + 'static>(
    request: SignalRequest,
    user_id: UserId,
    state: &Arc<SignalingState<R>>,
) -> Option<ControlMessage> {
    let ziel_verbindungen = state.registry.verbindungen_von(&request.target_id);
    if ziel_verbindungen.is_empty() {
        tracing::debug!(
            call_id = %request.call_id,
            ziel = %request.target_id,
            "Signal an offline Ziel verworfen"
        );
        return None;
    }

    let relay = ControlMessage::event(ControlPayload::SignalRelay(SignalRelayEvent {
        kind: request.kind,
        call_id: request.call_id,
        from_id: user_id,
        payload: request.payload,
    }));
    for verbindung in &ziel_verbindungen {
        state
            .registry
            .an_verbindung_senden(verbindung, relay.clone());
    }

    None
}
