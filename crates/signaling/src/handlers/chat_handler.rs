//! Chat-Handler – Senden, Zustell-/Lesebestaetigung, Verlauf
//!
//! Die Zustell-Pipeline: validieren und persistieren ueber den
//! NachrichtenService, dann Erreichbarkeit des Empfaengers als Snapshot
//! aus der Registry ziehen und an jedes erreichte Geraet weiterleiten.
//! Zwischen Snapshot und Zustellung wird kein Lock gehalten.

use plauderei_core::types::UserId;
use plauderei_chat::{Nachricht, NachrichtenError};
use plauderei_protocol::control::{
    ControlMessage, ControlPayload, ErrorCode, HistoryRequest, HistoryResponse, MessageInfo,
    MessageStatusRequest, SendMessageRequest,
};
use plauderei_store::MessageRepository;
use std::sync::Arc;

use crate::server_state::SignalingState;

/// Verarbeitet das Senden einer Nachricht
pub async fn handle_send<R: MessageRepository + 'static>(
    request: SendMessageRequest,
    request_id: u32,
    user_id: UserId,
    state: &Arc<SignalingState<R>>,
) -> ControlMessage {
    let nachricht = match state
        .nachrichten
        .senden(
            user_id,
            request.receiver_id,
            &request.content,
            &request.sender_name,
            &request.raum,
            request.temp_id.clone(),
        )
        .await
    {
        Ok(n) => n,
        Err(e) => return fehler_antwort(request_id, user_id, e),
    };

    // Erreichbarkeits-Snapshot nach der Persistierung
    let ziel_verbindungen = state.registry.verbindungen_von(&request.receiver_id);

    let nachricht = if ziel_verbindungen.is_empty() {
        // Empfaenger offline: Status bleibt "sent", Zustellung erfolgt
        // spaeter ueber den Verlauf
        nachricht
    } else {
        let zugestellt = match state.nachrichten.als_zugestellt(nachricht.id).await {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(
                    message_id = %nachricht.id,
                    fehler = %e,
                    "Zustell-Status konnte nicht gesetzt werden"
                );
                nachricht
            }
        };

        let relay = ControlMessage::event(ControlPayload::ReceiveMessage(nachricht_zu_info(
            &zugestellt,
        )));
        for verbindung in &ziel_verbindungen {
            state.registry.an_verbindung_senden(verbindung, relay.clone());
        }

        tracing::debug!(
            message_id = %zugestellt.id,
            empfaenger = %request.receiver_id,
            geraete = ziel_verbindungen.len(),
            "Nachricht zugestellt"
        );
        zugestellt
    };

    ControlMessage::new(
        request_id,
        ControlPayload::MessageAck(nachricht_zu_info(&nachricht)),
    )
}

/// Verarbeitet eine Zustellbestaetigung des Empfaengers
pub async fn handle_zugestellt<R: MessageRepository + 'static>(
    request: MessageStatusRequest,
    request_id: u32,
    user_id: UserId,
    state: &Arc<SignalingState<R>>,
) -> ControlMessage {
    match state.nachrichten.als_zugestellt(request.message_id).await {
        Ok(nachricht) => {
            // Nur bei tatsaechlichem Zustell-Status den Raum informieren;
            // nach "read" ist die Bestaetigung ein No-Op
            if nachricht.status == plauderei_store::NachrichtStatus::Zugestellt {
                status_event_an_raum(
                    state,
                    &nachricht,
                    ControlPayload::MessageDelivered(request.clone()),
                );
            }
            ControlMessage::new(request_id, ControlPayload::MessageDelivered(request))
        }
        Err(e) => fehler_antwort(request_id, user_id, e),
    }
}

/// Verarbeitet eine Lesebestaetigung des Empfaengers
pub async fn handle_gelesen<R: MessageRepository + 'static>(
    request: MessageStatusRequest,
    request_id: u32,
    user_id: UserId,
    state: &Arc<SignalingState<R>>,
) -> ControlMessage {
    match state
        .nachrichten
        .als_gelesen(request.message_id, user_id)
        .await
    {
        Ok(nachricht) => {
            status_event_an_raum(
                state,
                &nachricht,
                ControlPayload::MessageRead(request.clone()),
            );
            ControlMessage::new(request_id, ControlPayload::MessageRead(request))
        }
        Err(e) => fehler_antwort(request_id, user_id, e),
    }
}

/// Verarbeitet eine Verlaufs-Anfrage
pub async fn handle_verlauf<R: MessageRepository + 'static>(
    request: HistoryRequest,
    request_id: u32,
    user_id: UserId,
    state: &Arc<SignalingState<R>>,
) -> ControlMessage {
    match state.nachrichten.verlauf(user_id, request.partner_id).await {
        Ok(nachrichten) => ControlMessage::new(
            request_id,
            ControlPayload::HistoryResponse(HistoryResponse {
                messages: nachrichten.iter().map(nachricht_zu_info).collect(),
            }),
        ),
        Err(e) => fehler_antwort(request_id, user_id, e),
    }
}

/// Sendet ein Status-Event an alle Geraete beider Raum-Teilnehmer
///
/// Der Absender sieht den Haken, die uebrigen Geraete des Empfaengers
/// ziehen ihren Lesestand nach.
fn status_event_an_raum<R: MessageRepository + 'static>(
    state: &Arc<SignalingState<R>>,
    nachricht: &Nachricht,
    payload: ControlPayload,
) {
    let event = ControlMessage::event(payload);
    let mut gesendet = state
        .registry
        .an_benutzer_senden(&nachricht.sender_id, event.clone());
    gesendet += state
        .registry
        .an_benutzer_senden(&nachricht.empfaenger_id, event);
    tracing::trace!(
        message_id = %nachricht.id,
        raum = %nachricht.raum,
        geraete = gesendet,
        "Status-Event verteilt"
    );
}

/// Konvertiert den Domain-Typ in die Draht-Darstellung
fn nachricht_zu_info(nachricht: &Nachricht) -> MessageInfo {
    MessageInfo {
        message_id: nachricht.id,
        sender_id: nachricht.sender_id,
        receiver_id: nachricht.empfaenger_id,
        content: nachricht.content.clone(),
        sender_name: nachricht.sender_name.clone(),
        raum: nachricht.raum.clone(),
        temp_id: nachricht.temp_id.clone(),
        status: nachricht.status.als_str().to_string(),
        created_at: nachricht.erstellt_am.to_rfc3339(),
    }
}

/// Mappt Service-Fehler auf Draht-Fehlercodes
fn fehler_antwort(request_id: u32, user_id: UserId, fehler: NachrichtenError) -> ControlMessage {
    tracing::warn!(user_id = %user_id, fehler = %fehler, "Chat-Anfrage fehlgeschlagen");
    match fehler {
        NachrichtenError::UngueltigeEingabe(msg) => {
            ControlMessage::error(request_id, ErrorCode::ValidationFailed, msg)
        }
        NachrichtenError::NichtGefunden(msg) => {
            ControlMessage::error(request_id, ErrorCode::NotFound, msg)
        }
        NachrichtenError::Speicher(e) => ControlMessage::error(
            request_id,
            ErrorCode::PersistenceFailed,
            format!("Nachricht konnte nicht gespeichert werden: {}", e),
        ),
    }
}
