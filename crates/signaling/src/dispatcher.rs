//! Message-Dispatcher – Routet ControlMessages an die richtigen Handler
//!
//! Der Dispatcher empfaengt ControlMessages von einer ClientConnection,
//! bestimmt den richtigen Handler und gibt die Antwort zurueck.
//!
//! ## Zustandspruefung
//! - `Identify` und Keepalive sind immer erlaubt
//! - Alle anderen Nachrichten erfordern eine identifizierte Verbindung

use plauderei_core::types::{ConnectionId, UserId};
use plauderei_protocol::control::{ControlMessage, ControlPayload, ErrorCode};
use plauderei_store::MessageRepository;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::handlers::{call_handler, chat_handler, presence_handler};
use crate::server_state::SignalingState;

/// Dispatcher-Kontext – Informationen ueber die aktuelle Verbindung
pub struct DispatcherContext {
    /// Handle der Transport-Verbindung
    pub verbindungs_id: ConnectionId,
    /// Peer-IP-Adresse fuer Protokollierung
    pub peer_addr: SocketAddr,
    /// Gebundene User-ID (None bis zur Identifikation)
    pub user_id: Option<UserId>,
}

/// Zentraler Message-Dispatcher
///
/// Routet eingehende ControlMessages an die entsprechenden Handler und
/// gibt die Antwort-ControlMessage zurueck.
pub struct MessageDispatcher<R: MessageRepository + 'static> {
    state: Arc<SignalingState<R>>,
}

impl<R: MessageRepository + 'static> MessageDispatcher<R> {
    /// Erstellt einen neuen Dispatcher
    pub fn neu(state: Arc<SignalingState<R>>) -> Self {
        Self { state }
    }

    /// Verarbeitet eine eingehende ControlMessage und gibt die Antwort zurueck
    ///
    /// Gibt `None` zurueck wenn keine Antwort gesendet werden soll
    /// (z.B. bei Signal-Relays oder Pong-Antworten).
    pub async fn dispatch(
        &self,
        message: ControlMessage,
        ctx: &mut DispatcherContext,
    ) -> Option<ControlMessage> {
        let request_id = message.request_id;

        match message.payload {
            // -------------------------------------------------------------------
            // Identifikation (immer erlaubt)
            // -------------------------------------------------------------------
            ControlPayload::Identify(req) => Some(
                presence_handler::handle_identify(req, request_id, ctx, &self.state).await,
            ),

            // -------------------------------------------------------------------
            // Keepalive
            // -------------------------------------------------------------------
            ControlPayload::Ping(ping) => {
                let server_ts = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_millis() as u64;
                Some(ControlMessage::pong(
                    request_id,
                    ping.timestamp_ms,
                    server_ts,
                ))
            }

            ControlPayload::Pong(_) => {
                // Pong-Antworten vom Client werden nur geloggt (RTT-Messung)
                tracing::trace!("Pong empfangen (RTT-Messung)");
                None
            }

            // -------------------------------------------------------------------
            // Identifikation erfordernde Nachrichten
            // -------------------------------------------------------------------
            payload => {
                let user_id = match ctx.user_id {
                    Some(uid) => uid,
                    None => {
                        return Some(ControlMessage::error(
                            request_id,
                            ErrorCode::NotIdentified,
                            "Nicht identifiziert – bitte zuerst Identify senden",
                        ));
                    }
                };

                self.dispatch_identified(payload, request_id, user_id).await
            }
        }
    }

    /// Routet Nachrichten die eine Identifikation erfordern
    async fn dispatch_identified(
        &self,
        payload: ControlPayload,
        request_id: u32,
        user_id: UserId,
    ) -> Option<ControlMessage> {
        match payload {
            // -------------------------------------------------------------------
            // Chat-Nachrichten
            // -------------------------------------------------------------------
            ControlPayload::SendMessage(req) => {
                Some(chat_handler::handle_send(req, request_id, user_id, &self.state).await)
            }

            ControlPayload::MessageDelivered(req) => Some(
                chat_handler::handle_zugestellt(req, request_id, user_id, &self.state).await,
            ),

            ControlPayload::MessageRead(req) => {
                Some(chat_handler::handle_gelesen(req, request_id, user_id, &self.state).await)
            }

            ControlPayload::History(req) => {
                Some(chat_handler::handle_verlauf(req, request_id, user_id, &self.state).await)
            }

            // -------------------------------------------------------------------
            // Anruf-Nachrichten
            // -------------------------------------------------------------------
            ControlPayload::CallRequest(req) => {
                Some(call_handler::handle_anruf(req, request_id, user_id, &self.state).await)
            }

            ControlPayload::CallAccept(req) => {
                Some(call_handler::handle_annehmen(req, request_id, user_id, &self.state).await)
            }

            ControlPayload::CallReject(req) => {
                Some(call_handler::handle_ablehnen(req, request_id, user_id, &self.state).await)
            }

            ControlPayload::CallCancel(req) => Some(
                call_handler::handle_abbrechen(req, request_id, user_id, &self.state).await,
            ),

            ControlPayload::CallEnd(req) => {
                Some(call_handler::handle_beenden(req, request_id, user_id, &self.state).await)
            }

            ControlPayload::Signal(req) => {
                call_handler::handle_signal(req, user_id, &self.state).await
            }

            // -------------------------------------------------------------------
            // Unbekannte / unerwartete Nachrichten
            // -------------------------------------------------------------------
            ControlPayload::PresenceSnapshot(_)
            | ControlPayload::PresenceChanged(_)
            | ControlPayload::MessageAck(_)
            | ControlPayload::ReceiveMessage(_)
            | ControlPayload::HistoryResponse(_)
            | ControlPayload::CallInitiated(_)
            | ControlPayload::IncomingCall(_)
            | ControlPayload::CallAccepted(_)
            | ControlPayload::CallRejected(_)
            | ControlPayload::CallCanceled(_)
            | ControlPayload::CallEnded(_)
            | ControlPayload::SignalRelay(_)
            | ControlPayload::Error(_) => {
                tracing::warn!(
                    request_id,
                    user_id = %user_id,
                    "Unerwartete Server->Client Nachricht vom Client empfangen"
                );
                Some(ControlMessage::error(
                    request_id,
                    ErrorCode::InvalidRequest,
                    "Unerwartete Nachricht",
                ))
            }

            // Identify/Ping/Pong werden oben bereits behandelt
            ControlPayload::Identify(_)
            | ControlPayload::Ping(_)
            | ControlPayload::Pong(_) => None,
        }
    }

    /// Bereinigt die Ressourcen einer Verbindung beim Trennen
    ///
    /// Die Offline-Flanke wird nur gemeldet wenn die letzte Verbindung des
    /// Benutzers verschwindet. Laufende Anrufe bleiben bewusst stehen: die
    /// Gegenseite beendet sie oder die Medienschicht laeuft in ihr Timeout.
    pub async fn client_cleanup(&self, verbindungs_id: &ConnectionId) {
        if let Some((user_id, offline)) = self.state.registry.verbindung_entfernen(verbindungs_id)
        {
            if offline {
                self.state.presence.offline_melden(user_id);
            }
        }
        tracing::debug!(verbindung = %verbindungs_id, "Verbindungs-Ressourcen bereinigt");
    }
}
