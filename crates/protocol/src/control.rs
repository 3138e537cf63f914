//! Control-Protokoll (TCP)
//!
//! Definiert alle Steuerungsnachrichten die ueber die TCP-Verbindung
//! zwischen Client und Relay-Server ausgetauscht werden: Identifikation,
//! Praesenz, Nachrichtenzustellung und Anruf-Signalisierung.
//!
//! ## Design
//! - Request/Response Pattern: jede Nachricht hat eine `request_id: u32`
//! - JSON-Serialisierung via serde (TCP, nicht zeitkritisch)
//! - Tagged Enums fuer typsichere Nachrichtentypen

use plauderei_core::types::{CallId, MessageId, UserId};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Fehler-Codes
// ---------------------------------------------------------------------------

/// Standardisierte Fehler-Codes fuer Error-Responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Allgemein
    InternalError,
    InvalidRequest,
    NotFound,
    // Identifikation
    NotIdentified,
    // Chat
    ValidationFailed,
    PersistenceFailed,
    // Anrufe
    InvalidCallState,
    TargetOffline,
}

// ---------------------------------------------------------------------------
// Identifikation & Praesenz
// ---------------------------------------------------------------------------

/// Identifikations-Anfrage vom Client
///
/// Die Identitaet wird vorgelagert vergeben; der Server uebernimmt sie
/// ohne eigene Pruefung und bindet die Verbindung an den Benutzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyRequest {
    /// Benutzer-ID aus dem vorgelagerten Identitaetssystem
    pub user_id: UserId,
    /// Anzeigename fuer Protokollierung
    pub display_name: String,
}

/// Vollstaendige Liste der aktuell erreichbaren Benutzer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceSnapshot {
    pub online: Vec<UserId>,
}

/// Einzelner Praesenz-Uebergang (online/offline-Flanke)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceChanged {
    pub user_id: UserId,
    pub online: bool,
}

// ---------------------------------------------------------------------------
// Chat-Nachrichten
// ---------------------------------------------------------------------------

/// Nachricht senden
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    /// Empfaenger der Nachricht
    pub receiver_id: UserId,
    /// Nachrichtentext
    pub content: String,
    /// Denormalisierter Anzeigename des Absenders
    pub sender_name: String,
    /// Konversations-Label (kanonisch aus beiden Teilnehmern gebildet)
    pub raum: String,
    /// Client-seitige Korrelations-ID fuer optimistisches Rendern
    pub temp_id: Option<String>,
}

/// Vollstaendige Nachrichten-Darstellung auf dem Draht
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageInfo {
    pub message_id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    pub sender_name: String,
    pub raum: String,
    /// Korrelations-ID aus dem Original-Request (unveraendert gespiegelt)
    pub temp_id: Option<String>,
    /// Zustellstatus: "sent", "delivered" oder "read"
    pub status: String,
    /// Erstellungszeitpunkt (RFC 3339)
    pub created_at: String,
}

/// Status-Uebergang fuer eine persistierte Nachricht
///
/// Wird in beide Richtungen verwendet: als Client-Request
/// (Zustell-/Lesebestaetigung) und als Server-Event an die Teilnehmer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageStatusRequest {
    pub message_id: MessageId,
}

/// Verlauf einer Konversation anfragen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRequest {
    /// Gespraechspartner dessen Konversation geladen wird
    pub partner_id: UserId,
}

/// Chronologisch aufsteigender Konversationsverlauf
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub messages: Vec<MessageInfo>,
}

// ---------------------------------------------------------------------------
// Anruf-Signalisierung
// ---------------------------------------------------------------------------

/// Art des Anrufs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallType {
    Audio,
    Video,
}

/// Anruf initiieren
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRequestPayload {
    pub target_id: UserId,
    pub call_type: CallType,
}

/// Bestaetigung an den Anrufer mit der vergebenen CallId
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallInitiatedResponse {
    pub call_id: CallId,
}

/// Eingehender Anruf beim Ziel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingCallEvent {
    pub call_id: CallId,
    pub caller_id: UserId,
    pub call_type: CallType,
}

/// CallId-Referenz (Accept/Cancel/End-Requests sowie Canceled/Ended-Events)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallIdPayload {
    pub call_id: CallId,
}

/// Anruf wurde angenommen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallAcceptedEvent {
    pub call_id: CallId,
    /// Benutzer der angenommen hat
    pub answerer_id: UserId,
}

/// Anruf wurde abgelehnt oder kam nicht zustande
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRejectedEvent {
    /// None wenn das Ziel offline war und nie ein Anruf entstand
    pub call_id: Option<CallId>,
    /// Ablehnungsgrund, z. B. "offline" oder "rejected"
    pub reason: String,
}

/// Art eines Session-Signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

/// Session-Signal weiterleiten (Payload ist fuer den Server opak)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRequest {
    pub kind: SignalKind,
    pub call_id: CallId,
    pub target_id: UserId,
    /// Session-Beschreibung bzw. Kandidat, unveraendert durchgereicht
    pub payload: serde_json::Value,
}

/// Weitergeleitetes Session-Signal beim Empfaenger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRelayEvent {
    pub kind: SignalKind,
    pub call_id: CallId,
    pub from_id: UserId,
    pub payload: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Keepalive
// ---------------------------------------------------------------------------

/// Ping (Client -> Server oder Server -> Client)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingMessage {
    /// Unix-Timestamp in Millisekunden fuer RTT-Messung
    pub timestamp_ms: u64,
}

/// Pong-Antwort (spiegelt Timestamp zurueck)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PongMessage {
    /// Originaler Timestamp aus dem Ping
    pub echo_timestamp_ms: u64,
    /// Server-eigener Timestamp
    pub server_timestamp_ms: u64,
}

// ---------------------------------------------------------------------------
// Haupt-Enum: ControlPayload
// ---------------------------------------------------------------------------

/// Alle moeglichen Control-Nachrichten (typsicher via Tagged Enum)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlPayload {
    // Identifikation & Praesenz (Client -> Server)
    Identify(IdentifyRequest),
    // Praesenz (Server -> Client)
    PresenceSnapshot(PresenceSnapshot),
    PresenceChanged(PresenceChanged),

    // Chat (Client -> Server)
    SendMessage(SendMessageRequest),
    MessageDelivered(MessageStatusRequest),
    MessageRead(MessageStatusRequest),
    History(HistoryRequest),
    // Chat (Server -> Client)
    MessageAck(MessageInfo),
    ReceiveMessage(MessageInfo),
    HistoryResponse(HistoryResponse),

    // Anrufe (Client -> Server)
    CallRequest(CallRequestPayload),
    CallAccept(CallIdPayload),
    CallReject(CallIdPayload),
    CallCancel(CallIdPayload),
    CallEnd(CallIdPayload),
    Signal(SignalRequest),
    // Anrufe (Server -> Client)
    CallInitiated(CallInitiatedResponse),
    IncomingCall(IncomingCallEvent),
    CallAccepted(CallAcceptedEvent),
    CallRejected(CallRejectedEvent),
    CallCanceled(CallIdPayload),
    CallEnded(CallIdPayload),
    SignalRelay(SignalRelayEvent),

    // Keepalive
    Ping(PingMessage),
    Pong(PongMessage),

    // Error
    Error(ErrorResponse),
}

/// Standardisierte Fehler-Antwort
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
    /// Optionale maschinenlesbare Details
    pub details: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Control-Frame (Umschlag fuer alle Nachrichten)
// ---------------------------------------------------------------------------

/// Control-Protokoll-Nachricht mit Request/Response-Zuordnung
///
/// Jede Nachricht traegt eine `request_id` die der Client vergibt.
/// Der Server kopiert die ID in die Antwort damit der Client
/// Request und Response zuordnen kann. Server-initiierte Events
/// tragen die request_id 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlMessage {
    /// Eindeutige Nachrichten-ID fuer Request/Response-Zuordnung
    pub request_id: u32,
    /// Inhalt der Nachricht
    pub payload: ControlPayload,
}

/// request_id fuer server-initiierte Events ohne zugehoerigen Request
pub const EVENT_REQUEST_ID: u32 = 0;

impl ControlMessage {
    /// Erstellt eine neue Control-Nachricht
    pub fn new(request_id: u32, payload: ControlPayload) -> Self {
        Self {
            request_id,
            payload,
        }
    }

    /// Erstellt ein server-initiiertes Event (request_id 0)
    pub fn event(payload: ControlPayload) -> Self {
        Self::new(EVENT_REQUEST_ID, payload)
    }

    /// Erstellt eine Ping-Nachricht
    pub fn ping(request_id: u32, timestamp_ms: u64) -> Self {
        Self::new(
            request_id,
            ControlPayload::Ping(PingMessage { timestamp_ms }),
        )
    }

    /// Erstellt eine Pong-Antwort
    pub fn pong(request_id: u32, echo_timestamp_ms: u64, server_timestamp_ms: u64) -> Self {
        Self::new(
            request_id,
            ControlPayload::Pong(PongMessage {
                echo_timestamp_ms,
                server_timestamp_ms,
            }),
        )
    }

    /// Erstellt eine Fehler-Antwort
    pub fn error(request_id: u32, code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(
            request_id,
            ControlPayload::Error(ErrorResponse {
                code,
                message: message.into(),
                details: None,
            }),
        )
    }

    /// Serialisiert die Nachricht als JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Deserialisiert eine Nachricht aus JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
