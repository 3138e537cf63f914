//! End-to-End-Tests des Dispatchers
//!
//! Die Tests fahren den Dispatcher direkt ueber registrierte Verbindungen
//! (Registry-Queues statt TCP) und pruefen die zugesagten Ablaeufe:
//! Multi-Device-Praesenz, Zustellung an offline/online Empfaenger,
//! Lesebestaetigungen, Anruf-Lebenszyklus und Signal-Relay.

use std::sync::Arc;

use plauderei_chat::{raum_label, NachrichtenService};
use plauderei_core::types::{ConnectionId, MessageId, UserId};
use plauderei_protocol::control::{
    CallIdPayload, CallRequestPayload, CallType, ControlMessage, ControlPayload, ErrorCode,
    HistoryRequest, IdentifyRequest, MessageStatusRequest, SendMessageRequest, SignalKind,
    SignalRequest,
};
use plauderei_store::MemoryStore;
use tokio::sync::mpsc;

use crate::dispatcher::{DispatcherContext, MessageDispatcher};
use crate::server_state::{SignalingConfig, SignalingState};

// ---------------------------------------------------------------------------
// Test-Harness
// ---------------------------------------------------------------------------

struct TestClient {
    ctx: DispatcherContext,
    rx: mpsc::Receiver<ControlMessage>,
}

impl TestClient {
    fn leeren(&mut self) {
        while self.rx.try_recv().is_ok() {}
    }

    fn naechstes_event(&mut self) -> ControlMessage {
        self.rx.try_recv().expect("Event in der Queue erwartet")
    }

    fn keine_events(&mut self) {
        assert!(self.rx.try_recv().is_err(), "Queue muss leer sein");
    }
}

fn test_state() -> Arc<SignalingState<MemoryStore>> {
    let nachrichten = NachrichtenService::neu(Arc::new(MemoryStore::new()));
    SignalingState::neu(SignalingConfig::default(), nachrichten)
}

fn verbinden(state: &Arc<SignalingState<MemoryStore>>) -> TestClient {
    let verbindungs_id = ConnectionId::new();
    let rx = state.registry.verbindung_hinzufuegen(verbindungs_id);
    TestClient {
        ctx: DispatcherContext {
            verbindungs_id,
            peer_addr: "127.0.0.1:0".parse().unwrap(),
            user_id: None,
        },
        rx,
    }
}

async fn identifizieren(
    dispatcher: &MessageDispatcher<MemoryStore>,
    client: &mut TestClient,
    user_id: UserId,
) {
    let antwort = dispatcher
        .dispatch(
            ControlMessage::new(
                1,
                ControlPayload::Identify(IdentifyRequest {
                    user_id,
                    display_name: "Testbenutzer".into(),
                }),
            ),
            &mut client.ctx,
        )
        .await
        .expect("Identify muss beantwortet werden");
    assert!(
        matches!(antwort.payload, ControlPayload::PresenceSnapshot(_)),
        "Identify-Antwort ist der Snapshot"
    );
}

async fn senden(
    dispatcher: &MessageDispatcher<MemoryStore>,
    client: &mut TestClient,
    empfaenger: UserId,
    text: &str,
) -> ControlMessage {
    let absender = client.ctx.user_id.expect("Client muss identifiziert sein");
    dispatcher
        .dispatch(
            ControlMessage::new(
                10,
                ControlPayload::SendMessage(SendMessageRequest {
                    receiver_id: empfaenger,
                    content: text.into(),
                    sender_name: "Testbenutzer".into(),
                    raum: raum_label(&absender, &empfaenger),
                    temp_id: None,
                }),
            ),
            &mut client.ctx,
        )
        .await
        .expect("SendMessage muss beantwortet werden")
}

// ---------------------------------------------------------------------------
// Identifikations-Gate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unidentifizierte_anfragen_abgelehnt() {
    let state = test_state();
    let dispatcher = MessageDispatcher::neu(Arc::clone(&state));
    let mut client = verbinden(&state);

    let antwort = dispatcher
        .dispatch(
            ControlMessage::new(
                5,
                ControlPayload::History(HistoryRequest {
                    partner_id: UserId::new(),
                }),
            ),
            &mut client.ctx,
        )
        .await
        .unwrap();

    match antwort.payload {
        ControlPayload::Error(e) => assert_eq!(e.code, ErrorCode::NotIdentified),
        andere => panic!("Erwartet Error, war {:?}", andere),
    }
}

#[tokio::test]
async fn ping_ohne_identifikation_erlaubt() {
    let state = test_state();
    let dispatcher = MessageDispatcher::neu(Arc::clone(&state));
    let mut client = verbinden(&state);

    let antwort = dispatcher
        .dispatch(ControlMessage::ping(3, 111), &mut client.ctx)
        .await
        .unwrap();
    match antwort.payload {
        ControlPayload::Pong(p) => assert_eq!(p.echo_timestamp_ms, 111),
        andere => panic!("Erwartet Pong, war {:?}", andere),
    }
}

// ---------------------------------------------------------------------------
// Multi-Device-Praesenz und Zustellung
// ---------------------------------------------------------------------------

#[tokio::test]
async fn zustellung_an_alle_geraete_des_empfaengers() {
    let state = test_state();
    let dispatcher = MessageDispatcher::neu(Arc::clone(&state));
    let anna = UserId::new();
    let ben = UserId::new();

    let mut anna_client = verbinden(&state);
    let mut ben_handy = verbinden(&state);
    let mut ben_laptop = verbinden(&state);

    identifizieren(&dispatcher, &mut anna_client, anna).await;
    identifizieren(&dispatcher, &mut ben_handy, ben).await;
    identifizieren(&dispatcher, &mut ben_laptop, ben).await;
    anna_client.leeren();
    ben_handy.leeren();
    ben_laptop.leeren();

    let ack = senden(&dispatcher, &mut anna_client, ben, "Hallo Ben!").await;
    match ack.payload {
        ControlPayload::MessageAck(info) => {
            assert_eq!(info.status, "delivered");
            assert_eq!(info.content, "Hallo Ben!");
        }
        andere => panic!("Erwartet MessageAck, war {:?}", andere),
    }

    for geraet in [&mut ben_handy, &mut ben_laptop] {
        let event = geraet.naechstes_event();
        match event.payload {
            ControlPayload::ReceiveMessage(info) => {
                assert_eq!(info.sender_id, anna);
                assert_eq!(info.status, "delivered");
            }
            andere => panic!("Erwartet ReceiveMessage, war {:?}", andere),
        }
    }
}

#[tokio::test]
async fn offline_flanke_erst_beim_letzten_geraet() {
    let state = test_state();
    let dispatcher = MessageDispatcher::neu(Arc::clone(&state));
    let anna = UserId::new();
    let ben = UserId::new();

    let mut anna_client = verbinden(&state);
    let mut ben_handy = verbinden(&state);
    let mut ben_laptop = verbinden(&state);

    identifizieren(&dispatcher, &mut anna_client, anna).await;
    identifizieren(&dispatcher, &mut ben_handy, ben).await;
    identifizieren(&dispatcher, &mut ben_laptop, ben).await;
    anna_client.leeren();

    // Erstes Geraet trennt: keine Flanke
    dispatcher
        .client_cleanup(&ben_handy.ctx.verbindungs_id)
        .await;
    anna_client.keine_events();
    assert!(state.registry.ist_online(&ben));

    // Letztes Geraet trennt: Offline-Flanke + Snapshot
    dispatcher
        .client_cleanup(&ben_laptop.ctx.verbindungs_id)
        .await;
    let flanke = anna_client.naechstes_event();
    match flanke.payload {
        ControlPayload::PresenceChanged(p) => {
            assert_eq!(p.user_id, ben);
            assert!(!p.online);
        }
        andere => panic!("Erwartet PresenceChanged, war {:?}", andere),
    }
    let snapshot = anna_client.naechstes_event();
    match snapshot.payload {
        ControlPayload::PresenceSnapshot(s) => assert!(!s.online.contains(&ben)),
        andere => panic!("Erwartet PresenceSnapshot, war {:?}", andere),
    }
}

// ---------------------------------------------------------------------------
// Offline-Zustellung und Verlauf
// ---------------------------------------------------------------------------

#[tokio::test]
async fn nachricht_an_offline_empfaenger_bleibt_gesendet() {
    let state = test_state();
    let dispatcher = MessageDispatcher::neu(Arc::clone(&state));
    let anna = UserId::new();
    let ben = UserId::new();

    let mut anna_client = verbinden(&state);
    identifizieren(&dispatcher, &mut anna_client, anna).await;

    let ack = senden(&dispatcher, &mut anna_client, ben, "Bist du da?").await;
    match ack.payload {
        ControlPayload::MessageAck(info) => assert_eq!(info.status, "sent"),
        andere => panic!("Erwartet MessageAck, war {:?}", andere),
    }

    // Ben verbindet sich spaeter und laedt den Verlauf
    let mut ben_client = verbinden(&state);
    identifizieren(&dispatcher, &mut ben_client, ben).await;

    let antwort = dispatcher
        .dispatch(
            ControlMessage::new(
                20,
                ControlPayload::History(HistoryRequest { partner_id: anna }),
            ),
            &mut ben_client.ctx,
        )
        .await
        .unwrap();
    match antwort.payload {
        ControlPayload::HistoryResponse(h) => {
            assert_eq!(h.messages.len(), 1);
            assert_eq!(h.messages[0].content, "Bist du da?");
            assert_eq!(h.messages[0].status, "sent");
        }
        andere => panic!("Erwartet HistoryResponse, war {:?}", andere),
    }
}

// ---------------------------------------------------------------------------
// Lesebestaetigungen und Monotonie
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lesebestaetigung_erreicht_absender() {
    let state = test_state();
    let dispatcher = MessageDispatcher::neu(Arc::clone(&state));
    let anna = UserId::new();
    let ben = UserId::new();

    let mut anna_client = verbinden(&state);
    let mut ben_client = verbinden(&state);
    identifizieren(&dispatcher, &mut anna_client, anna).await;
    identifizieren(&dispatcher, &mut ben_client, ben).await;
    anna_client.leeren();
    ben_client.leeren();

    let ack = senden(&dispatcher, &mut anna_client, ben, "Hallo").await;
    let message_id = match ack.payload {
        ControlPayload::MessageAck(info) => info.message_id,
        andere => panic!("Erwartet MessageAck, war {:?}", andere),
    };
    ben_client.leeren();

    // Ben liest die Nachricht
    let antwort = dispatcher
        .dispatch(
            ControlMessage::new(
                30,
                ControlPayload::MessageRead(MessageStatusRequest { message_id }),
            ),
            &mut ben_client.ctx,
        )
        .await
        .unwrap();
    assert!(matches!(antwort.payload, ControlPayload::MessageRead(_)));

    let event = anna_client.naechstes_event();
    match event.payload {
        ControlPayload::MessageRead(e) => assert_eq!(e.message_id, message_id),
        andere => panic!("Erwartet MessageRead, war {:?}", andere),
    }

    // Raum-Broadcast: auch Bens eigene Geraete ziehen den Lesestand nach
    let event = ben_client.naechstes_event();
    assert!(matches!(event.payload, ControlPayload::MessageRead(_)));

    // Verspaetete Zustellbestaetigung: kein Event mehr, Status bleibt "read"
    anna_client.leeren();
    dispatcher
        .dispatch(
            ControlMessage::new(
                31,
                ControlPayload::MessageDelivered(MessageStatusRequest { message_id }),
            ),
            &mut ben_client.ctx,
        )
        .await
        .unwrap();
    anna_client.keine_events();

    let antwort = dispatcher
        .dispatch(
            ControlMessage::new(
                32,
                ControlPayload::History(HistoryRequest { partner_id: ben }),
            ),
            &mut anna_client.ctx,
        )
        .await
        .unwrap();
    match antwort.payload {
        ControlPayload::HistoryResponse(h) => assert_eq!(h.messages[0].status, "read"),
        andere => panic!("Erwartet HistoryResponse, war {:?}", andere),
    }
}

#[tokio::test]
async fn lesebestaetigung_vom_absender_abgelehnt() {
    let state = test_state();
    let dispatcher = MessageDispatcher::neu(Arc::clone(&state));
    let anna = UserId::new();
    let ben = UserId::new();

    let mut anna_client = verbinden(&state);
    let mut ben_client = verbinden(&state);
    identifizieren(&dispatcher, &mut anna_client, anna).await;
    identifizieren(&dispatcher, &mut ben_client, ben).await;

    let ack = senden(&dispatcher, &mut anna_client, ben, "Hallo").await;
    let message_id = match ack.payload {
        ControlPayload::MessageAck(info) => info.message_id,
        andere => panic!("Erwartet MessageAck, war {:?}", andere),
    };

    // Anna (Absender) versucht die eigene Nachricht als gelesen zu melden
    let antwort = dispatcher
        .dispatch(
            ControlMessage::new(
                40,
                ControlPayload::MessageRead(MessageStatusRequest { message_id }),
            ),
            &mut anna_client.ctx,
        )
        .await
        .unwrap();
    match antwort.payload {
        ControlPayload::Error(e) => assert_eq!(e.code, ErrorCode::ValidationFailed),
        andere => panic!("Erwartet Error, war {:?}", andere),
    }
}

#[tokio::test]
async fn unbekannte_nachricht_not_found() {
    let state = test_state();
    let dispatcher = MessageDispatcher::neu(Arc::clone(&state));
    let mut client = verbinden(&state);
    identifizieren(&dispatcher, &mut client, UserId::new()).await;

    let antwort = dispatcher
        .dispatch(
            ControlMessage::new(
                41,
                ControlPayload::MessageDelivered(MessageStatusRequest {
                    message_id: MessageId::new(),
                }),
            ),
            &mut client.ctx,
        )
        .await
        .unwrap();
    match antwort.payload {
        ControlPayload::Error(e) => assert_eq!(e.code, ErrorCode::NotFound),
        andere => panic!("Erwartet Error, war {:?}", andere),
    }
}

// ---------------------------------------------------------------------------
// Anruf-Lebenszyklus
// ---------------------------------------------------------------------------

async fn anruf_aufbauen(
    dispatcher: &MessageDispatcher<MemoryStore>,
    anrufer: &mut TestClient,
    ziel_user: UserId,
) -> plauderei_core::types::CallId {
    let antwort = dispatcher
        .dispatch(
            ControlMessage::new(
                50,
                ControlPayload::CallRequest(CallRequestPayload {
                    target_id: ziel_user,
                    call_type: CallType::Video,
                }),
            ),
            &mut anrufer.ctx,
        )
        .await
        .unwrap();
    match antwort.payload {
        ControlPayload::CallInitiated(r) => r.call_id,
        andere => panic!("Erwartet CallInitiated, war {:?}", andere),
    }
}

#[tokio::test]
async fn anruf_annehmen_und_beenden() {
    let state = test_state();
    let dispatcher = MessageDispatcher::neu(Arc::clone(&state));
    let anna = UserId::new();
    let ben = UserId::new();

    let mut anna_client = verbinden(&state);
    let mut ben_client = verbinden(&state);
    identifizieren(&dispatcher, &mut anna_client, anna).await;
    identifizieren(&dispatcher, &mut ben_client, ben).await;
    anna_client.leeren();
    ben_client.leeren();

    let call_id = anruf_aufbauen(&dispatcher, &mut anna_client, ben).await;

    // Ben bekommt die Einladung
    let event = ben_client.naechstes_event();
    match event.payload {
        ControlPayload::IncomingCall(e) => {
            assert_eq!(e.call_id, call_id);
            assert_eq!(e.caller_id, anna);
            assert_eq!(e.call_type, CallType::Video);
        }
        andere => panic!("Erwartet IncomingCall, war {:?}", andere),
    }

    // Ben nimmt an; Anna bekommt CallAccepted
    dispatcher
        .dispatch(
            ControlMessage::new(
                51,
                ControlPayload::CallAccept(CallIdPayload {
                    call_id: call_id.clone(),
                }),
            ),
            &mut ben_client.ctx,
        )
        .await
        .unwrap();
    let event = anna_client.naechstes_event();
    match event.payload {
        ControlPayload::CallAccepted(e) => {
            assert_eq!(e.call_id, call_id);
            assert_eq!(e.answerer_id, ben);
        }
        andere => panic!("Erwartet CallAccepted, war {:?}", andere),
    }

    // Anna beendet; Ben bekommt CallEnded, der Eintrag verschwindet
    let antwort = dispatcher
        .dispatch(
            ControlMessage::new(
                52,
                ControlPayload::CallEnd(CallIdPayload {
                    call_id: call_id.clone(),
                }),
            ),
            &mut anna_client.ctx,
        )
        .await
        .unwrap();
    assert!(matches!(antwort.payload, ControlPayload::CallEnded(_)));
    let event = ben_client.naechstes_event();
    assert!(matches!(event.payload, ControlPayload::CallEnded(_)));
    assert_eq!(state.anrufe.anzahl(), 0);
}

#[tokio::test]
async fn anruf_an_offline_ziel_sofort_abgelehnt() {
    let state = test_state();
    let dispatcher = MessageDispatcher::neu(Arc::clone(&state));
    let mut anna_client = verbinden(&state);
    identifizieren(&dispatcher, &mut anna_client, UserId::new()).await;

    let antwort = dispatcher
        .dispatch(
            ControlMessage::new(
                53,
                ControlPayload::CallRequest(CallRequestPayload {
                    target_id: UserId::new(),
                    call_type: CallType::Audio,
                }),
            ),
            &mut anna_client.ctx,
        )
        .await
        .unwrap();
    match antwort.payload {
        ControlPayload::CallRejected(r) => {
            assert!(r.call_id.is_none(), "Es darf kein Anruf entstanden sein");
            assert_eq!(r.reason, "offline");
        }
        andere => panic!("Erwartet CallRejected, war {:?}", andere),
    }
    assert_eq!(state.anrufe.anzahl(), 0);
}

#[tokio::test]
async fn doppeltes_beenden_ist_gutartig() {
    let state = test_state();
    let dispatcher = MessageDispatcher::neu(Arc::clone(&state));
    let anna = UserId::new();
    let ben = UserId::new();

    let mut anna_client = verbinden(&state);
    let mut ben_client = verbinden(&state);
    identifizieren(&dispatcher, &mut anna_client, anna).await;
    identifizieren(&dispatcher, &mut ben_client, ben).await;
    anna_client.leeren();
    ben_client.leeren();

    let call_id = anruf_aufbauen(&dispatcher, &mut anna_client, ben).await;
    ben_client.leeren();

    // Beide beenden "gleichzeitig": der zweite sieht den Anruf nicht mehr,
    // bekommt aber dieselbe Beendet-Antwort und kein Fehler-Event
    for client in [&mut anna_client, &mut ben_client] {
        let antwort = dispatcher
            .dispatch(
                ControlMessage::new(
                    54,
                    ControlPayload::CallEnd(CallIdPayload {
                        call_id: call_id.clone(),
                    }),
                ),
                &mut client.ctx,
            )
            .await
            .unwrap();
        assert!(matches!(antwort.payload, ControlPayload::CallEnded(_)));
    }
    assert_eq!(state.anrufe.anzahl(), 0);
}

#[tokio::test]
async fn ablehnen_und_abbrechen() {
    let state = test_state();
    let dispatcher = MessageDispatcher::neu(Arc::clone(&state));
    let anna = UserId::new();
    let ben = UserId::new();

    let mut anna_client = verbinden(&state);
    let mut ben_client = verbinden(&state);
    identifizieren(&dispatcher, &mut anna_client, anna).await;
    identifizieren(&dispatcher, &mut ben_client, ben).await;
    anna_client.leeren();
    ben_client.leeren();

    // Ablehnen: Anna bekommt CallRejected mit CallId
    let call_id = anruf_aufbauen(&dispatcher, &mut anna_client, ben).await;
    ben_client.leeren();
    dispatcher
        .dispatch(
            ControlMessage::new(
                55,
                ControlPayload::CallReject(CallIdPayload {
                    call_id: call_id.clone(),
                }),
            ),
            &mut ben_client.ctx,
        )
        .await
        .unwrap();
    let event = anna_client.naechstes_event();
    match event.payload {
        ControlPayload::CallRejected(r) => {
            assert_eq!(r.call_id, Some(call_id));
            assert_eq!(r.reason, "rejected");
        }
        andere => panic!("Erwartet CallRejected, war {:?}", andere),
    }

    // Abbrechen (Klingel-Timeout auf Anrufer-Seite): Ben bekommt CallCanceled
    let call_id = anruf_aufbauen(&dispatcher, &mut anna_client, ben).await;
    ben_client.leeren();
    dispatcher
        .dispatch(
            ControlMessage::new(
                56,
                ControlPayload::CallCancel(CallIdPayload {
                    call_id: call_id.clone(),
                }),
            ),
            &mut anna_client.ctx,
        )
        .await
        .unwrap();
    let event = ben_client.naechstes_event();
    match event.payload {
        ControlPayload::CallCanceled(c) => assert_eq!(c.call_id, call_id),
        andere => panic!("Erwartet CallCanceled, war {:?}", andere),
    }
    assert_eq!(state.anrufe.anzahl(), 0);
}

#[tokio::test]
async fn annehmen_nach_abbruch_invalid_call_state() {
    let state = test_state();
    let dispatcher = MessageDispatcher::neu(Arc::clone(&state));
    let anna = UserId::new();
    let ben = UserId::new();

    let mut anna_client = verbinden(&state);
    let mut ben_client = verbinden(&state);
    identifizieren(&dispatcher, &mut anna_client, anna).await;
    identifizieren(&dispatcher, &mut ben_client, ben).await;
    anna_client.leeren();

    let call_id = anruf_aufbauen(&dispatcher, &mut anna_client, ben).await;
    dispatcher
        .dispatch(
            ControlMessage::new(
                57,
                ControlPayload::CallCancel(CallIdPayload {
                    call_id: call_id.clone(),
                }),
            ),
            &mut anna_client.ctx,
        )
        .await
        .unwrap();

    let antwort = dispatcher
        .dispatch(
            ControlMessage::new(58, ControlPayload::CallAccept(CallIdPayload { call_id })),
            &mut ben_client.ctx,
        )
        .await
        .unwrap();
    match antwort.payload {
        ControlPayload::Error(e) => assert_eq!(e.code, ErrorCode::InvalidCallState),
        andere => panic!("Erwartet Error, war {:?}", andere),
    }
}

// ---------------------------------------------------------------------------
// Signal-Relay
// ---------------------------------------------------------------------------

#[tokio::test]
async fn signal_relay_und_verwerfen() {
    let state = test_state();
    let dispatcher = MessageDispatcher::neu(Arc::clone(&state));
    let anna = UserId::new();
    let ben = UserId::new();

    let mut anna_client = verbinden(&state);
    let mut ben_client = verbinden(&state);
    identifizieren(&dispatcher, &mut anna_client, anna).await;
    identifizieren(&dispatcher, &mut ben_client, ben).await;
    anna_client.leeren();
    ben_client.leeren();

    let call_id = anruf_aufbauen(&dispatcher, &mut anna_client, ben).await;
    ben_client.leeren();

    // Offer wird unveraendert mit Absender-Kennung weitergereicht
    let sdp = serde_json::json!({ "sdp": "v=0..." });
    let antwort = dispatcher
        .dispatch(
            ControlMessage::new(
                60,
                ControlPayload::Signal(SignalRequest {
                    kind: SignalKind::Offer,
                    call_id: call_id.clone(),
                    target_id: ben,
                    payload: sdp.clone(),
                }),
            ),
            &mut anna_client.ctx,
        )
        .await;
    assert!(antwort.is_none(), "Signal-Relay erzeugt keine Antwort");

    let event = ben_client.naechstes_event();
    match event.payload {
        ControlPayload::SignalRelay(s) => {
            assert_eq!(s.kind, SignalKind::Offer);
            assert_eq!(s.call_id, call_id);
            assert_eq!(s.from_id, anna);
            assert_eq!(s.payload, sdp);
        }
        andere => panic!("Erwartet SignalRelay, war {:?}", andere),
    }

    // Ziel trennt sich: Kandidaten werden kommentarlos verworfen
    dispatcher
        .client_cleanup(&ben_client.ctx.verbindungs_id)
        .await;
    anna_client.leeren();
    let antwort = dispatcher
        .dispatch(
            ControlMessage::new(
                61,
                ControlPayload::Signal(SignalRequest {
                    kind: SignalKind::IceCandidate,
                    call_id,
                    target_id: ben,
                    payload: serde_json::json!({ "candidate": "..." }),
                }),
            ),
            &mut anna_client.ctx,
        )
        .await;
    assert!(antwort.is_none());
    anna_client.keine_events();
}

// ---------------------------------------------------------------------------
// Trennung waehrend eines aktiven Anrufs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn trennung_beendet_laufenden_anruf_nicht() {
    let state = test_state();
    let dispatcher = MessageDispatcher::neu(Arc::clone(&state));
    let anna = UserId::new();
    let ben = UserId::new();

    let mut anna_client = verbinden(&state);
    let mut ben_client = verbinden(&state);
    identifizieren(&dispatcher, &mut anna_client, anna).await;
    identifizieren(&dispatcher, &mut ben_client, ben).await;
    anna_client.leeren();
    ben_client.leeren();

    let call_id = anruf_aufbauen(&dispatcher, &mut anna_client, ben).await;
    dispatcher
        .dispatch(
            ControlMessage::new(
                70,
                ControlPayload::CallAccept(CallIdPayload {
                    call_id: call_id.clone(),
                }),
            ),
            &mut ben_client.ctx,
        )
        .await
        .unwrap();
    anna_client.leeren();

    // Ben trennt sich waehrend des aktiven Anrufs
    dispatcher
        .client_cleanup(&ben_client.ctx.verbindungs_id)
        .await;
    assert!(!state.registry.ist_online(&ben));

    // Der Anruf steht weiterhin in der Tabelle; Anna raeumt selbst auf
    assert_eq!(state.anrufe.anzahl(), 1);
    let antwort = dispatcher
        .dispatch(
            ControlMessage::new(71, ControlPayload::CallEnd(CallIdPayload { call_id })),
            &mut anna_client.ctx,
        )
        .await
        .unwrap();
    assert!(matches!(antwort.payload, ControlPayload::CallEnded(_)));
    assert_eq!(state.anrufe.anzahl(), 0);
}
