//! Gemeinsamer Server-Zustand fuer den Signaling-Service
//!
//! Haelt alle geteilten Services und Zustands-Manager als Arc-Referenzen,
//! die sicher zwischen tokio-Tasks geteilt werden koennen.

use plauderei_call::CallRegister;
use plauderei_chat::NachrichtenService;
use plauderei_store::MessageRepository;
use std::sync::Arc;

use crate::presence::PresencePublisher;
use crate::registry::ConnectionRegistry;

/// Konfiguration fuer den Signaling-Service
#[derive(Debug, Clone)]
pub struct SignalingConfig {
    /// Anzeigename des Servers
    pub server_name: String,
    /// Maximale gleichzeitige Verbindungen
    pub max_clients: u32,
    /// Keepalive-Intervall in Sekunden
    pub keepalive_sek: u64,
    /// Timeout fuer inaktive Verbindungen in Sekunden
    pub verbindungs_timeout_sek: u64,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            server_name: "Plauderei Server".to_string(),
            max_clients: 512,
            keepalive_sek: 30,
            verbindungs_timeout_sek: 90,
        }
    }
}

/// Gemeinsamer Server-Zustand (thread-safe, Arc-geteilt)
pub struct SignalingState<R: MessageRepository + 'static> {
    /// Server-Konfiguration
    pub config: Arc<SignalingConfig>,
    /// Nachrichten-Service (Validierung, Persistierung, Status)
    pub nachrichten: Arc<NachrichtenService<R>>,
    /// Tabelle der laufenden Anrufversuche
    pub anrufe: CallRegister,
    /// Verbindungs-Registry (Send-Queues, Benutzer-Index)
    pub registry: ConnectionRegistry,
    /// Praesenz-Verteilung
    pub presence: PresencePublisher,
}

impl<R: MessageRepository + 'static> SignalingState<R> {
    /// Erstellt einen neuen SignalingState
    pub fn neu(config: SignalingConfig, nachrichten: Arc<NachrichtenService<R>>) -> Arc<Self> {
        let registry = ConnectionRegistry::neu();
        let presence = PresencePublisher::neu(registry.clone());
        Arc::new(Self {
            config: Arc::new(config),
            nachrichten,
            anrufe: CallRegister::neu(),
            registry,
            presence,
        })
    }
}
