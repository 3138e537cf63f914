//! plauderei-server – Bibliotheks-Root
//!
//! Deklariert die Server-Module und stellt den oeffentlichen Einstiegspunkt
//! fuer Integrationstests bereit.

pub mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use config::ServerConfig;
use plauderei_chat::NachrichtenService;
use plauderei_signaling::{SignalingServer, SignalingState};
use plauderei_store::MemoryStore;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle Server-Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Nachrichten-Speicher anlegen
    /// 2. Signaling-Zustand aufbauen (Registry, Praesenz, Anruf-Tabelle)
    /// 3. TCP-Listener starten (Control-Protokoll)
    /// 4. Auf Ctrl-C warten und Shutdown an alle Verbindungen signalisieren
    pub async fn starten(self) -> Result<()> {
        let bind_addr: SocketAddr = self
            .config
            .tcp_bind_adresse()
            .parse()
            .with_context(|| format!("Ungueltige Bind-Adresse '{}'", self.config.tcp_bind_adresse()))?;

        tracing::info!(
            server_name = %self.config.server.name,
            tcp = %bind_addr,
            max_clients = self.config.server.max_clients,
            "Server startet"
        );

        let store = Arc::new(MemoryStore::new());
        let nachrichten = NachrichtenService::neu(store);
        let state = SignalingState::neu(self.config.signaling_config(), nachrichten);

        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

        // Ctrl-C loest den Shutdown aus; alle Verbindungs-Tasks lauschen
        // auf denselben watch-Kanal
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(fehler = %e, "Ctrl-C-Handler fehlgeschlagen");
                return;
            }
            tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
            let _ = shutdown_tx.send(true);
        });

        let server = SignalingServer::neu(state, bind_addr);
        server
            .starten(shutdown_rx)
            .await
            .context("Signaling-Server abgebrochen")?;

        tracing::info!("Server beendet");
        Ok(())
    }
}
