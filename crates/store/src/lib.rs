//! plauderei-store – Nachrichten-Persistenz
//!
//! Der Kern konsumiert nur die schmale `MessageRepository`-Schnittstelle;
//! die konkrete Engine dahinter ist austauschbar. `MemoryStore` ist die
//! Referenz-Implementierung fuer Betrieb ohne externe Datenbank und fuer
//! Tests.

pub mod error;
pub mod memory;
pub mod models;
pub mod repository;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use models::{NachrichtRecord, NachrichtStatus, NeueNachricht};
pub use repository::MessageRepository;
