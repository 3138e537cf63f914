//! plauderei-protocol – Wire-Protokoll fuer den Relay-Server
//!
//! Zwei Schichten:
//! - `control`: alle Steuerungsnachrichten (Chat, Praesenz, Anrufe) als
//!   typsichere Tagged Enums mit Request/Response-Zuordnung
//! - `wire`: Frame-Format fuer TCP (u32-BE Laengenpraefix + JSON)

pub mod control;
pub mod wire;

pub use control::{ControlMessage, ControlPayload, ErrorCode};
pub use wire::FrameCodec;
