//! Handler-Module des Message-Dispatchers

pub mod call_handler;
pub mod chat_handler;
pub mod presence_handler;
