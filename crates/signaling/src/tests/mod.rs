//! Service-Tests des Signaling-Crates

mod dispatcher_tests;
