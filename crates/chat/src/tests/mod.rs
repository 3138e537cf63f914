//! Unit-Tests des Chat-Crates
