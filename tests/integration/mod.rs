//! Integration test suite for selfup
//!
//! These tests drive the public API against a local artifact server and a fake
//! installed executable in a temporary directory.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! RUST_LOG=selfup=debug cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **config**: Loading settings from TOML and wiring them into the workflow
//! - **upgrade**: Explicit upgrades, no-op upgrades and failure reporting
//! - **version_check**: Rate-limited update notifications

mod config;
mod upgrade;
mod version_check;
