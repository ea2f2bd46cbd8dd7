//! Feedwatch Dispatcher — watches the account and transaction collections
//! and turns their changes into SMS and email notifications.
//!
//! The binary in `main.rs` reads [`config::DispatcherConfig`], builds an
//! [`app::Dispatcher`] and runs one watcher per collection until it receives
//! a termination signal.

pub mod app;
pub mod config;
pub mod error;
pub mod telemetry;
pub mod transport;
