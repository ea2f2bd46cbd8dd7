//! Feedwatch Notifications.
//!
//! Turns change events into user and operator notifications: classify the
//! event, resolve the related account and instrument, render the message,
//! then pass it through the gate to a transport.

pub mod application;
pub mod domain;
