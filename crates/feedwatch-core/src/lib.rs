//! Feedwatch Core — shared abstractions.
//!
//! This crate defines the record shapes observed on the change feed and the
//! traits every other crate plugs into: the feed itself, checkpoint
//! persistence, record lookups, outbound transports and event handlers.
//! It contains no infrastructure code.

pub mod account;
pub mod checkpoint;
pub mod clock;
pub mod collection;
pub mod document;
pub mod error;
pub mod event;
pub mod feed;
pub mod handler;
pub mod repository;
pub mod transport;
