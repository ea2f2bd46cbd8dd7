//! Feedwatch Gate — decides whether an outbound send is permitted.
//!
//! The gate is a pure policy check over static configuration plus one piece
//! of mutable state: a per-channel sliding window of recent send attempts.

pub mod gate;
pub mod policy;
pub mod rate_limit;

pub use gate::{BlockReason, GateDecision, NotificationGate, Recipient};
pub use policy::{Channel, ChannelPolicy, ParseSendModeError, SendMode};
pub use rate_limit::SlidingWindowLimiter;
