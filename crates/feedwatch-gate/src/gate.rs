//! The send-permission decision.

use std::sync::Arc;

use feedwatch_core::clock::Clock;
use feedwatch_format::digits::normalize_recipient;
use thiserror::Error;

use crate::policy::{Channel, ChannelPolicy, SendMode};
use crate::rate_limit::SlidingWindowLimiter;

/// Who a message is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient<'a> {
    /// An end user, identified by the raw address stored on their record.
    User(&'a str),
    /// The configured operator recipients. Not subject to the allowlist.
    Admin,
}

/// Why a send was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockReason {
    /// The channel is not in live mode.
    #[error("channel mode is {0}")]
    NotLive(SendMode),

    /// Live mode is set but live sends were not explicitly allowed.
    #[error("live sends are not allowed")]
    LiveNotAllowed,

    /// Not running in production and non-production sends are not allowed.
    #[error("live sends outside production are not allowed")]
    NonProduction,

    /// The recipient normalized to nothing.
    #[error("recipient is empty")]
    EmptyRecipient,

    /// The recipient is not on the allowlist.
    #[error("recipient {0} is not allowlisted")]
    NotAllowlisted(String),

    /// The channel's rate limit is exhausted.
    #[error("rate limit of {max} per minute reached")]
    RateLimited {
        /// Configured ceiling.
        max: u32,
    },
}

/// Outcome of [`NotificationGate::can_send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// The send may proceed. The attempt has already been counted.
    Allowed,
    /// The send must not proceed.
    Blocked(BlockReason),
}

impl GateDecision {
    /// Returns `true` for [`GateDecision::Allowed`].
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

#[derive(Debug)]
struct ChannelGate {
    policy: ChannelPolicy,
    limiter: SlidingWindowLimiter,
}

impl ChannelGate {
    fn new(policy: ChannelPolicy, clock: Arc<dyn Clock>) -> Self {
        let limiter = SlidingWindowLimiter::per_minute(policy.max_per_minute, clock);
        Self { policy, limiter }
    }
}

/// Per-channel send permission with process-local rate limiting.
#[derive(Debug)]
pub struct NotificationGate {
    production: bool,
    sms: ChannelGate,
    email: ChannelGate,
}

impl NotificationGate {
    /// Creates a gate. `production` reports whether the process runs in the
    /// designated production environment.
    #[must_use]
    pub fn new(
        production: bool,
        sms: ChannelPolicy,
        email: ChannelPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            production,
            sms: ChannelGate::new(sms, Arc::clone(&clock)),
            email: ChannelGate::new(email, clock),
        }
    }

    fn channel(&self, channel: Channel) -> &ChannelGate {
        match channel {
            Channel::Sms => &self.sms,
            Channel::Email => &self.email,
        }
    }

    /// Returns the policy configured for `channel`.
    #[must_use]
    pub fn policy(&self, channel: Channel) -> &ChannelPolicy {
        &self.channel(channel).policy
    }

    /// Returns the operating mode of `channel`.
    #[must_use]
    pub fn mode(&self, channel: Channel) -> SendMode {
        self.policy(channel).mode
    }

    /// Decides whether a message on `channel` to `recipient` may be sent now.
    ///
    /// Checks run in order and the first failure wins: live mode, the
    /// allow-live flag, the environment, the allowlist (user recipients
    /// only), then the rate limit. An allowed decision consumes one slot of
    /// the channel's window.
    pub fn can_send(&self, channel: Channel, recipient: Recipient<'_>) -> GateDecision {
        let gate = self.channel(channel);
        let policy = &gate.policy;

        if !policy.mode.is_live() {
            return GateDecision::Blocked(BlockReason::NotLive(policy.mode));
        }
        if !policy.allow_live {
            return GateDecision::Blocked(BlockReason::LiveNotAllowed);
        }
        if !self.production && !policy.allow_non_production {
            return GateDecision::Blocked(BlockReason::NonProduction);
        }
        if let Recipient::User(raw) = recipient {
            let Some(normalized) = normalize_recipient(raw) else {
                return GateDecision::Blocked(BlockReason::EmptyRecipient);
            };
            if !policy.permits(&normalized) {
                return GateDecision::Blocked(BlockReason::NotAllowlisted(normalized));
            }
        }
        if !gate.limiter.try_acquire() {
            return GateDecision::Blocked(BlockReason::RateLimited {
                max: gate.limiter.max(),
            });
        }
        GateDecision::Allowed
    }
}
