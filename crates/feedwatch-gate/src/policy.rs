//! Static per-channel send policy.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use feedwatch_format::digits::normalize_recipient;
use thiserror::Error;

/// Outbound delivery channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Text message.
    Sms,
    /// Email.
    Email,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sms => "sms",
            Self::Email => "email",
        })
    }
}

/// Operating mode of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendMode {
    /// Nothing is sent or previewed beyond a log line.
    #[default]
    Off,
    /// Messages are rendered and logged but never handed to a transport.
    DryRun,
    /// Messages are sent, subject to the remaining gate checks.
    Live,
}

impl SendMode {
    /// Returns `true` for [`SendMode::Live`].
    #[must_use]
    pub fn is_live(self) -> bool {
        self == Self::Live
    }
}

impl fmt::Display for SendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Off => "off",
            Self::DryRun => "dry-run",
            Self::Live => "live",
        })
    }
}

/// Unrecognised send mode.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown send mode: {0:?}")]
pub struct ParseSendModeError(pub String);

impl FromStr for SendMode {
    type Err = ParseSendModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "dry-run" | "dryrun" | "dry_run" => Ok(Self::DryRun),
            "live" => Ok(Self::Live),
            other => Err(ParseSendModeError(other.to_owned())),
        }
    }
}

/// Static send policy for one channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelPolicy {
    /// Operating mode.
    pub mode: SendMode,
    /// Explicit opt-in to live sends.
    pub allow_live: bool,
    /// Permit live sends outside the production environment.
    pub allow_non_production: bool,
    /// Normalized recipients allowed to receive user messages. Empty means
    /// any recipient.
    pub allowlist: BTreeSet<String>,
    /// Maximum attempts per trailing 60 seconds. Zero disables the limit.
    pub max_per_minute: u32,
}

impl ChannelPolicy {
    /// Builds an allowlist from raw entries, normalizing digits and dropping
    /// blanks.
    #[must_use]
    pub fn allowlist_from<I, S>(entries: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        entries
            .into_iter()
            .filter_map(|entry| normalize_recipient(entry.as_ref()))
            .collect()
    }

    /// Returns `true` if `recipient` (already normalized) may receive user
    /// messages under this policy.
    #[must_use]
    pub fn permits(&self, recipient: &str) -> bool {
        self.allowlist.is_empty() || self.allowlist.contains(recipient)
    }
}
