//! Dispatcher configuration, read once from the process environment.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::FixedOffset;
use feedwatch_gate::{ChannelPolicy, SendMode};
use thiserror::Error;
use tracing::warn;

const DEFAULT_SMS_SENDER: &str = "20006000646";
const DEFAULT_SMTP_FROM: &str = "\"Notifier\" <no-reply@example.com>";
const DEFAULT_KAVENEGAR_BASE_URL: &str = "https://api.kavenegar.com";
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_BACKOFF_MS: u64 = 1500;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
/// Tehran, UTC+03:30.
const DEFAULT_DISPLAY_OFFSET_MINUTES: i32 = 210;

/// Invalid or missing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    #[error("{0} must be set")]
    Missing(&'static str),

    /// A variable could not be interpreted.
    #[error("{name} has invalid value {value:?}: {reason}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
        /// What was expected.
        reason: String,
    },
}

/// Where watchers persist their resume tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckpointBackend {
    /// The `stream_checkpoints` table.
    Postgres,
    /// One JSON file per stream in the given directory.
    File(PathBuf),
}

/// SMS provider credentials.
#[derive(Clone)]
pub struct KavenegarConfig {
    /// API key, embedded in the request path.
    pub api_key: String,
    /// Scheme and host of the provider API.
    pub base_url: String,
}

impl fmt::Debug for KavenegarConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KavenegarConfig")
            .field("api_key", &"****")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// SMTP relay settings.
#[derive(Clone)]
pub struct SmtpConfig {
    /// Relay host.
    pub host: String,
    /// Relay port. 465 uses implicit TLS, anything else STARTTLS.
    pub port: u16,
    /// Login user.
    pub username: String,
    /// Login password.
    pub password: String,
    /// `From` mailbox.
    pub from: String,
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"****")
            .field("from", &self.from)
            .finish()
    }
}

/// Immutable process configuration.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// `PostgreSQL` connection string.
    pub database_url: String,
    /// Pool size.
    pub database_max_connections: u32,
    /// Apply pending migrations at startup.
    pub database_migrate: bool,
    /// Running in the designated production environment.
    pub production: bool,
    /// SMS channel policy.
    pub sms: ChannelPolicy,
    /// Email channel policy.
    pub email: ChannelPolicy,
    /// Send the admin audit SMS.
    pub send_admin_sms: bool,
    /// SMS sender line.
    pub sms_sender: String,
    /// Operator phone numbers.
    pub admin_sms_recipients: Vec<String>,
    /// SMS provider; `None` disables SMS.
    pub kavenegar: Option<KavenegarConfig>,
    /// SMTP relay; `None` disables email.
    pub smtp: Option<SmtpConfig>,
    /// Operator email addresses.
    pub alert_to: Vec<String>,
    /// Ignore stored checkpoints at startup.
    pub watch_start_fresh: bool,
    /// Reconnect delay after a feed error.
    pub watch_backoff: Duration,
    /// Checkpoint persistence.
    pub checkpoint_backend: CheckpointBackend,
    /// Offset used when rendering dates in messages.
    pub display_offset: FixedOffset,
}

impl DispatcherConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`.
    ///
    /// Values are trimmed and blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value
    /// cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let database_url = env.get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let production = env
            .get_any(&["APP_ENV", "NODE_ENV"])
            .is_some_and(|v| v.eq_ignore_ascii_case("production"));

        let sms = ChannelPolicy {
            mode: env.send_mode("SMS_MODE", SendMode::Off),
            allow_live: env.flag("SMS_ALLOW_LIVE", false),
            allow_non_production: env.flag("SMS_ALLOW_NON_PROD", false),
            allowlist: ChannelPolicy::allowlist_from(env.list("SMS_ALLOWLIST")),
            max_per_minute: env.number("SMS_MAX_PER_MINUTE", 0)?,
        };
        let email = ChannelPolicy {
            mode: env.send_mode("EMAIL_MODE", SendMode::Live),
            allow_live: env.flag("EMAIL_ALLOW_LIVE", true),
            allow_non_production: env.flag("EMAIL_ALLOW_NON_PROD", true),
            max_per_minute: env.number("EMAIL_MAX_PER_MINUTE", 0)?,
            ..ChannelPolicy::default()
        };

        let kavenegar = env.get("KAVENEGAR_API_KEY").map(|api_key| KavenegarConfig {
            api_key,
            base_url: env
                .get("KAVENEGAR_BASE_URL")
                .unwrap_or_else(|| DEFAULT_KAVENEGAR_BASE_URL.to_owned()),
        });

        let smtp = match (env.get("SMTP_HOST"), env.get("SMTP_USER"), env.get("SMTP_PASS")) {
            (Some(host), Some(username), Some(password)) => Some(SmtpConfig {
                host,
                port: env.number("SMTP_PORT", DEFAULT_SMTP_PORT)?,
                username,
                password,
                from: env
                    .get("SMTP_FROM")
                    .unwrap_or_else(|| DEFAULT_SMTP_FROM.to_owned()),
            }),
            _ => None,
        };

        let checkpoint_backend = match env.get("CHECKPOINT_BACKEND") {
            None => CheckpointBackend::Postgres,
            Some(v) if v.eq_ignore_ascii_case("postgres") || v.eq_ignore_ascii_case("pg") => {
                CheckpointBackend::Postgres
            }
            Some(v) if v.eq_ignore_ascii_case("file") => CheckpointBackend::File(
                env.get("CHECKPOINT_DIR").map_or_else(|| PathBuf::from("."), PathBuf::from),
            ),
            Some(value) => {
                return Err(ConfigError::Invalid {
                    name: "CHECKPOINT_BACKEND",
                    value,
                    reason: "expected postgres or file".into(),
                });
            }
        };

        let offset_minutes: i32 =
            env.number("DISPLAY_UTC_OFFSET_MINUTES", DEFAULT_DISPLAY_OFFSET_MINUTES)?;
        let display_offset = offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| ConfigError::Invalid {
                name: "DISPLAY_UTC_OFFSET_MINUTES",
                value: offset_minutes.to_string(),
                reason: "offset must be within one day".into(),
            })?;

        Ok(Self {
            database_url,
            database_max_connections: env
                .number("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            database_migrate: env.flag("DATABASE_MIGRATE", false),
            production,
            sms,
            email,
            send_admin_sms: env.flag("SMS_SEND_ADMIN", true),
            sms_sender: env
                .get_any(&["SMS_SENDER", "KAVENEGAR_SENDER"])
                .unwrap_or_else(|| DEFAULT_SMS_SENDER.to_owned()),
            admin_sms_recipients: env
                .get_any(&["SMS_ADMIN_RECIPIENTS", "KAVENEGAR_RECEPTOR"])
                .map(|v| split_csv(&v))
                .unwrap_or_default(),
            kavenegar,
            smtp,
            alert_to: env.list("ALERT_TO"),
            watch_start_fresh: env.flag("WATCH_START_FRESH", false),
            watch_backoff: Duration::from_millis(env.number("WATCH_BACKOFF_MS", DEFAULT_BACKOFF_MS)?),
            checkpoint_backend,
            display_offset,
        })
    }
}

/// Parses a boolean flag. Unrecognised values yield `None`.
#[must_use]
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" | "enable" | "enabled" => Some(true),
        "0" | "false" | "no" | "n" | "off" | "disable" | "disabled" => Some(false),
        _ => None,
    }
}

/// Splits a comma-separated list, dropping blank entries.
#[must_use]
pub fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

struct Env<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
    }

    fn get_any(&self, names: &[&str]) -> Option<String> {
        names.iter().find_map(|name| self.get(name))
    }

    fn flag(&self, name: &str, default: bool) -> bool {
        self.get(name)
            .and_then(|v| parse_bool(&v))
            .unwrap_or(default)
    }

    fn list(&self, name: &str) -> Vec<String> {
        self.get(name).map(|v| split_csv(&v)).unwrap_or_default()
    }

    fn send_mode(&self, name: &str, default: SendMode) -> SendMode {
        match self.get(name) {
            None => default,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(variable = name, value = %raw, "unknown send mode; falling back to off");
                SendMode::Off
            }),
        }
    }

    fn number<T: std::str::FromStr>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T::Err: fmt::Display,
    {
        match self.get(name) {
            None => Ok(default),
            Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
                name,
                reason: e.to_string(),
                value,
            }),
        }
    }
}
