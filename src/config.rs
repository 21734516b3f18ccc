//! Server configuration parameters
//!
//! All tunable parameters for the TankAlarm server, plus the fixed flat-store
//! layout and collection capacities. Runtime values can be overridden before
//! the service is wired up; the store names and capacities are compile-time
//! constants because every backing file and in-memory buffer is sized by them.

use serde::{Deserialize, Serialize};

use crate::records::{clipped, ADDR_CAP};

// ───────────────────────────────────────────────────────────────
// Collection capacities (stack-allocated, never reallocated)
// ───────────────────────────────────────────────────────────────

/// Maximum tank reports held in memory and mirrored to the backing store.
pub const TANK_REPORT_CAP: usize = 50;
/// Maximum power-failure events held in memory.
pub const POWER_FAILURE_CAP: usize = 20;
/// Maximum recipients per notification list (daily and monthly each).
pub const RECIPIENT_CAP: usize = 8;
/// Maximum tracked (site, tank) ping entries.
pub const PING_CAP: usize = 16;

/// Name cap for the server/site identity strings.
pub const NAME_CAP: usize = 32;
/// Path cap for the data directory holding the flat stores.
pub const PATH_CAP: usize = 64;

// ───────────────────────────────────────────────────────────────
// Flat-store layout
// ───────────────────────────────────────────────────────────────

/// Fixed store names. One flat namespace, one line-oriented file per name.
pub mod stores {
    /// Shutdown/liveness marker — a single reason line.
    pub const SYSTEM_STATE: &str = "system_state";
    /// Encoded [`TankReport`](crate::records::TankReport) lines.
    pub const TANK_REPORTS: &str = "tank_reports_backup";
    /// Encoded [`PowerFailureEvent`](crate::records::PowerFailureEvent) lines.
    pub const POWER_FAILURES: &str = "power_failure_backup";
    /// Daily-report recipient addresses, one per line.
    pub const DAILY_EMAILS: &str = "daily_emails";
    /// Monthly-report recipient addresses, one per line.
    pub const MONTHLY_EMAILS: &str = "monthly_emails";
    /// Two lines: last daily send date, last monthly send date.
    pub const EMAIL_DATES: &str = "email_dates";
    /// Append-only advisory timestamp log. Never read back.
    pub const HEARTBEAT: &str = "heartbeat";
}

// ───────────────────────────────────────────────────────────────
// Runtime configuration
// ───────────────────────────────────────────────────────────────

/// Core server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    // --- Identity ---
    /// Human-readable server name (used in outbound message subjects).
    pub server_name: heapless::String<NAME_CAP>,
    /// Site label of the server itself (reported in recovery notices).
    pub site_name: heapless::String<NAME_CAP>,

    // --- Notifications ---
    /// Recipient seeded into both lists on first boot.
    pub default_recipient: heapless::String<ADDR_CAP>,
    /// Destination for forwarded alarm notices.
    pub alarm_recipient: heapless::String<ADDR_CAP>,
    /// Forward non-Normal tank reports to `alarm_recipient` as they arrive.
    pub forward_alarms: bool,

    // --- Report schedule ---
    /// Hour of day (0-23) for the daily report send.
    pub daily_report_hour: u8,
    /// Minute (0-59) for the daily report send.
    pub daily_report_minute: u8,
    /// Day of month (1-28) for the monthly summary send.
    pub monthly_report_day: u8,

    // --- Storage ---
    /// Directory for the flat stores (`TANKALARM_DATA` overrides at launch).
    pub data_dir: heapless::String<PATH_CAP>,

    // --- Timing ---
    /// Periodic full-snapshot interval (seconds).
    pub snapshot_interval_secs: u32,
    /// Main loop tick interval (milliseconds).
    pub tick_interval_ms: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            // Identity
            server_name: clipped("TankAlarm Server"),
            site_name: clipped("Main Office"),

            // Notifications (SMS-gateway address style)
            default_recipient: clipped("+15551234567@vtext.com"),
            alarm_recipient: clipped("+15551234567@vtext.com"),
            forward_alarms: true,

            // Report schedule
            daily_report_hour: 6, // 6 AM local
            daily_report_minute: 0,
            monthly_report_day: 1,

            // Storage
            data_dir: clipped("data"),

            // Timing
            snapshot_interval_secs: 300, // 5 min safety net
            tick_interval_ms: 1000,      // 1 Hz
        }
    }
}

impl ServerConfig {
    /// Validate field ranges. Rejects values that would wedge the schedule
    /// or corrupt the line-oriented stores.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_name.is_empty() {
            return Err(ConfigError::Invalid("server_name must not be empty"));
        }
        if self.site_name.is_empty() {
            return Err(ConfigError::Invalid("site_name must not be empty"));
        }
        if self.daily_report_hour > 23 {
            return Err(ConfigError::Invalid("daily_report_hour out of range (0-23)"));
        }
        if self.daily_report_minute > 59 {
            return Err(ConfigError::Invalid("daily_report_minute out of range (0-59)"));
        }
        if self.monthly_report_day == 0 || self.monthly_report_day > 28 {
            // Capped at 28 so the send day exists in every month.
            return Err(ConfigError::Invalid("monthly_report_day out of range (1-28)"));
        }
        if self.data_dir.is_empty() {
            return Err(ConfigError::Invalid("data_dir must not be empty"));
        }
        if self.snapshot_interval_secs < 10 {
            return Err(ConfigError::Invalid("snapshot_interval_secs below 10s"));
        }
        if !(100..=10_000).contains(&self.tick_interval_ms) {
            return Err(ConfigError::Invalid("tick_interval_ms out of range (100-10000)"));
        }
        for addr in [&self.default_recipient, &self.alarm_recipient] {
            if addr.contains(',') || addr.contains('\n') {
                // Addresses are stored one per line in a comma-delimited world.
                return Err(ConfigError::Invalid("recipient contains delimiter"));
            }
        }
        if self.forward_alarms && self.alarm_recipient.is_empty() {
            return Err(ConfigError::Invalid("forward_alarms set but alarm_recipient empty"));
        }
        Ok(())
    }
}

/// Errors from configuration validation.
#[derive(Debug)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    Invalid(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Invalid(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
