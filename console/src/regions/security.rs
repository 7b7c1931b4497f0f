//! Security region: alert feed, blocked addresses and counters.
//!
//! The alert list is a regular region; blocks and counters ride along with
//! every alert fetch and are replaced together with it.

use crate::error::ConsoleError;
use crate::region::{FetchOutcome, Region, RegionItem, RequestToken};
use crate::types::{AlertId, AlertSeverity, BlockedIp, SecurityAlert, SecuritySnapshot, SecurityStats};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::time::Duration;

/// Sortable alert columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertSortField {
    /// Raised at
    CreatedAt,
    /// Severity
    Severity,
}

/// Structured alert filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertFilter {
    /// Only this severity
    pub severity: Option<AlertSeverity>,
    /// Only this alert kind
    pub alert_type: Option<String>,
    /// Only acknowledged (`true`) or open (`false`) alerts
    pub acknowledged: Option<bool>,
}

fn alert_ip(alert: &SecurityAlert) -> &str {
    alert.ip_address.as_deref().unwrap_or_default()
}

fn alert_type(alert: &SecurityAlert) -> &str {
    &alert.alert_type
}

fn alert_message(alert: &SecurityAlert) -> &str {
    &alert.message
}

impl RegionItem for SecurityAlert {
    type Id = AlertId;
    type SortField = AlertSortField;
    type Filter = AlertFilter;

    const SEARCH_FIELDS: &'static [fn(&Self) -> &str] = &[alert_ip, alert_type, alert_message];
    const DEFAULT_SORT: AlertSortField = AlertSortField::CreatedAt;

    fn id(&self) -> &AlertId {
        &self.id
    }

    fn compare(a: &Self, b: &Self, field: AlertSortField) -> Ordering {
        match field {
            AlertSortField::CreatedAt => a.created_at.cmp(&b.created_at),
            AlertSortField::Severity => a.severity.cmp(&b.severity),
        }
    }

    fn matches(&self, filter: &AlertFilter) -> bool {
        filter.severity.is_none_or(|severity| self.severity == severity)
            && filter
                .alert_type
                .as_deref()
                .is_none_or(|kind| self.alert_type == kind)
            && filter
                .acknowledged
                .is_none_or(|acknowledged| self.acknowledged == acknowledged)
    }
}

/// Periodic refresh of the alert feed.
///
/// Every (re)start bumps the generation, so ticks scheduled by an older
/// chain are recognised and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoRefresh {
    enabled: bool,
    interval: Option<Duration>,
    generation: u64,
}

impl AutoRefresh {
    /// `interval` of `None` disables refreshing entirely
    #[must_use]
    pub const fn new(enabled: bool, interval: Option<Duration>) -> Self {
        Self {
            enabled,
            interval,
            generation: 0,
        }
    }

    /// Whether refreshing is switched on
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Current generation
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a new chain if enabled; returns its generation and interval
    pub fn start(&mut self) -> Option<(u64, Duration)> {
        if !self.enabled {
            return None;
        }
        let interval = self.interval?;
        self.generation += 1;
        Some((self.generation, interval))
    }

    /// Flip on/off. Turning on starts a new chain.
    pub fn toggle(&mut self) -> Option<(u64, Duration)> {
        self.enabled = !self.enabled;
        if self.enabled {
            self.start()
        } else {
            self.generation += 1;
            None
        }
    }

    /// Whether a tick of `generation` should still act
    #[must_use]
    pub const fn is_current(&self, generation: u64) -> bool {
        self.enabled && self.generation == generation
    }

    /// Interval for the next tick of the running chain
    #[must_use]
    pub const fn interval(&self) -> Option<Duration> {
        self.interval
    }
}

/// Security slice of console state
#[derive(Debug, Clone)]
pub struct SecurityRegion {
    /// Alert feed
    pub alerts: Region<SecurityAlert>,
    blocked_ips: Vec<BlockedIp>,
    stats: SecurityStats,
    /// Periodic refresh state
    pub auto_refresh: AutoRefresh,
}

impl SecurityRegion {
    /// Empty region
    #[must_use]
    pub fn new(page_size: usize, page_window: usize, auto_refresh: AutoRefresh) -> Self {
        Self {
            alerts: Region::new(page_size, page_window),
            blocked_ips: Vec::new(),
            stats: SecurityStats::default(),
            auto_refresh,
        }
    }

    /// Current blocks, as last loaded
    #[must_use]
    pub fn blocked_ips(&self) -> &[BlockedIp] {
        &self.blocked_ips
    }

    /// Blocks still in force at `now`
    pub fn active_blocks(&self, now: DateTime<Utc>) -> impl Iterator<Item = &BlockedIp> {
        self.blocked_ips.iter().filter(move |b| b.is_active(now))
    }

    /// Find a block by address
    #[must_use]
    pub fn find_block(&self, ip: &str) -> Option<&BlockedIp> {
        self.blocked_ips.iter().find(|b| b.ip_address == ip)
    }

    /// Headline counters, as last loaded
    #[must_use]
    pub const fn stats(&self) -> SecurityStats {
        self.stats
    }

    /// Apply a snapshot if it answers the latest request
    pub fn apply_fetch(
        &mut self,
        token: RequestToken,
        result: Result<SecuritySnapshot, ConsoleError>,
    ) -> FetchOutcome {
        if !self.alerts.is_current(token) {
            return FetchOutcome::Stale;
        }

        let alerts = result.map(|snapshot| {
            self.blocked_ips = snapshot.blocked_ips;
            self.stats = snapshot.stats;
            snapshot.alerts
        });
        self.alerts.apply_fetch(token, alerts)
    }
}
