//! Records mirrored from the remote data service.
//!
//! None of these are created or destroyed client-side; they are replaced
//! wholesale on every successful fetch.

use super::period::PeriodBucket;
use super::role::Role;
use crate::mapper::CanonicalStatus;
use chrono::{DateTime, Utc};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw identifier
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Account identifier
    UserId
);
string_id!(
    /// Product identifier
    ProductId
);
string_id!(
    /// Order identifier
    OrderId
);
string_id!(
    /// Security alert identifier
    AlertId
);

/// Moderation status of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserStatus {
    /// Normal account
    Active,
    /// Temporarily disabled
    Suspended,
    /// Permanently disabled
    Banned,
}

impl UserStatus {
    /// Parse a wire value; anything unrecognised counts as active
    #[must_use]
    pub fn from_wire(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("suspended") => Self::Suspended,
            Some("banned") => Self::Banned,
            _ => Self::Active,
        }
    }

    /// Wire value
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Banned => "banned",
        }
    }
}

/// A platform account with its sales aggregates
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    /// Account id
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Login e-mail
    pub email: String,
    /// Current role
    pub role: Role,
    /// Where the account signed up (`organic`, `affiliate`, ...)
    pub registration_source: String,
    /// Moderation status
    pub status: UserStatus,
    /// Reason recorded with the last suspension or ban
    pub status_reason: Option<String>,
    /// Custom platform fee as a fraction (`0.05` = 5%)
    pub custom_fee_rate: Option<f64>,
    /// Gross merchandise value in cents
    pub total_gmv: i64,
    /// Platform fees collected in cents
    pub total_fees: i64,
    /// Number of paid orders
    pub orders_count: u32,
    /// Signup time
    pub created_at: DateTime<Utc>,
}

/// Lifecycle status of a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductStatus {
    /// Visible and purchasable
    Active,
    /// Hidden by moderation
    Blocked,
    /// Soft-deleted
    Deleted,
}

impl ProductStatus {
    /// Parse a wire value; absent or unknown values count as active
    #[must_use]
    pub fn from_wire(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("blocked") => Self::Blocked,
            Some("deleted") => Self::Deleted,
            _ => Self::Active,
        }
    }

    /// Wire value
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Blocked => "blocked",
            Self::Deleted => "deleted",
        }
    }
}

/// A product with its sales aggregates for the selected period
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    /// Product id
    pub id: ProductId,
    /// Product name
    pub name: String,
    /// Lifecycle status
    pub status: ProductStatus,
    /// Price in cents
    pub price: i64,
    /// Gross merchandise value in cents within the period
    pub total_gmv: i64,
    /// Paid orders within the period
    pub orders_count: u32,
    /// Seller account
    pub owner_id: UserId,
    /// Seller display name
    pub owner_name: String,
    /// Creation time, when known
    pub created_at: Option<DateTime<Utc>>,
}

/// An order with its status already reduced to the canonical vocabulary
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    /// Order id
    pub id: OrderId,
    /// Canonical status
    pub canonical_status: CanonicalStatus,
    /// Amount in cents
    pub amount: i64,
    /// Payment gateway that processed the order
    pub gateway: String,
    /// Product bought
    pub product_name: String,
    /// Buyer e-mail
    pub customer_email: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Age bucket computed at fetch time
    pub period_bucket: PeriodBucket,
}

/// Severity of a security alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AlertSeverity {
    /// Informational
    Low,
    /// Worth a look
    Medium,
    /// Needs attention
    High,
    /// Needs attention now
    Critical,
}

impl AlertSeverity {
    /// Parse a wire value; unknown values are treated as low
    #[must_use]
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "critical" => Self::Critical,
            "high" => Self::High,
            "medium" | "warning" => Self::Medium,
            _ => Self::Low,
        }
    }

    /// Wire value
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// One entry of the security alert feed
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityAlert {
    /// Alert id
    pub id: AlertId,
    /// Severity
    pub severity: AlertSeverity,
    /// Kind of alert (`brute_force`, `rate_limit`, ...)
    pub alert_type: String,
    /// Source address, when the alert has one
    pub ip_address: Option<String>,
    /// Free-text description
    pub message: String,
    /// Whether staff already acknowledged it
    pub acknowledged: bool,
    /// When the alert was raised
    pub created_at: DateTime<Utc>,
}

/// An address denied access
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockedIp {
    /// The blocked address
    pub ip_address: String,
    /// When the block started
    pub blocked_at: DateTime<Utc>,
    /// Why it was blocked
    pub reason: Option<String>,
    /// When the block lapses; `None` is permanent
    pub expires_at: Option<DateTime<Utc>>,
}

impl BlockedIp {
    /// Whether the block is still in force at `now`
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|expires| expires > now)
    }
}

/// Headline counters of the security feed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SecurityStats {
    /// Critical alerts raised in the last 24 hours
    pub critical_alerts_24h: u32,
    /// Blocks currently in force
    pub blocked_ips_active: u32,
    /// Brute-force attempts detected
    pub brute_force_attempts: u32,
    /// Requests rejected by rate limiting
    pub rate_limit_exceeded: u32,
    /// Alerts nobody acknowledged yet
    pub unacknowledged_alerts: u32,
}

/// Everything the security region loads in one call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecuritySnapshot {
    /// Alert feed, newest first
    pub alerts: Vec<SecurityAlert>,
    /// Current blocks
    pub blocked_ips: Vec<BlockedIp>,
    /// Headline counters
    pub stats: SecurityStats,
}
