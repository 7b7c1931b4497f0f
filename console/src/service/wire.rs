//! JSON shapes exchanged with the remote data service.
//!
//! These are raw: statuses are gateway strings, roles are free text. The
//! mapper turns them into domain records before the reducer sees them.

use crate::types::{PeriodFilter, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user row from `admin-data/users-with-metrics`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawUser {
    /// Account id
    pub user_id: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// E-mail
    #[serde(default)]
    pub email: Option<String>,
    /// Role name
    pub role: String,
    /// Signup source
    #[serde(default)]
    pub registration_source: Option<String>,
    /// Moderation status
    #[serde(default)]
    pub status: Option<String>,
    /// Moderation reason
    #[serde(default)]
    pub status_reason: Option<String>,
    /// Custom fee as a fraction
    #[serde(default)]
    pub custom_fee_rate: Option<f64>,
    /// GMV in cents
    #[serde(default)]
    pub total_gmv: i64,
    /// Fees in cents
    #[serde(default)]
    pub total_fees: i64,
    /// Paid orders
    #[serde(default)]
    pub orders_count: u32,
    /// Signup time
    pub created_at: DateTime<Utc>,
}

/// A product row from `admin-data/products-with-metrics`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawProduct {
    /// Product id
    pub id: String,
    /// Name
    pub name: String,
    /// Price in cents
    #[serde(default)]
    pub price: i64,
    /// Lifecycle status
    #[serde(default)]
    pub status: Option<String>,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Seller id
    #[serde(default)]
    pub user_id: Option<String>,
    /// Seller name
    #[serde(default)]
    pub vendor_name: Option<String>,
    /// GMV in cents for the requested period
    #[serde(default)]
    pub total_gmv: i64,
    /// Paid orders for the requested period
    #[serde(default)]
    pub orders_count: u32,
}

/// An order row from `admin-data/orders-list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawOrder {
    /// Order id
    pub id: String,
    /// Gateway-specific status code
    #[serde(default)]
    pub status: Option<String>,
    /// Gateway name
    #[serde(default)]
    pub gateway: Option<String>,
    /// Amount in cents
    pub amount_cents: i64,
    /// Product bought
    #[serde(default)]
    pub product_name: Option<String>,
    /// Buyer e-mail
    #[serde(default)]
    pub customer_email: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// An alert row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAlert {
    /// Alert id
    pub id: String,
    /// Severity name
    pub severity: String,
    /// Alert kind
    pub alert_type: String,
    /// Source address
    #[serde(default)]
    pub ip_address: Option<String>,
    /// Description
    #[serde(default)]
    pub message: Option<String>,
    /// Acknowledged flag
    #[serde(default)]
    pub acknowledged: bool,
    /// Raised at
    pub created_at: DateTime<Utc>,
}

/// A blocked address row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBlockedIp {
    /// Address
    pub ip_address: String,
    /// Reason
    #[serde(default)]
    pub reason: Option<String>,
    /// Blocked at
    pub blocked_at: DateTime<Utc>,
    /// Expiry
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Security counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawSecurityStats {
    /// Critical alerts in the last 24 hours
    pub critical_alerts_24h: u32,
    /// Active blocks
    #[serde(rename = "blockedIPsActive")]
    pub blocked_ips_active: u32,
    /// Brute-force attempts
    pub brute_force_attempts: u32,
    /// Rate-limit hits
    pub rate_limit_exceeded: u32,
    /// Unacknowledged alerts
    pub unacknowledged_alerts: u32,
}

/// Body of `admin-data/users-with-metrics`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsersResponse {
    /// Rows
    #[serde(default)]
    pub users: Vec<RawUser>,
}

/// Body of `admin-data/products-with-metrics`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductsResponse {
    /// Rows
    #[serde(default)]
    pub products: Vec<RawProduct>,
}

/// Body of `admin-data/orders-list`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrdersResponse {
    /// Rows
    #[serde(default)]
    pub orders: Vec<RawOrder>,
}

/// Body of `admin-data/security-overview`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityOverview {
    /// Alerts
    #[serde(default)]
    pub alerts: Vec<RawAlert>,
    /// Blocks
    #[serde(default, rename = "blockedIPs")]
    pub blocked_ips: Vec<RawBlockedIp>,
    /// Counters
    #[serde(default)]
    pub stats: RawSecurityStats,
}

/// Envelope every mutation endpoint answers with
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MutationAck {
    /// Error message when the remote service refused the request
    #[serde(default)]
    pub error: Option<String>,
    /// Error code accompanying `error`
    #[serde(default)]
    pub code: Option<String>,
}

/// Period parameters attached to time-bucketed queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodQuery {
    /// Window name
    pub period: &'static str,
    /// Custom range start
    #[serde(rename = "startDate", skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    /// Custom range end
    #[serde(rename = "endDate", skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

impl From<&PeriodFilter> for PeriodQuery {
    fn from(period: &PeriodFilter) -> Self {
        let (start, end) = match *period {
            PeriodFilter::Custom { start, end } => (Some(start), Some(end)),
            _ => (None, None),
        };
        Self {
            period: period.as_wire(),
            start,
            end,
        }
    }
}

/// Requests accepted by the `admin-data` function
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum AdminDataRequest {
    /// List users with sales aggregates for a period
    UsersWithMetrics(PeriodQuery),
    /// List products with aggregates for a period
    ProductsWithMetrics(PeriodQuery),
    /// List orders for a period
    OrdersList(PeriodQuery),
    /// Alerts, blocks and counters in one response
    SecurityOverview,
}

/// Body of `manage-user-role`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleChangeBody {
    /// Account to change
    pub target_user_id: String,
    /// Role to assign
    pub new_role: Role,
}

/// Bodies of `manage-user-status`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum UserStatusBody {
    /// Suspend, ban or reactivate an account
    UpdateStatus {
        /// Account
        #[serde(rename = "userId")]
        user_id: String,
        /// `active`, `suspended` or `banned`
        status: &'static str,
        /// Reason, required for suspend and ban
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    /// Set or clear a custom platform fee
    UpdateCustomFee {
        /// Account
        #[serde(rename = "userId")]
        user_id: String,
        /// Fee as a fraction; `null` resets to the platform default
        #[serde(rename = "feePercent")]
        fee_percent: Option<f64>,
    },
}

/// Body of `admin-product-management`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductActionBody {
    /// `activate`, `block` or `delete`
    pub action: &'static str,
    /// Product
    pub product_id: String,
}

/// Bodies of `security-management`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum SecurityActionBody {
    /// Mark an alert as seen
    AcknowledgeAlert {
        /// Alert
        #[serde(rename = "alertId")]
        alert_id: String,
    },
    /// Deny an address
    BlockIp {
        /// Address
        #[serde(rename = "ipAddress")]
        ip_address: String,
        /// Reason
        reason: String,
        /// Days until the block lapses; absent is permanent
        #[serde(rename = "expiresInDays", skip_serializing_if = "Option::is_none")]
        expires_in_days: Option<u32>,
    },
    /// Lift a block
    UnblockIp {
        /// Address
        #[serde(rename = "ipAddress")]
        ip_address: String,
    },
}
