//! Canonical mappers.
//!
//! Raw rows from the remote service are translated here, once, at fetch
//! time. Gateway status codes never travel past this module.

use crate::service::wire::{
    RawAlert, RawBlockedIp, RawOrder, RawProduct, RawSecurityStats, RawUser, SecurityOverview,
};
use crate::types::{
    AlertId, AlertSeverity, BlockedIp, OrderId, OrderRecord, PeriodBucket, ProductId,
    ProductRecord, ProductStatus, Role, SecurityAlert, SecuritySnapshot, SecurityStats, UserId,
    UserRecord, UserStatus,
};
use chrono::{DateTime, Utc};
use std::fmt;

/// Closed order-status vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonicalStatus {
    /// Money captured
    Paid,
    /// Awaiting payment, or abandoned before payment
    Pending,
    /// Payment declined
    Refused,
    /// Money returned to the buyer
    Refunded,
    /// Disputed by the card holder
    Chargeback,
    /// A code no known gateway uses
    Unknown,
}

impl CanonicalStatus {
    /// Every canonical value
    pub const ALL: [Self; 6] = [
        Self::Paid,
        Self::Pending,
        Self::Refused,
        Self::Refunded,
        Self::Chargeback,
        Self::Unknown,
    ];

    /// Reduce a raw gateway code to the canonical vocabulary.
    ///
    /// Input is trimmed and case-folded. Absent or blank codes are pending.
    #[must_use]
    pub fn normalize(raw: Option<&str>) -> Self {
        let Some(code) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::Pending;
        };

        match code.to_ascii_lowercase().as_str() {
            "paid" | "approved" | "succeeded" | "success" | "complete" | "completed"
            | "confirmed" => Self::Paid,

            "pending" | "authorized" | "in_process" | "in_mediation" | "created"
            | "processing" | "waiting_payment" | "expired" | "cancelled" | "canceled"
            | "cancelled_by_user" | "timeout" | "expired_pix" | "abandoned" => Self::Pending,
            s if s.starts_with("requires_") => Self::Pending,

            "refused" | "failed" | "rejected" | "error" | "declined" | "card_declined"
            | "cc_rejected" => Self::Refused,

            "refunded" | "refund" | "partially_refunded" => Self::Refunded,

            "chargeback" | "dispute" | "disputed" | "chargedback" | "charged_back" => {
                Self::Chargeback
            },

            _ => Self::Unknown,
        }
    }

    /// Money captured
    #[must_use]
    pub const fn is_paid(self) -> bool {
        matches!(self, Self::Paid)
    }

    /// Still waiting
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Declined
    #[must_use]
    pub const fn is_refused(self) -> bool {
        matches!(self, Self::Refused)
    }

    /// Money moved and will not move again on its own
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Paid | Self::Refunded | Self::Chargeback)
    }

    /// Wire-style name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Pending => "pending",
            Self::Refused => "refused",
            Self::Refunded => "refunded",
            Self::Chargeback => "chargeback",
            Self::Unknown => "unknown",
        }
    }

    /// Display label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Paid => "Paid",
            Self::Pending => "Pending",
            Self::Refused => "Refused",
            Self::Refunded => "Refunded",
            Self::Chargeback => "Chargeback",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for CanonicalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a user row. Unrecognised roles are treated as the lowest rank.
#[must_use]
pub fn user(raw: RawUser) -> UserRecord {
    let role = raw.role.parse::<Role>().unwrap_or_else(|_| {
        tracing::warn!(user_id = %raw.user_id, role = %raw.role, "Unknown role, treating as user");
        Role::User
    });

    UserRecord {
        id: UserId::new(raw.user_id),
        name: raw.name.unwrap_or_default(),
        email: raw.email.unwrap_or_default(),
        role,
        registration_source: raw
            .registration_source
            .unwrap_or_else(|| "organic".to_string()),
        status: UserStatus::from_wire(raw.status.as_deref()),
        status_reason: raw.status_reason,
        custom_fee_rate: raw.custom_fee_rate,
        total_gmv: raw.total_gmv,
        total_fees: raw.total_fees,
        orders_count: raw.orders_count,
        created_at: raw.created_at,
    }
}

/// Map a product row
#[must_use]
pub fn product(raw: RawProduct) -> ProductRecord {
    ProductRecord {
        id: ProductId::new(raw.id),
        name: raw.name,
        status: ProductStatus::from_wire(raw.status.as_deref()),
        price: raw.price,
        total_gmv: raw.total_gmv,
        orders_count: raw.orders_count,
        owner_id: UserId::new(raw.user_id.unwrap_or_default()),
        owner_name: raw.vendor_name.unwrap_or_default(),
        created_at: raw.created_at,
    }
}

/// Map an order row, fixing its canonical status and age bucket
#[must_use]
pub fn order(raw: RawOrder, now: DateTime<Utc>) -> OrderRecord {
    OrderRecord {
        id: OrderId::new(raw.id),
        canonical_status: CanonicalStatus::normalize(raw.status.as_deref()),
        amount: raw.amount_cents,
        gateway: raw.gateway.unwrap_or_default(),
        product_name: raw.product_name.unwrap_or_default(),
        customer_email: raw.customer_email.unwrap_or_default(),
        created_at: raw.created_at,
        period_bucket: PeriodBucket::classify(raw.created_at, now),
    }
}

fn alert(raw: RawAlert) -> SecurityAlert {
    SecurityAlert {
        id: AlertId::new(raw.id),
        severity: AlertSeverity::from_wire(&raw.severity),
        alert_type: raw.alert_type,
        ip_address: raw.ip_address,
        message: raw.message.unwrap_or_default(),
        acknowledged: raw.acknowledged,
        created_at: raw.created_at,
    }
}

fn blocked_ip(raw: RawBlockedIp) -> BlockedIp {
    BlockedIp {
        ip_address: raw.ip_address,
        blocked_at: raw.blocked_at,
        reason: raw.reason,
        expires_at: raw.expires_at,
    }
}

const fn stats(raw: RawSecurityStats) -> SecurityStats {
    SecurityStats {
        critical_alerts_24h: raw.critical_alerts_24h,
        blocked_ips_active: raw.blocked_ips_active,
        brute_force_attempts: raw.brute_force_attempts,
        rate_limit_exceeded: raw.rate_limit_exceeded,
        unacknowledged_alerts: raw.unacknowledged_alerts,
    }
}

/// Map the security overview. Alerts come back newest first.
#[must_use]
pub fn security(raw: SecurityOverview) -> SecuritySnapshot {
    let mut alerts: Vec<_> = raw.alerts.into_iter().map(alert).collect();
    alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    SecuritySnapshot {
        alerts,
        blocked_ips: raw.blocked_ips.into_iter().map(blocked_ip).collect(),
        stats: stats(raw.stats),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use admin_console_testing::test_time;
    use chrono::Duration;

    #[test]
    fn test_canonical_values_map_to_themselves() {
        for status in CanonicalStatus::ALL {
            if status != CanonicalStatus::Unknown {
                assert_eq!(CanonicalStatus::normalize(Some(status.as_str())), status);
            }
        }
    }

    #[test]
    fn test_gateway_codes() {
        let cases = [
            ("approved", CanonicalStatus::Paid),
            ("succeeded", CanonicalStatus::Paid),
            ("in_process", CanonicalStatus::Pending),
            ("requires_payment_method", CanonicalStatus::Pending),
            ("expired", CanonicalStatus::Pending),
            ("cancelled", CanonicalStatus::Pending),
            ("cc_rejected", CanonicalStatus::Refused),
            ("declined", CanonicalStatus::Refused),
            ("charged_back", CanonicalStatus::Chargeback),
            ("partially_refunded", CanonicalStatus::Refunded),
        ];
        for (code, expected) in cases {
            assert_eq!(CanonicalStatus::normalize(Some(code)), expected, "{code}");
        }
    }

    #[test]
    fn test_blank_is_pending_and_junk_is_unknown() {
        assert_eq!(CanonicalStatus::normalize(None), CanonicalStatus::Pending);
        assert_eq!(CanonicalStatus::normalize(Some("")), CanonicalStatus::Pending);
        assert_eq!(CanonicalStatus::normalize(Some("   ")), CanonicalStatus::Pending);
        assert_eq!(
            CanonicalStatus::normalize(Some("xyz_unknown")),
            CanonicalStatus::Unknown
        );
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        assert_eq!(CanonicalStatus::normalize(Some("  PAID ")), CanonicalStatus::Paid);
        assert_eq!(CanonicalStatus::normalize(Some("Refused")), CanonicalStatus::Refused);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(CanonicalStatus::Paid.is_terminal());
        assert!(CanonicalStatus::Chargeback.is_terminal());
        assert!(!CanonicalStatus::Pending.is_terminal());
        assert!(!CanonicalStatus::Unknown.is_terminal());
    }

    #[test]
    fn test_order_mapping_sets_bucket() {
        let now = test_time();
        let record = order(
            RawOrder {
                id: "o-1".into(),
                status: Some("approved".into()),
                gateway: Some("mercadopago".into()),
                amount_cents: 9_700,
                product_name: None,
                customer_email: None,
                created_at: now - Duration::days(3),
            },
            now,
        );
        assert_eq!(record.canonical_status, CanonicalStatus::Paid);
        assert_eq!(record.period_bucket, PeriodBucket::ThisWeek);
    }

    #[test]
    fn test_unknown_role_is_lowest() {
        let record = user(RawUser {
            user_id: "u-1".into(),
            name: None,
            email: None,
            role: "superuser".into(),
            registration_source: None,
            status: Some("BANNED".into()),
            status_reason: Some("fraud".into()),
            custom_fee_rate: None,
            total_gmv: 0,
            total_fees: 0,
            orders_count: 0,
            created_at: test_time(),
        });
        assert_eq!(record.role, Role::User);
        assert_eq!(record.status, UserStatus::Banned);
    }
}
