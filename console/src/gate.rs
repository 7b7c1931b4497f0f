//! Confirmation gate.
//!
//! One pending-decision slot for the whole console. Every state-changing
//! request waits here until it is confirmed or cancelled; a newer request
//! replaces an older one.

use crate::region::RegionId;
use crate::types::{AlertId, CallerContext, ProductId, Role, UserId, UserStatus};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::fmt;

/// Account moderation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModerationAction {
    /// Temporarily disable
    Suspend,
    /// Permanently disable
    Ban,
    /// Lift a suspension or ban
    Activate,
}

impl ModerationAction {
    /// Status the account ends up in
    #[must_use]
    pub const fn target_status(self) -> UserStatus {
        match self {
            Self::Suspend => UserStatus::Suspended,
            Self::Ban => UserStatus::Banned,
            Self::Activate => UserStatus::Active,
        }
    }

    /// Whether a reason must accompany the request
    #[must_use]
    pub const fn requires_reason(self) -> bool {
        matches!(self, Self::Suspend | Self::Ban)
    }
}

/// Product moderation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductAction {
    /// Make purchasable again
    Activate,
    /// Hide from buyers
    Block,
    /// Soft-delete
    Delete,
}

impl ProductAction {
    /// Wire value
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::Block => "block",
            Self::Delete => "delete",
        }
    }
}

/// Custom platform fee change
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeeAdjustment {
    /// Override the platform fee, in percent (`5.0` = 5%)
    Set {
        /// Percentage in `0..=100`
        percent: f64,
    },
    /// Back to the platform default
    Reset,
}

impl FeeAdjustment {
    /// Fraction sent to the remote service; `None` resets
    #[must_use]
    pub fn as_fraction(self) -> Option<f64> {
        match self {
            Self::Set { percent } => Some(percent / 100.0),
            Self::Reset => None,
        }
    }
}

/// A not-yet-approved mutation
#[derive(Debug, Clone, PartialEq)]
pub enum PendingRequest {
    /// Assign a new role
    RoleChange {
        /// Target account
        user_id: UserId,
        /// Role at request time
        from_role: Role,
        /// Requested role
        to_role: Role,
    },
    /// Suspend, ban or reactivate
    Moderation {
        /// Target account
        user_id: UserId,
        /// What to do
        action: ModerationAction,
        /// Why
        reason: Option<String>,
    },
    /// Activate, block or delete a product
    ProductAction {
        /// Target product
        product_id: ProductId,
        /// What to do
        action: ProductAction,
    },
    /// Set or reset a custom fee
    FeeAdjustment {
        /// Target account
        user_id: UserId,
        /// New fee
        adjustment: FeeAdjustment,
    },
    /// Acknowledge a security alert
    AlertAck {
        /// Target alert
        alert_id: AlertId,
    },
    /// Block an address
    IpBlock {
        /// Address
        ip: String,
        /// Why
        reason: String,
        /// Days until the block lapses
        expires_in_days: Option<u32>,
    },
    /// Lift a block
    IpUnblock {
        /// Address
        ip: String,
    },
}

impl PendingRequest {
    /// Region that owns the target and refreshes after the mutation
    #[must_use]
    pub const fn region(&self) -> RegionId {
        match self {
            Self::RoleChange { .. } | Self::Moderation { .. } | Self::FeeAdjustment { .. } => {
                RegionId::Users
            },
            Self::ProductAction { .. } => RegionId::Products,
            Self::AlertAck { .. } | Self::IpBlock { .. } | Self::IpUnblock { .. } => {
                RegionId::Security
            },
        }
    }

    /// Short label for logs and metrics
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RoleChange { .. } => "role_change",
            Self::Moderation { .. } => "moderation",
            Self::ProductAction { .. } => "product_action",
            Self::FeeAdjustment { .. } => "fee_adjustment",
            Self::AlertAck { .. } => "alert_ack",
            Self::IpBlock { .. } => "ip_block",
            Self::IpUnblock { .. } => "ip_unblock",
        }
    }
}

impl fmt::Display for PendingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoleChange {
                user_id,
                from_role,
                to_role,
            } => write!(f, "change role of {user_id} from {from_role} to {to_role}"),
            Self::Moderation {
                user_id, action, ..
            } => write!(f, "{action:?} user {user_id}"),
            Self::ProductAction { product_id, action } => {
                write!(f, "{} product {product_id}", action.as_str())
            },
            Self::FeeAdjustment {
                user_id,
                adjustment: FeeAdjustment::Set { percent },
            } => write!(f, "set fee of {user_id} to {percent}%"),
            Self::FeeAdjustment {
                user_id,
                adjustment: FeeAdjustment::Reset,
            } => write!(f, "reset fee of {user_id}"),
            Self::AlertAck { alert_id } => write!(f, "acknowledge alert {alert_id}"),
            Self::IpBlock { ip, .. } => write!(f, "block {ip}"),
            Self::IpUnblock { ip } => write!(f, "unblock {ip}"),
        }
    }
}

/// A request approved by the caller, ready for its mutation actor
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmedRequest {
    /// What was approved
    pub request: PendingRequest,
    /// Who approved it
    pub caller_id: UserId,
    /// When
    pub confirmed_at: DateTime<Utc>,
}

/// The pending-decision slot
#[derive(Debug, Clone, Default)]
pub struct ConfirmationGate {
    pending: Option<PendingRequest>,
}

impl ConfirmationGate {
    /// Empty gate
    #[must_use]
    pub const fn new() -> Self {
        Self { pending: None }
    }

    /// The request awaiting a decision
    #[must_use]
    pub const fn pending(&self) -> Option<&PendingRequest> {
        self.pending.as_ref()
    }

    /// Whether a decision is awaited
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Surface a request; returns the one it replaced
    pub fn open(&mut self, request: PendingRequest) -> Option<PendingRequest> {
        self.pending.replace(request)
    }

    /// Approve the pending request on behalf of `caller`
    pub fn confirm(
        &mut self,
        caller: &CallerContext,
        now: DateTime<Utc>,
    ) -> Option<ConfirmedRequest> {
        self.pending.take().map(|request| ConfirmedRequest {
            request,
            caller_id: caller.id.clone(),
            confirmed_at: now,
        })
    }

    /// Discard the pending request; nothing else happens
    pub fn cancel(&mut self) -> Option<PendingRequest> {
        self.pending.take()
    }
}

/// One confirmed request as remembered by the console
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    /// Who confirmed
    pub caller_id: UserId,
    /// Kind of request
    pub kind: &'static str,
    /// Human-readable summary
    pub summary: String,
    /// When
    pub confirmed_at: DateTime<Utc>,
}

/// Bounded in-memory record of confirmed requests, oldest evicted first
#[derive(Debug, Clone)]
pub struct AuditTrail {
    entries: VecDeque<AuditEntry>,
    capacity: usize,
}

impl AuditTrail {
    /// Keep at most `capacity` entries; zero keeps none
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(256)),
            capacity,
        }
    }

    /// Record a confirmed request and log it under the `audit` target
    pub fn record(&mut self, confirmed: &ConfirmedRequest) {
        let entry = AuditEntry {
            caller_id: confirmed.caller_id.clone(),
            kind: confirmed.request.kind(),
            summary: confirmed.request.to_string(),
            confirmed_at: confirmed.confirmed_at,
        };

        tracing::info!(
            target: "audit",
            caller_id = %entry.caller_id,
            kind = entry.kind,
            summary = %entry.summary,
            confirmed_at = %entry.confirmed_at,
            "Request confirmed"
        );

        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Entries, oldest first
    pub fn entries(&self) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter()
    }

    /// Number of entries kept
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use admin_console_testing::test_time;

    fn block(ip: &str) -> PendingRequest {
        PendingRequest::IpBlock {
            ip: ip.to_string(),
            reason: "scanner".to_string(),
            expires_in_days: None,
        }
    }

    #[test]
    fn test_last_request_wins() {
        let mut gate = ConfirmationGate::new();
        assert_eq!(gate.open(block("10.0.0.1")), None);
        assert_eq!(gate.open(block("10.0.0.2")), Some(block("10.0.0.1")));
        assert_eq!(gate.pending(), Some(&block("10.0.0.2")));
    }

    #[test]
    fn test_confirm_carries_caller_and_time() {
        let mut gate = ConfirmationGate::new();
        gate.open(block("10.0.0.1"));

        let caller = CallerContext::new("admin-1", Role::Admin);
        let confirmed = gate.confirm(&caller, test_time());

        assert_eq!(
            confirmed,
            Some(ConfirmedRequest {
                request: block("10.0.0.1"),
                caller_id: UserId::new("admin-1"),
                confirmed_at: test_time(),
            })
        );
        assert!(!gate.is_pending());
    }

    #[test]
    fn test_confirm_without_pending_does_nothing() {
        let mut gate = ConfirmationGate::new();
        let caller = CallerContext::new("admin-1", Role::Admin);
        assert_eq!(gate.confirm(&caller, test_time()), None);
    }

    #[test]
    fn test_cancel_clears_slot() {
        let mut gate = ConfirmationGate::new();
        gate.open(block("10.0.0.1"));
        assert!(gate.cancel().is_some());
        assert!(gate.pending().is_none());
    }

    #[test]
    fn test_audit_trail_is_bounded() {
        let mut trail = AuditTrail::new(2);
        let caller = CallerContext::new("owner-1", Role::Owner);

        for ip in ["10.0.0.1", "10.0.0.2", "10.0.0.3"] {
            let mut gate = ConfirmationGate::new();
            gate.open(block(ip));
            if let Some(confirmed) = gate.confirm(&caller, test_time()) {
                trail.record(&confirmed);
            }
        }

        let summaries: Vec<_> = trail.entries().map(|e| e.summary.as_str()).collect();
        assert_eq!(summaries, vec!["block 10.0.0.2", "block 10.0.0.3"]);
    }

    #[test]
    fn test_fee_fraction() {
        assert_eq!(FeeAdjustment::Set { percent: 5.0 }.as_fraction(), Some(0.05));
        assert_eq!(FeeAdjustment::Reset.as_fraction(), None);
    }

    #[test]
    fn test_requests_route_to_owning_region() {
        assert_eq!(block("10.0.0.1").region(), RegionId::Security);
        assert_eq!(
            PendingRequest::ProductAction {
                product_id: ProductId::new("p-1"),
                action: ProductAction::Delete,
            }
            .region(),
            RegionId::Products
        );
    }
}
