//! Domain types for the admin console.

pub mod period;
pub mod records;
pub mod role;

pub use period::{PeriodBucket, PeriodFilter};
pub use records::{
    AlertId, AlertSeverity, BlockedIp, OrderId, OrderRecord, ProductId, ProductRecord,
    ProductStatus, SecurityAlert, SecuritySnapshot, SecurityStats, UserId, UserRecord, UserStatus,
};
pub use role::Role;

/// Who is operating the console.
///
/// Read-only for the reducer; it comes from the permission resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    /// Caller account id, recorded on every confirmed request
    pub id: UserId,
    /// Caller role
    pub role: Role,
}

impl CallerContext {
    /// Build a caller context
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: UserId::new(id),
            role,
        }
    }
}
