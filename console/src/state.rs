//! Console state: four regions, the caller and the pending decision.

use crate::action::Tab;
use crate::config::ConsoleConfig;
use crate::error::ConsoleError;
use crate::gate::{AuditTrail, ConfirmationGate, ConfirmedRequest};
use crate::region::{Lifecycle, Region, RegionId, RegionStatus};
use crate::regions::{AutoRefresh, SecurityRegion};
use crate::types::{CallerContext, OrderRecord, PeriodFilter, ProductRecord, UserRecord};

/// A short message for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Human-readable text
    pub message: String,
    /// Use "not allowed" styling
    pub forbidden: bool,
}

impl From<&ConsoleError> for Notice {
    fn from(error: &ConsoleError) -> Self {
        Self {
            message: error.user_message(),
            forbidden: error.is_forbidden(),
        }
    }
}

/// Everything the console knows
#[derive(Debug, Clone)]
pub struct ConsoleState {
    /// Operating caller; never written by the reducer
    pub caller: CallerContext,
    /// Shared time window for users, products and orders
    pub period: PeriodFilter,
    /// Active tab
    pub tab: Tab,
    /// User directory
    pub users: Region<UserRecord>,
    /// Product catalog
    pub products: Region<ProductRecord>,
    /// Order ledger
    pub orders: Region<OrderRecord>,
    /// Security feed
    pub security: SecurityRegion,
    /// Pending decision
    pub gate: ConfirmationGate,
    /// Confirmed mutation in flight
    pub mutation_in_flight: Option<ConfirmedRequest>,
    /// Last rejection or failure
    pub notice: Option<Notice>,
    /// Recently confirmed requests
    pub audit: AuditTrail,
}

impl ConsoleState {
    /// State with default configuration
    #[must_use]
    pub fn new(caller: CallerContext) -> Self {
        Self::with_config(caller, &ConsoleConfig::default())
    }

    /// State sized by `config`
    #[must_use]
    pub fn with_config(caller: CallerContext, config: &ConsoleConfig) -> Self {
        let size = config.view.page_size;
        let window = config.view.page_window;
        let auto_refresh = AutoRefresh::new(
            config.security.auto_refresh,
            config.security.refresh_interval(),
        );

        Self {
            caller,
            period: PeriodFilter::default(),
            tab: Tab::default(),
            users: Region::new(size, window),
            products: Region::new(size, window),
            orders: Region::new(size, window),
            security: SecurityRegion::new(size, window, auto_refresh),
            gate: ConfirmationGate::new(),
            mutation_in_flight: None,
            notice: None,
            audit: AuditTrail::new(config.audit.capacity),
        }
    }

    /// Status of a region
    #[must_use]
    pub const fn status(&self, region: RegionId) -> RegionStatus {
        match region {
            RegionId::Users => self.users.status(),
            RegionId::Products => self.products.status(),
            RegionId::Orders => self.orders.status(),
            RegionId::Security => self.security.alerts.status(),
        }
    }

    /// Lifecycle handle of a region
    pub fn lifecycle_mut(&mut self, region: RegionId) -> &mut dyn Lifecycle {
        match region {
            RegionId::Users => &mut self.users,
            RegionId::Products => &mut self.products,
            RegionId::Orders => &mut self.orders,
            RegionId::Security => &mut self.security.alerts,
        }
    }

    /// Error of a region's last fetch
    #[must_use]
    pub const fn region_error(&self, region: RegionId) -> Option<&ConsoleError> {
        match region {
            RegionId::Users => self.users.error(),
            RegionId::Products => self.products.error(),
            RegionId::Orders => self.orders.error(),
            RegionId::Security => self.security.alerts.error(),
        }
    }

    /// Whether no region has a fetch or mutation in flight
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.mutation_in_flight.is_none()
            && RegionId::ALL.into_iter().all(|region| {
                !matches!(
                    self.status(region),
                    RegionStatus::Loading | RegionStatus::Saving
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn test_new_state_is_idle_everywhere() {
        let state = ConsoleState::new(CallerContext::new("admin-1", Role::Admin));
        for region in RegionId::ALL {
            assert_eq!(state.status(region), RegionStatus::Idle);
        }
        assert!(state.is_settled());
        assert!(!state.gate.is_pending());
        assert_eq!(state.period, PeriodFilter::Last30Days);
    }

    #[test]
    fn test_notice_from_error() {
        let notice = Notice::from(&ConsoleError::forbidden("Admins cannot assign owner"));
        assert!(notice.forbidden);
        assert!(notice.message.contains("Admins cannot assign owner"));
    }
}
