//! Every input the console reducer accepts.
//!
//! Presentation-layer events and the terminal events produced by actors
//! share one enum; the presentation layer only ever dispatches the former.

use crate::error::ConsoleError;
use crate::gate::{ConfirmedRequest, FeeAdjustment, ModerationAction, ProductAction};
use crate::region::{RegionId, RequestToken, ViewEvent};
use crate::types::{
    AlertId, OrderRecord, PeriodFilter, ProductId, ProductRecord, Role, SecurityAlert,
    SecuritySnapshot, UserId, UserRecord,
};

/// Console tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Tab {
    /// Headline numbers
    #[default]
    Overview,
    /// User directory
    Users,
    /// Product catalog
    Products,
    /// Order ledger
    Orders,
    /// Security feed
    Security,
}

impl Tab {
    /// Region shown by the tab, if any
    #[must_use]
    pub const fn region(self) -> Option<RegionId> {
        match self {
            Self::Overview => None,
            Self::Users => Some(RegionId::Users),
            Self::Products => Some(RegionId::Products),
            Self::Orders => Some(RegionId::Orders),
            Self::Security => Some(RegionId::Security),
        }
    }
}

/// Console action
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleAction {
    // Lifecycle
    /// Fetch every region and start the security auto refresh
    Load,
    /// Refetch one region; a no-op while it is busy
    Refresh {
        /// Region
        region: RegionId,
    },
    /// Refetch a region that failed
    Retry {
        /// Region
        region: RegionId,
    },
    /// Change the shared period; refetches the time-bucketed regions
    SetPeriod {
        /// New window
        period: PeriodFilter,
    },
    /// Switch tab
    ChangeTab {
        /// Tab
        tab: Tab,
    },

    // List views
    /// User list event
    Users(ViewEvent<UserRecord>),
    /// Product list event
    Products(ViewEvent<ProductRecord>),
    /// Order list event
    Orders(ViewEvent<OrderRecord>),
    /// Alert list event
    Security(ViewEvent<SecurityAlert>),

    // Requests (open the confirmation gate)
    /// Change a user's role
    RequestRoleChange {
        /// Target
        user_id: UserId,
        /// Role the caller saw
        from_role: Role,
        /// Requested role
        to_role: Role,
    },
    /// Suspend, ban or reactivate a user
    RequestModeration {
        /// Target
        user_id: UserId,
        /// What to do
        action: ModerationAction,
        /// Why
        reason: Option<String>,
    },
    /// Act on a product
    RequestProductAction {
        /// Target
        product_id: ProductId,
        /// What to do
        action: ProductAction,
    },
    /// Set or reset a user's custom fee
    RequestFeeAdjustment {
        /// Target
        user_id: UserId,
        /// New fee
        adjustment: FeeAdjustment,
    },
    /// Acknowledge an alert
    RequestAlertAck {
        /// Target
        alert_id: AlertId,
    },
    /// Block an address
    RequestIpBlock {
        /// Address
        ip: String,
        /// Why
        reason: Option<String>,
        /// Days until the block lapses
        expires_in_days: Option<u32>,
    },
    /// Lift a block
    RequestIpUnblock {
        /// Address
        ip: String,
    },
    /// Approve the pending request
    ConfirmPending,
    /// Discard the pending request
    CancelPending,

    // Security feed
    /// Switch periodic refresh on or off
    ToggleAutoRefresh,
    /// Periodic refresh tick
    AutoRefreshTick {
        /// Chain that scheduled the tick
        generation: u64,
    },

    /// Clear the notice
    DismissNotice,

    // Terminal events
    /// Users fetch finished
    UsersLoaded {
        /// Fetch tag
        token: RequestToken,
        /// Rows or failure
        result: Result<Vec<UserRecord>, ConsoleError>,
    },
    /// Products fetch finished
    ProductsLoaded {
        /// Fetch tag
        token: RequestToken,
        /// Rows or failure
        result: Result<Vec<ProductRecord>, ConsoleError>,
    },
    /// Orders fetch finished
    OrdersLoaded {
        /// Fetch tag
        token: RequestToken,
        /// Rows or failure
        result: Result<Vec<OrderRecord>, ConsoleError>,
    },
    /// Security fetch finished
    SecurityLoaded {
        /// Fetch tag
        token: RequestToken,
        /// Snapshot or failure
        result: Result<SecuritySnapshot, ConsoleError>,
    },
    /// A confirmed mutation finished
    MutationCompleted {
        /// What was run
        request: ConfirmedRequest,
        /// Outcome
        result: Result<(), ConsoleError>,
    },
}

impl ConsoleAction {
    /// Whether this is a fetch result for `region`
    #[must_use]
    pub const fn is_load_of(&self, region: RegionId) -> bool {
        matches!(
            (self, region),
            (Self::UsersLoaded { .. }, RegionId::Users)
                | (Self::ProductsLoaded { .. }, RegionId::Products)
                | (Self::OrdersLoaded { .. }, RegionId::Orders)
                | (Self::SecurityLoaded { .. }, RegionId::Security)
        )
    }

    /// Whether this is a terminal event produced by an actor
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::UsersLoaded { .. }
                | Self::ProductsLoaded { .. }
                | Self::OrdersLoaded { .. }
                | Self::SecurityLoaded { .. }
                | Self::MutationCompleted { .. }
        )
    }
}
