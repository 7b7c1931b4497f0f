//! Remote data service.
//!
//! The console talks to its backend only through [`DataService`]. Each
//! method is exactly one remote call. [`HttpDataService`] is the production
//! implementation; [`MockDataService`] serves tests and demos from memory.

pub mod http;
pub mod mock;
pub mod wire;

use crate::error::ConsoleError;
use futures::future::BoxFuture;

pub use http::HttpDataService;
pub use mock::{MockDataService, Operation, ServiceCall};
pub use wire::{
    PeriodQuery, ProductActionBody, RawAlert, RawBlockedIp, RawOrder, RawProduct, RawUser,
    RoleChangeBody, SecurityActionBody, SecurityOverview, UserStatusBody,
};

/// Boxed future returned by every service call
pub type ServiceFuture<T> = BoxFuture<'static, Result<T, ConsoleError>>;

/// Remote data service.
///
/// Implementations convert every transport problem into a [`ConsoleError`];
/// callers never see a raw transport error.
pub trait DataService: Send + Sync {
    /// Users with sales aggregates for the period
    fn list_users(&self, period: PeriodQuery) -> ServiceFuture<Vec<RawUser>>;

    /// Products with sales aggregates for the period
    fn list_products(&self, period: PeriodQuery) -> ServiceFuture<Vec<RawProduct>>;

    /// Orders created within the period
    fn list_orders(&self, period: PeriodQuery) -> ServiceFuture<Vec<RawOrder>>;

    /// Alerts, blocks and counters
    fn security_overview(&self) -> ServiceFuture<SecurityOverview>;

    /// Assign a role
    fn change_role(&self, body: RoleChangeBody) -> ServiceFuture<()>;

    /// Change moderation status or custom fee
    fn update_user(&self, body: UserStatusBody) -> ServiceFuture<()>;

    /// Activate, block or delete a product
    fn product_action(&self, body: ProductActionBody) -> ServiceFuture<()>;

    /// Acknowledge alerts, block or unblock addresses
    fn security_action(&self, body: SecurityActionBody) -> ServiceFuture<()>;
}
