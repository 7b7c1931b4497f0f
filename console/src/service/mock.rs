//! In-memory data service for tests and demos.
//!
//! Serves raw rows from memory, applies mutations to them, and records every
//! call it receives. Failures and latency can be scripted per operation.

use super::wire::{
    PeriodQuery, ProductActionBody, RawAlert, RawBlockedIp, RawOrder, RawProduct, RawUser,
    RoleChangeBody, SecurityActionBody, SecurityOverview, UserStatusBody,
};
use super::{DataService, ServiceFuture};
use crate::error::ConsoleError;
use chrono::{DateTime, Duration as Days, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Service operations, one per trait method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `list_users`
    ListUsers,
    /// `list_products`
    ListProducts,
    /// `list_orders`
    ListOrders,
    /// `security_overview`
    SecurityOverview,
    /// `change_role`
    ChangeRole,
    /// `update_user`
    UpdateUser,
    /// `product_action`
    ProductAction,
    /// `security_action`
    SecurityAction,
}

/// A recorded call with its payload
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceCall {
    /// Users listed
    ListUsers(PeriodQuery),
    /// Products listed
    ListProducts(PeriodQuery),
    /// Orders listed
    ListOrders(PeriodQuery),
    /// Security overview fetched
    SecurityOverview,
    /// Role changed
    ChangeRole(RoleChangeBody),
    /// Status or fee changed
    UpdateUser(UserStatusBody),
    /// Product acted on
    ProductAction(ProductActionBody),
    /// Security action
    SecurityAction(SecurityActionBody),
}

impl ServiceCall {
    /// Operation this call belongs to
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::ListUsers(_) => Operation::ListUsers,
            Self::ListProducts(_) => Operation::ListProducts,
            Self::ListOrders(_) => Operation::ListOrders,
            Self::SecurityOverview => Operation::SecurityOverview,
            Self::ChangeRole(_) => Operation::ChangeRole,
            Self::UpdateUser(_) => Operation::UpdateUser,
            Self::ProductAction(_) => Operation::ProductAction,
            Self::SecurityAction(_) => Operation::SecurityAction,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    users: Vec<RawUser>,
    products: Vec<RawProduct>,
    orders: Vec<RawOrder>,
    orders_by_period: HashMap<&'static str, Vec<RawOrder>>,
    alerts: Vec<RawAlert>,
    blocked_ips: Vec<RawBlockedIp>,
    calls: Vec<ServiceCall>,
    failures: HashMap<Operation, VecDeque<ConsoleError>>,
    delays: HashMap<Operation, VecDeque<Duration>>,
    now: Option<DateTime<Utc>>,
}

impl Inner {
    fn user_mut(&mut self, id: &str) -> Result<&mut RawUser, ConsoleError> {
        self.users
            .iter_mut()
            .find(|u| u.user_id == id)
            .ok_or_else(|| ConsoleError::not_found(format!("User {id} not found")))
    }

    fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    fn security(&self) -> SecurityOverview {
        let now = self.now();
        let mut overview = SecurityOverview {
            alerts: self.alerts.clone(),
            blocked_ips: self.blocked_ips.clone(),
            ..SecurityOverview::default()
        };
        let stats = &mut overview.stats;
        stats.unacknowledged_alerts = count(self.alerts.iter().filter(|a| !a.acknowledged));
        stats.critical_alerts_24h = count(self.alerts.iter().filter(|a| {
            a.severity.eq_ignore_ascii_case("critical") && now - a.created_at <= Days::hours(24)
        }));
        stats.brute_force_attempts =
            count(self.alerts.iter().filter(|a| a.alert_type == "brute_force"));
        stats.rate_limit_exceeded =
            count(self.alerts.iter().filter(|a| a.alert_type == "rate_limit"));
        stats.blocked_ips_active = count(
            self.blocked_ips
                .iter()
                .filter(|b| b.expires_at.is_none_or(|expires| expires > now)),
        );
        overview
    }

    fn apply(&mut self, call: &ServiceCall) -> Result<(), ConsoleError> {
        match call {
            ServiceCall::ChangeRole(body) => {
                self.user_mut(&body.target_user_id)?.role = body.new_role.as_str().to_string();
            },
            ServiceCall::UpdateUser(UserStatusBody::UpdateStatus {
                user_id,
                status,
                reason,
            }) => {
                let user = self.user_mut(user_id)?;
                user.status = Some((*status).to_string());
                user.status_reason.clone_from(reason);
            },
            ServiceCall::UpdateUser(UserStatusBody::UpdateCustomFee {
                user_id,
                fee_percent,
            }) => {
                self.user_mut(user_id)?.custom_fee_rate = *fee_percent;
            },
            ServiceCall::ProductAction(body) => {
                let product = self
                    .products
                    .iter_mut()
                    .find(|p| p.id == body.product_id)
                    .ok_or_else(|| {
                        ConsoleError::not_found(format!("Product {} not found", body.product_id))
                    })?;
                let status = match body.action {
                    "block" => "blocked",
                    "delete" => "deleted",
                    _ => "active",
                };
                product.status = Some(status.to_string());
            },
            ServiceCall::SecurityAction(SecurityActionBody::AcknowledgeAlert { alert_id }) => {
                let alert = self
                    .alerts
                    .iter_mut()
                    .find(|a| a.id == *alert_id)
                    .ok_or_else(|| ConsoleError::not_found(format!("Alert {alert_id} not found")))?;
                alert.acknowledged = true;
            },
            ServiceCall::SecurityAction(SecurityActionBody::BlockIp {
                ip_address,
                reason,
                expires_in_days,
            }) => {
                let now = self.now();
                self.blocked_ips.retain(|b| b.ip_address != *ip_address);
                self.blocked_ips.push(RawBlockedIp {
                    ip_address: ip_address.clone(),
                    reason: Some(reason.clone()),
                    blocked_at: now,
                    expires_at: expires_in_days.map(|days| now + Days::days(i64::from(days))),
                });
            },
            ServiceCall::SecurityAction(SecurityActionBody::UnblockIp { ip_address }) => {
                let before = self.blocked_ips.len();
                self.blocked_ips.retain(|b| b.ip_address != *ip_address);
                if self.blocked_ips.len() == before {
                    return Err(ConsoleError::not_found(format!(
                        "{ip_address} is not blocked"
                    )));
                }
            },
            ServiceCall::ListUsers(_)
            | ServiceCall::ListProducts(_)
            | ServiceCall::ListOrders(_)
            | ServiceCall::SecurityOverview => {},
        }
        Ok(())
    }
}

fn count<T>(iter: impl Iterator<Item = T>) -> u32 {
    u32::try_from(iter.count()).unwrap_or(u32::MAX)
}

/// In-memory [`DataService`]
///
/// Cloning shares the same data and call log. Results are computed and
/// mutations applied when the call is issued; a scripted delay only holds
/// back the response.
#[derive(Debug, Clone, Default)]
pub struct MockDataService {
    inner: Arc<Mutex<Inner>>,
}

impl MockDataService {
    /// Empty service
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed users
    #[must_use]
    pub fn with_users(self, users: Vec<RawUser>) -> Self {
        self.lock().users = users;
        self
    }

    /// Seed products
    #[must_use]
    pub fn with_products(self, products: Vec<RawProduct>) -> Self {
        self.lock().products = products;
        self
    }

    /// Seed orders returned for any period without a specific list
    #[must_use]
    pub fn with_orders(self, orders: Vec<RawOrder>) -> Self {
        self.lock().orders = orders;
        self
    }

    /// Seed orders returned for one period name (`"7days"`, `"today"`, ...)
    #[must_use]
    pub fn with_period_orders(self, period: &'static str, orders: Vec<RawOrder>) -> Self {
        self.lock().orders_by_period.insert(period, orders);
        self
    }

    /// Seed alerts
    #[must_use]
    pub fn with_alerts(self, alerts: Vec<RawAlert>) -> Self {
        self.lock().alerts = alerts;
        self
    }

    /// Seed blocked addresses
    #[must_use]
    pub fn with_blocked_ips(self, blocked_ips: Vec<RawBlockedIp>) -> Self {
        self.lock().blocked_ips = blocked_ips;
        self
    }

    /// Pin the time used for new blocks and 24h counters
    #[must_use]
    pub fn with_now(self, now: DateTime<Utc>) -> Self {
        self.lock().now = Some(now);
        self
    }

    /// Make the next call of `operation` fail with `error`
    pub fn fail_next(&self, operation: Operation, error: ConsoleError) {
        self.lock()
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Hold back the response of the next call of `operation`
    pub fn delay_next(&self, operation: Operation, delay: Duration) {
        self.lock()
            .delays
            .entry(operation)
            .or_default()
            .push_back(delay);
    }

    /// Every call received, in order
    #[must_use]
    pub fn calls(&self) -> Vec<ServiceCall> {
        self.lock().calls.clone()
    }

    /// Calls of one operation, in order
    #[must_use]
    pub fn calls_to(&self, operation: Operation) -> Vec<ServiceCall> {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.operation() == operation)
            .cloned()
            .collect()
    }

    /// Current users, including applied mutations
    #[must_use]
    pub fn users(&self) -> Vec<RawUser> {
        self.lock().users.clone()
    }

    /// Current products, including applied mutations
    #[must_use]
    pub fn products(&self) -> Vec<RawProduct> {
        self.lock().products.clone()
    }

    fn respond<T, F>(&self, call: ServiceCall, read: F) -> ServiceFuture<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Inner) -> Result<T, ConsoleError>,
    {
        let (result, delay) = {
            let mut inner = self.lock();
            let operation = call.operation();
            let delay = inner
                .delays
                .get_mut(&operation)
                .and_then(VecDeque::pop_front);
            let failure = inner
                .failures
                .get_mut(&operation)
                .and_then(VecDeque::pop_front);

            let result = match failure {
                Some(error) => Err(error),
                None => inner.apply(&call).and_then(|()| read(&mut *inner)),
            };
            inner.calls.push(call);
            (result, delay)
        };

        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            result
        })
    }
}

impl DataService for MockDataService {
    fn list_users(&self, period: PeriodQuery) -> ServiceFuture<Vec<RawUser>> {
        self.respond(ServiceCall::ListUsers(period), |inner| Ok(inner.users.clone()))
    }

    fn list_products(&self, period: PeriodQuery) -> ServiceFuture<Vec<RawProduct>> {
        self.respond(ServiceCall::ListProducts(period), |inner| {
            Ok(inner.products.clone())
        })
    }

    fn list_orders(&self, period: PeriodQuery) -> ServiceFuture<Vec<RawOrder>> {
        let name = period.period;
        self.respond(ServiceCall::ListOrders(period), move |inner| {
            Ok(inner
                .orders_by_period
                .get(name)
                .unwrap_or(&inner.orders)
                .clone())
        })
    }

    fn security_overview(&self) -> ServiceFuture<SecurityOverview> {
        self.respond(ServiceCall::SecurityOverview, |inner| Ok(inner.security()))
    }

    fn change_role(&self, body: RoleChangeBody) -> ServiceFuture<()> {
        self.respond(ServiceCall::ChangeRole(body), |_| Ok(()))
    }

    fn update_user(&self, body: UserStatusBody) -> ServiceFuture<()> {
        self.respond(ServiceCall::UpdateUser(body), |_| Ok(()))
    }

    fn product_action(&self, body: ProductActionBody) -> ServiceFuture<()> {
        self.respond(ServiceCall::ProductAction(body), |_| Ok(()))
    }

    fn security_action(&self, body: SecurityActionBody) -> ServiceFuture<()> {
        self.respond(ServiceCall::SecurityAction(body), |_| Ok(()))
    }
}
