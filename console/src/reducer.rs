//! The console reducer.
//!
//! Single entry point for every action. It routes view events to their
//! region, runs requests through the guard before they may open the
//! confirmation gate, and turns fetches and confirmed mutations into actor
//! effects. Actor results come back as terminal actions.

use crate::action::ConsoleAction;
use crate::actors;
use crate::environment::ConsoleEnvironment;
use crate::error::ConsoleError;
use crate::gate::{FeeAdjustment, PendingRequest, ProductAction};
use crate::guard;
use crate::region::{FetchOutcome, Region, RegionId, RegionItem, RegionStatus, RequestToken};
use crate::state::{ConsoleState, Notice};
use crate::types::{PeriodFilter, ProductStatus};
use admin_console_core::effect::Effect;
use admin_console_core::reducer::Reducer;
use admin_console_core::{smallvec, SmallVec};
use std::net::IpAddr;


type Effects = SmallVec<[Effect<ConsoleAction>; 4]>;

/// Reducer for [`ConsoleState`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReducer;

impl ConsoleReducer {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Effect running the load actor of `region`, tagged with `token`
    fn fetch(
        state: &ConsoleState,
        region: RegionId,
        token: RequestToken,
        env: &ConsoleEnvironment,
    ) -> Effect<ConsoleAction> {
        metrics::counter!("console.fetch.started", "region" => region.as_str()).increment(1);
        tracing::debug!(%region, token = token.value(), "Fetch started");

        let service = env.service.clone();
        let period = state.period;

        match region {
            RegionId::Users => Effect::run(async move {
                ConsoleAction::UsersLoaded {
                    token,
                    result: actors::load_users(service, period).await,
                }
            }),
            RegionId::Products => Effect::run(async move {
                ConsoleAction::ProductsLoaded {
                    token,
                    result: actors::load_products(service, period).await,
                }
            }),
            RegionId::Orders => {
                let now = env.clock.now();
                Effect::run(async move {
                    ConsoleAction::OrdersLoaded {
                        token,
                        result: actors::load_orders(service, period, now).await,
                    }
                })
            },
            RegionId::Security => Effect::run(async move {
                ConsoleAction::SecurityLoaded {
                    token,
                    result: actors::load_security(service).await,
                }
            }),
        }
    }

    /// Start a fetch unless the region is busy
    fn start_fetch(
        state: &mut ConsoleState,
        region: RegionId,
        env: &ConsoleEnvironment,
    ) -> Effect<ConsoleAction> {
        let token = state.lifecycle_mut(region).begin_fetch();
        match token {
            Some(token) => Self::fetch(state, region, token, env),
            None => {
                tracing::debug!(%region, status = ?state.status(region), "Fetch already running, ignored");
                Effect::None
            },
        }
    }

    fn schedule_tick(generation: u64, interval: std::time::Duration) -> Effect<ConsoleAction> {
        Effect::Delay {
            duration: interval,
            action: Box::new(ConsoleAction::AutoRefreshTick { generation }),
        }
    }

    /// Record a rejected request
    fn reject(state: &mut ConsoleState, error: &ConsoleError) -> Effects {
        if error.is_forbidden() {
            metrics::counter!("console.guard.forbidden").increment(1);
        }
        tracing::warn!(caller_id = %state.caller.id, %error, "Request rejected");
        state.notice = Some(Notice::from(error));
        smallvec![Effect::None]
    }

    fn log_outcome(state: &ConsoleState, region: RegionId, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::Stale => {
                metrics::counter!("console.fetch.stale_discarded", "region" => region.as_str())
                    .increment(1);
                tracing::debug!(%region, "Stale response discarded");
            },
            FetchOutcome::Applied => match state.region_error(region) {
                Some(error) => tracing::warn!(%region, %error, "Fetch failed"),
                None => tracing::debug!(%region, "Fetch applied"),
            },
        }
    }

    fn loaded_region(state: &ConsoleState, region: RegionId) -> Result<(), ConsoleError> {
        let ready = match region {
            RegionId::Users => state.users.accepts_local_events(),
            RegionId::Products => state.products.accepts_local_events(),
            RegionId::Orders => state.orders.accepts_local_events(),
            RegionId::Security => state.security.alerts.accepts_local_events(),
        };
        if ready {
            Ok(())
        } else {
            Err(ConsoleError::validation(format!(
                "The {region} list is not loaded yet"
            )))
        }
    }

    fn find_in<'a, T: RegionItem>(
        region: &'a Region<T>,
        id: &T::Id,
        what: &str,
    ) -> Result<&'a T, ConsoleError> {
        if id.to_string().trim().is_empty() {
            return Err(ConsoleError::validation(format!("No {what} selected")));
        }
        region
            .find(id)
            .ok_or_else(|| ConsoleError::not_found(format!("{what} {id} no longer exists")))
    }

    fn required_text(value: Option<String>, what: &str) -> Result<String, ConsoleError> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConsoleError::validation(format!("A {what} is required")))
    }

    /// Turn a request action into a pending request, or say why not
    #[allow(clippy::too_many_lines)]
    fn build_request(
        state: &ConsoleState,
        action: ConsoleAction,
        env: &ConsoleEnvironment,
    ) -> Result<PendingRequest, ConsoleError> {
        let caller = state.caller.role;
        guard::require_staff(caller)?;

        match action {
            ConsoleAction::RequestRoleChange {
                user_id,
                from_role,
                to_role,
            } => {
                Self::loaded_region(state, RegionId::Users)?;
                let user = Self::find_in(&state.users, &user_id, "user")?;
                if user.role != from_role {
                    return Err(ConsoleError::validation(format!(
                        "{} is now {}, not {}",
                        user.name,
                        user.role.label(),
                        from_role.label()
                    )));
                }
                guard::check_role_change(caller, user.role, to_role)?;
                Ok(PendingRequest::RoleChange {
                    user_id,
                    from_role,
                    to_role,
                })
            },
            ConsoleAction::RequestModeration {
                user_id,
                action,
                reason,
            } => {
                Self::loaded_region(state, RegionId::Users)?;
                let user = Self::find_in(&state.users, &user_id, "user")?;
                guard::require_below(caller, user.role)?;
                let reason = if action.requires_reason() {
                    Some(Self::required_text(reason, "reason")?)
                } else {
                    reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty())
                };
                if user.status == action.target_status() {
                    return Err(ConsoleError::validation(format!(
                        "{} is already {}",
                        user.name,
                        user.status.as_str()
                    )));
                }
                Ok(PendingRequest::Moderation {
                    user_id,
                    action,
                    reason,
                })
            },
            ConsoleAction::RequestFeeAdjustment {
                user_id,
                adjustment,
            } => {
                Self::loaded_region(state, RegionId::Users)?;
                let user = Self::find_in(&state.users, &user_id, "user")?;
                guard::require_below(caller, user.role)?;
                if let FeeAdjustment::Set { percent } = adjustment {
                    if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
                        return Err(ConsoleError::validation(
                            "Fee must be a percentage between 0 and 100",
                        ));
                    }
                }
                Ok(PendingRequest::FeeAdjustment {
                    user_id,
                    adjustment,
                })
            },
            ConsoleAction::RequestProductAction { product_id, action } => {
                Self::loaded_region(state, RegionId::Products)?;
                let product = Self::find_in(&state.products, &product_id, "product")?;
                let target = match action {
                    ProductAction::Activate => ProductStatus::Active,
                    ProductAction::Block => ProductStatus::Blocked,
                    ProductAction::Delete => ProductStatus::Deleted,
                };
                if product.status == target {
                    return Err(ConsoleError::validation(format!(
                        "{} is already {}",
                        product.name,
                        target.as_str()
                    )));
                }
                Ok(PendingRequest::ProductAction { product_id, action })
            },
            ConsoleAction::RequestAlertAck { alert_id } => {
                Self::loaded_region(state, RegionId::Security)?;
                let alert = Self::find_in(&state.security.alerts, &alert_id, "alert")?;
                if alert.acknowledged {
                    return Err(ConsoleError::validation(format!(
                        "Alert {alert_id} is already acknowledged"
                    )));
                }
                Ok(PendingRequest::AlertAck { alert_id })
            },
            ConsoleAction::RequestIpBlock {
                ip,
                reason,
                expires_in_days,
            } => {
                Self::loaded_region(state, RegionId::Security)?;
                let ip = ip.trim().to_string();
                if ip.parse::<IpAddr>().is_err() {
                    return Err(ConsoleError::validation(format!(
                        "'{ip}' is not a valid IP address"
                    )));
                }
                let reason = Self::required_text(reason, "reason")?;
                if expires_in_days == Some(0) {
                    return Err(ConsoleError::validation("A block must last at least one day"));
                }
                let now = env.clock.now();
                if state
                    .security
                    .find_block(&ip)
                    .is_some_and(|block| block.is_active(now))
                {
                    return Err(ConsoleError::validation(format!("{ip} is already blocked")));
                }
                Ok(PendingRequest::IpBlock {
                    ip,
                    reason,
                    expires_in_days,
                })
            },
            ConsoleAction::RequestIpUnblock { ip } => {
                Self::loaded_region(state, RegionId::Security)?;
                let ip = ip.trim().to_string();
                if state.security.find_block(&ip).is_none() {
                    return Err(ConsoleError::not_found(format!("{ip} is not blocked")));
                }
                Ok(PendingRequest::IpUnblock { ip })
            },
            other => Err(ConsoleError::validation(format!(
                "{other:?} is not a request"
            ))),
        }
    }

    /// Whether the target of `request` is still loaded
    fn target_exists(state: &ConsoleState, request: &PendingRequest) -> bool {
        match request {
            PendingRequest::RoleChange { user_id, .. }
            | PendingRequest::Moderation { user_id, .. }
            | PendingRequest::FeeAdjustment { user_id, .. } => state.users.find(user_id).is_some(),
            PendingRequest::ProductAction { product_id, .. } => {
                state.products.find(product_id).is_some()
            },
            PendingRequest::AlertAck { alert_id } => state.security.alerts.find(alert_id).is_some(),
            PendingRequest::IpBlock { .. } => true,
            PendingRequest::IpUnblock { ip } => state.security.find_block(ip).is_some(),
        }
    }

    fn confirm(state: &mut ConsoleState, env: &ConsoleEnvironment) -> Effects {
        let Some(pending) = state.gate.pending() else {
            tracing::debug!("Nothing to confirm");
            return smallvec![Effect::None];
        };
        let region = pending.region();

        if state.mutation_in_flight.is_some() {
            state.notice = Some(Notice::from(&ConsoleError::validation(
                "Another change is still being saved",
            )));
            return smallvec![Effect::None];
        }
        if state.status(region) != RegionStatus::Ready {
            state.notice = Some(Notice::from(&ConsoleError::validation(format!(
                "The {region} list is busy, try again in a moment"
            ))));
            return smallvec![Effect::None];
        }
        if !Self::target_exists(state, pending) {
            let error = ConsoleError::not_found(format!("The target of '{pending}' no longer exists"));
            state.gate.cancel();
            return Self::reject(state, &error);
        }

        let Some(confirmed) = state.gate.confirm(&state.caller, env.clock.now()) else {
            return smallvec![Effect::None];
        };
        metrics::counter!("console.gate.confirmed", "kind" => confirmed.request.kind()).increment(1);
        state.audit.record(&confirmed);
        state.lifecycle_mut(region).begin_mutation();
        state.mutation_in_flight = Some(confirmed.clone());
        state.notice = None;

        let service = env.service.clone();
        smallvec![Effect::run(async move {
            let result = actors::run_mutation(service, confirmed.clone()).await;
            ConsoleAction::MutationCompleted {
                request: confirmed,
                result,
            }
        })]
    }

    fn set_period(
        state: &mut ConsoleState,
        period: PeriodFilter,
        env: &ConsoleEnvironment,
    ) -> Effects {
        if let PeriodFilter::Custom { start, end } = period {
            if let Err(error) = PeriodFilter::custom(start, end) {
                return Self::reject(state, &error);
            }
        }
        if state.period == period {
            return smallvec![Effect::None];
        }
        tracing::debug!(from = %state.period, to = %period, "Period changed");
        state.period = period;

        let mut effects = Effects::new();
        for region in RegionId::PERIOD_BOUND {
            match state.status(region) {
                RegionStatus::Loading | RegionStatus::Ready | RegionStatus::Error => {
                    let token = state.lifecycle_mut(region).supersede_fetch();
                    effects.push(Self::fetch(state, region, token, env));
                },
                // Saving regions refetch once the mutation settles,
                // whichever way it ends
                RegionStatus::Saving => state.lifecycle_mut(region).invalidate_while_saving(),
                // Idle regions load with the new period on Load
                RegionStatus::Idle => {},
            }
        }
        if effects.is_empty() {
            effects.push(Effect::None);
        }
        effects
    }
}

impl Reducer for ConsoleReducer {
    type State = ConsoleState;
    type Action = ConsoleAction;
    type Environment = ConsoleEnvironment;

    #[allow(clippy::too_many_lines)]
    fn reduce(
        &self,
        state: &mut ConsoleState,
        action: ConsoleAction,
        env: &ConsoleEnvironment,
    ) -> Effects {
        match action {
            ConsoleAction::Load => {
                let mut effects: Effects = RegionId::ALL
                    .into_iter()
                    .map(|region| Self::start_fetch(state, region, env))
                    .collect();
                if let Some((generation, interval)) = state.security.auto_refresh.start() {
                    effects.push(Self::schedule_tick(generation, interval));
                }
                effects
            },

            ConsoleAction::Refresh { region } => smallvec![Self::start_fetch(state, region, env)],

            ConsoleAction::Retry { region } => {
                let token = state.lifecycle_mut(region).retry();
                match token {
                    Some(token) => smallvec![Self::fetch(state, region, token, env)],
                    None => smallvec![Effect::None],
                }
            },

            ConsoleAction::SetPeriod { period } => Self::set_period(state, period, env),

            ConsoleAction::ChangeTab { tab } => {
                state.tab = tab;
                smallvec![Effect::None]
            },

            ConsoleAction::Users(event) => {
                if !state.users.apply_view(event) {
                    tracing::debug!(region = %RegionId::Users, "View event ignored while not loaded");
                }
                smallvec![Effect::None]
            },
            ConsoleAction::Products(event) => {
                if !state.products.apply_view(event) {
                    tracing::debug!(region = %RegionId::Products, "View event ignored while not loaded");
                }
                smallvec![Effect::None]
            },
            ConsoleAction::Orders(event) => {
                if !state.orders.apply_view(event) {
                    tracing::debug!(region = %RegionId::Orders, "View event ignored while not loaded");
                }
                smallvec![Effect::None]
            },
            ConsoleAction::Security(event) => {
                if !state.security.alerts.apply_view(event) {
                    tracing::debug!(region = %RegionId::Security, "View event ignored while not loaded");
                }
                smallvec![Effect::None]
            },

            request @ (ConsoleAction::RequestRoleChange { .. }
            | ConsoleAction::RequestModeration { .. }
            | ConsoleAction::RequestProductAction { .. }
            | ConsoleAction::RequestFeeAdjustment { .. }
            | ConsoleAction::RequestAlertAck { .. }
            | ConsoleAction::RequestIpBlock { .. }
            | ConsoleAction::RequestIpUnblock { .. }) => {
                match Self::build_request(state, request, env) {
                    Ok(pending) => {
                        metrics::counter!("console.gate.opened", "kind" => pending.kind())
                            .increment(1);
                        tracing::debug!(request = %pending, "Awaiting confirmation");
                        if let Some(replaced) = state.gate.open(pending) {
                            tracing::debug!(request = %replaced, "Pending request replaced");
                        }
                        state.notice = None;
                        smallvec![Effect::None]
                    },
                    Err(error) => Self::reject(state, &error),
                }
            },

            ConsoleAction::ConfirmPending => Self::confirm(state, env),

            ConsoleAction::CancelPending => {
                if let Some(cancelled) = state.gate.cancel() {
                    metrics::counter!("console.gate.cancelled").increment(1);
                    tracing::debug!(request = %cancelled, "Pending request cancelled");
                }
                smallvec![Effect::None]
            },

            ConsoleAction::ToggleAutoRefresh => {
                match state.security.auto_refresh.toggle() {
                    Some((generation, interval)) => {
                        tracing::debug!(generation, "Security auto refresh on");
                        smallvec![Self::schedule_tick(generation, interval)]
                    },
                    None => {
                        tracing::debug!("Security auto refresh off");
                        smallvec![Effect::None]
                    },
                }
            },

            ConsoleAction::AutoRefreshTick { generation } => {
                if !state.security.auto_refresh.is_current(generation) {
                    tracing::debug!(generation, "Tick from a stopped refresh chain dropped");
                    return smallvec![Effect::None];
                }
                let fetch = Self::start_fetch(state, RegionId::Security, env);
                match state.security.auto_refresh.interval() {
                    Some(interval) => smallvec![fetch, Self::schedule_tick(generation, interval)],
                    None => smallvec![fetch],
                }
            },

            ConsoleAction::DismissNotice => {
                state.notice = None;
                smallvec![Effect::None]
            },

            ConsoleAction::UsersLoaded { token, result } => {
                let caller = state.caller.role;
                let visible = result.map(|users| {
                    users
                        .into_iter()
                        .filter(|user| guard::visible_to(caller, user.role))
                        .collect()
                });
                let outcome = state.users.apply_fetch(token, visible);
                Self::log_outcome(state, RegionId::Users, outcome);
                smallvec![Effect::None]
            },
            ConsoleAction::ProductsLoaded { token, result } => {
                let outcome = state.products.apply_fetch(token, result);
                Self::log_outcome(state, RegionId::Products, outcome);
                smallvec![Effect::None]
            },
            ConsoleAction::OrdersLoaded { token, result } => {
                let outcome = state.orders.apply_fetch(token, result);
                Self::log_outcome(state, RegionId::Orders, outcome);
                smallvec![Effect::None]
            },
            ConsoleAction::SecurityLoaded { token, result } => {
                let outcome = state.security.apply_fetch(token, result);
                Self::log_outcome(state, RegionId::Security, outcome);
                smallvec![Effect::None]
            },

            ConsoleAction::MutationCompleted { request, result } => {
                state.mutation_in_flight = None;
                let region = request.request.region();

                match result {
                    Ok(()) => {
                        tracing::info!(request = %request.request, "Mutation applied, refreshing {region}");
                        let token = state.lifecycle_mut(region).finish_mutation(true);
                        match token {
                            Some(token) => smallvec![Self::fetch(state, region, token, env)],
                            None => smallvec![Effect::None],
                        }
                    },
                    Err(error) => {
                        tracing::warn!(request = %request.request, %error, "Mutation failed");
                        state.notice = Some(Notice::from(&error));
                        match state.lifecycle_mut(region).finish_mutation(false) {
                            Some(token) => {
                                tracing::debug!(%region, "List went stale while saving, refetching");
                                smallvec![Self::fetch(state, region, token, env)]
                            },
                            None => smallvec![Effect::None],
                        }
                    },
                }
            },
        }
    }
}
