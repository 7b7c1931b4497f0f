//! Query and mutation actors.
//!
//! One async function per side-effecting operation. Each takes everything it
//! needs as arguments, makes exactly one remote call and maps the answer
//! through the canonical mappers. No retries, no caching.

use crate::error::Result;
use crate::gate::{ConfirmedRequest, FeeAdjustment, ModerationAction, PendingRequest, ProductAction};
use crate::mapper;
use crate::service::{
    DataService, PeriodQuery, ProductActionBody, RoleChangeBody, SecurityActionBody,
    UserStatusBody,
};
use crate::types::{
    AlertId, OrderRecord, PeriodFilter, ProductId, ProductRecord, Role, SecuritySnapshot, UserId,
    UserRecord,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Shared handle to the remote data service
pub type Service = Arc<dyn DataService>;

/// Users with aggregates for `period`
///
/// # Errors
///
/// Whatever the service reports.
pub async fn load_users(service: Service, period: PeriodFilter) -> Result<Vec<UserRecord>> {
    let rows = service.list_users(PeriodQuery::from(&period)).await?;
    Ok(rows.into_iter().map(mapper::user).collect())
}

/// Products with aggregates for `period`
///
/// # Errors
///
/// Whatever the service reports.
pub async fn load_products(service: Service, period: PeriodFilter) -> Result<Vec<ProductRecord>> {
    let rows = service.list_products(PeriodQuery::from(&period)).await?;
    Ok(rows.into_iter().map(mapper::product).collect())
}

/// Orders for `period`, bucketed relative to `now`
///
/// # Errors
///
/// Whatever the service reports.
pub async fn load_orders(
    service: Service,
    period: PeriodFilter,
    now: DateTime<Utc>,
) -> Result<Vec<OrderRecord>> {
    let rows = service.list_orders(PeriodQuery::from(&period)).await?;
    Ok(rows.into_iter().map(|row| mapper::order(row, now)).collect())
}

/// Alerts, blocks and counters
///
/// # Errors
///
/// Whatever the service reports.
pub async fn load_security(service: Service) -> Result<SecuritySnapshot> {
    let overview = service.security_overview().await?;
    Ok(mapper::security(overview))
}

/// Assign `new_role` to a user
///
/// # Errors
///
/// Whatever the service reports.
pub async fn change_role(service: Service, user_id: UserId, new_role: Role) -> Result<()> {
    service
        .change_role(RoleChangeBody {
            target_user_id: user_id.as_str().to_string(),
            new_role,
        })
        .await
}

/// Suspend, ban or reactivate a user
///
/// # Errors
///
/// Whatever the service reports.
pub async fn moderate_user(
    service: Service,
    user_id: UserId,
    action: ModerationAction,
    reason: Option<String>,
) -> Result<()> {
    service
        .update_user(UserStatusBody::UpdateStatus {
            user_id: user_id.as_str().to_string(),
            status: action.target_status().as_str(),
            reason,
        })
        .await
}

/// Set or reset a user's custom fee
///
/// # Errors
///
/// Whatever the service reports.
pub async fn adjust_fee(service: Service, user_id: UserId, adjustment: FeeAdjustment) -> Result<()> {
    service
        .update_user(UserStatusBody::UpdateCustomFee {
            user_id: user_id.as_str().to_string(),
            fee_percent: adjustment.as_fraction(),
        })
        .await
}

/// Activate, block or delete a product
///
/// # Errors
///
/// Whatever the service reports.
pub async fn product_action(
    service: Service,
    product_id: ProductId,
    action: ProductAction,
) -> Result<()> {
    service
        .product_action(ProductActionBody {
            action: action.as_str(),
            product_id: product_id.as_str().to_string(),
        })
        .await
}

/// Mark an alert as seen
///
/// # Errors
///
/// Whatever the service reports.
pub async fn acknowledge_alert(service: Service, alert_id: AlertId) -> Result<()> {
    service
        .security_action(SecurityActionBody::AcknowledgeAlert {
            alert_id: alert_id.as_str().to_string(),
        })
        .await
}

/// Deny an address
///
/// # Errors
///
/// Whatever the service reports.
pub async fn block_ip(
    service: Service,
    ip: String,
    reason: String,
    expires_in_days: Option<u32>,
) -> Result<()> {
    service
        .security_action(SecurityActionBody::BlockIp {
            ip_address: ip,
            reason,
            expires_in_days,
        })
        .await
}

/// Lift a block
///
/// # Errors
///
/// Whatever the service reports.
pub async fn unblock_ip(service: Service, ip: String) -> Result<()> {
    service
        .security_action(SecurityActionBody::UnblockIp { ip_address: ip })
        .await
}

/// Run the actor matching a confirmed request.
///
/// The only way the reducer reaches a mutation actor.
///
/// # Errors
///
/// Whatever the service reports.
#[tracing::instrument(
    skip_all,
    fields(kind = confirmed.request.kind(), caller_id = %confirmed.caller_id)
)]
pub async fn run_mutation(service: Service, confirmed: ConfirmedRequest) -> Result<()> {
    let result = match confirmed.request {
        PendingRequest::RoleChange {
            user_id, to_role, ..
        } => change_role(service, user_id, to_role).await,
        PendingRequest::Moderation {
            user_id,
            action,
            reason,
        } => moderate_user(service, user_id, action, reason).await,
        PendingRequest::FeeAdjustment {
            user_id,
            adjustment,
        } => adjust_fee(service, user_id, adjustment).await,
        PendingRequest::ProductAction { product_id, action } => {
            product_action(service, product_id, action).await
        },
        PendingRequest::AlertAck { alert_id } => acknowledge_alert(service, alert_id).await,
        PendingRequest::IpBlock {
            ip,
            reason,
            expires_in_days,
        } => block_ip(service, ip, reason, expires_in_days).await,
        PendingRequest::IpUnblock { ip } => unblock_ip(service, ip).await,
    };

    if let Err(error) = &result {
        tracing::warn!(%error, "Mutation failed");
    }
    result
}
