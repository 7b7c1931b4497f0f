//! Shared fixtures for console integration tests

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use admin_console::service::{MockDataService, RawOrder, RawProduct, RawUser};
use admin_console::types::{CallerContext, Role};
use admin_console::{ConsoleAction, ConsoleConfig, ConsoleEnvironment, ConsoleReducer, ConsoleState};
use admin_console_runtime::Store;
use admin_console_testing::{init_test_tracing, test_clock, test_time};
use chrono::Duration as ChronoDuration;
use std::time::Duration;

pub type ConsoleStore = Store<ConsoleState, ConsoleAction, ConsoleEnvironment, ConsoleReducer>;

pub fn raw_user(id: &str, role: &str) -> RawUser {
    RawUser {
        user_id: id.into(),
        name: Some(format!("User {id}")),
        email: Some(format!("{id}@example.com")),
        role: role.into(),
        registration_source: Some("organic".into()),
        status: Some("active".into()),
        status_reason: None,
        custom_fee_rate: None,
        total_gmv: 120_000,
        total_fees: 6_000,
        orders_count: 12,
        created_at: test_time() - ChronoDuration::days(90),
    }
}

pub fn raw_product(id: &str, owner: &str) -> RawProduct {
    RawProduct {
        id: id.into(),
        name: format!("Course {id}"),
        price: 19_700,
        status: Some("active".into()),
        created_at: Some(test_time() - ChronoDuration::days(30)),
        user_id: Some(owner.into()),
        vendor_name: Some(format!("User {owner}")),
        total_gmv: 59_100,
        orders_count: 3,
    }
}

pub fn raw_order(id: &str, status: &str, days_ago: i64) -> RawOrder {
    RawOrder {
        id: id.into(),
        status: Some(status.into()),
        gateway: Some("stripe".into()),
        amount_cents: 19_700,
        product_name: Some("Course p-1".into()),
        customer_email: Some("buyer@example.com".into()),
        created_at: test_time() - ChronoDuration::days(days_ago),
    }
}

/// A small marketplace: one of each role, two products, two orders
pub fn marketplace() -> MockDataService {
    MockDataService::new()
        .with_now(test_time())
        .with_users(vec![
            raw_user("owner-1", "owner"),
            raw_user("admin-1", "admin"),
            raw_user("seller-1", "seller"),
            raw_user("aff-1", "affiliate"),
        ])
        .with_products(vec![
            raw_product("p-1", "seller-1"),
            raw_product("p-2", "seller-1"),
        ])
        .with_orders(vec![
            raw_order("o-1", "paid", 2),
            raw_order("o-2", "refunded", 20),
        ])
}

/// Configuration without the periodic security refresh
pub fn quiet_config() -> ConsoleConfig {
    let mut config = ConsoleConfig::default();
    config.security.auto_refresh = false;
    config
}

pub fn store_for(
    service: &MockDataService,
    caller: &str,
    role: Role,
    config: &ConsoleConfig,
) -> ConsoleStore {
    init_test_tracing();
    let env = ConsoleEnvironment::new(service.clone(), test_clock());
    let state = ConsoleState::with_config(CallerContext::new(caller, role), config);
    Store::new(state, ConsoleReducer::new(), env)
}

pub async fn send(store: &ConsoleStore, action: ConsoleAction) {
    store.send(action).await.expect("store accepts actions");
}

/// Wait until no fetch or mutation is in flight
pub async fn settle(store: &ConsoleStore) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !store.state(ConsoleState::is_settled).await {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("console settles");
}

/// A loaded console for `caller`
pub async fn loaded(service: &MockDataService, caller: &str, role: Role) -> ConsoleStore {
    let store = store_for(service, caller, role, &quiet_config());
    send(&store, ConsoleAction::Load).await;
    settle(&store).await;
    store
}
