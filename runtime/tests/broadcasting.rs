//! Integration tests for Store action broadcasting
//!
//! Observers see terminal events only after the reducer applied them, which is
//! what the presentation layer relies on when it re-reads state on each event.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use admin_console_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
use admin_console_runtime::{Store, StoreError};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
enum SyncAction {
    /// Start a multi-page sync for a region
    StartSync { region: u8 },
    /// One page arrived
    PageLoaded { region: u8, page: u32 },
    /// Sync finished (terminal)
    SyncCompleted { region: u8 },
    /// Sync failed (terminal, never produced here)
    SyncFailed { region: u8 },
}

#[derive(Debug, Clone, Default)]
struct SyncState {
    pages: Vec<(u8, u32)>,
    completed: Vec<u8>,
}

#[derive(Clone)]
struct SyncEnvironment;

#[derive(Clone)]
struct SyncReducer;

fn next_page(region: u8, page: u32) -> Effect<SyncAction> {
    Effect::run(async move {
        tokio::time::sleep(Duration::from_millis(5)).await;
        SyncAction::PageLoaded { region, page }
    })
}

impl Reducer for SyncReducer {
    type State = SyncState;
    type Action = SyncAction;
    type Environment = SyncEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            SyncAction::StartSync { region } => smallvec![next_page(region, 1)],
            SyncAction::PageLoaded { region, page } => {
                state.pages.push((region, page));
                if page < 3 {
                    smallvec![next_page(region, page + 1)]
                } else {
                    smallvec![Effect::run(async move { SyncAction::SyncCompleted { region } })]
                }
            },
            SyncAction::SyncCompleted { region } => {
                state.completed.push(region);
                smallvec![Effect::None]
            },
            SyncAction::SyncFailed { .. } => smallvec![Effect::None],
        }
    }
}

fn store() -> Store<SyncState, SyncAction, SyncEnvironment, SyncReducer> {
    Store::new(SyncState::default(), SyncReducer, SyncEnvironment)
}

#[tokio::test]
async fn test_wait_for_multi_step_completion() {
    let store = store();

    let result = store
        .send_and_wait_for(
            SyncAction::StartSync { region: 1 },
            |a| matches!(a, SyncAction::SyncCompleted { region: 1 }),
            Duration::from_secs(2),
        )
        .await
        .unwrap();

    assert_eq!(result, SyncAction::SyncCompleted { region: 1 });
    assert_eq!(store.state(|s| s.pages.clone()).await, vec![(1, 1), (1, 2), (1, 3)]);
    assert_eq!(store.state(|s| s.completed.clone()).await, vec![1]);
}

#[tokio::test]
async fn test_wait_for_event_that_never_arrives() {
    let store = store();

    let result = store
        .send_and_wait_for(
            SyncAction::StartSync { region: 2 },
            |a| matches!(a, SyncAction::SyncFailed { .. }),
            Duration::from_millis(50),
        )
        .await;

    assert!(matches!(result, Err(StoreError::Timeout)));
}

#[tokio::test]
async fn test_concurrent_waiters_are_independent() {
    let store = store();

    let mut handles = Vec::new();
    for region in 1..=4u8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .send_and_wait_for(
                    SyncAction::StartSync { region },
                    move |a| matches!(a, SyncAction::SyncCompleted { region: r } if *r == region),
                    Duration::from_secs(2),
                )
                .await
        }));
    }

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    let mut completed = store.state(|s| s.completed.clone()).await;
    completed.sort_unstable();
    assert_eq!(completed, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_subscriber_observes_every_feedback_action() {
    let store = store();
    let mut rx = store.subscribe_actions();

    store.send(SyncAction::StartSync { region: 7 }).await.unwrap();

    let mut seen = Vec::new();
    loop {
        let action = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        let done = matches!(action, SyncAction::SyncCompleted { .. });
        seen.push(action);
        if done {
            break;
        }
    }

    // StartSync was sent directly and is not broadcast
    assert_eq!(seen.len(), 4);
    assert_eq!(seen[0], SyncAction::PageLoaded { region: 7, page: 1 });
}
