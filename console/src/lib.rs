//! # Admin Console
//!
//! Orchestration layer of a marketplace administration console.
//!
//! Staff operate on four remotely-sourced regions (users, products, orders
//! and the security feed) through a single reducer:
//! - Every fetch is tagged; a response that lost to a newer request is dropped
//! - Every mutation passes the role guard, then waits in the confirmation
//!   gate until the operator approves it
//! - Remote calls run as effects against a [`DataService`](service::DataService)
//!
//! ## Example
//!
//! ```no_run
//! use admin_console::{ConsoleAction, ConsoleEnvironment, ConsoleReducer, ConsoleState};
//! use admin_console::service::MockDataService;
//! use admin_console::types::{CallerContext, Role};
//! use admin_console_runtime::Store;
//!
//! # async fn example() {
//! let env = ConsoleEnvironment::with_system_clock(MockDataService::new());
//! let state = ConsoleState::new(CallerContext::new("admin-1", Role::Admin));
//! let store = Store::new(state, ConsoleReducer::new(), env);
//!
//! let _ = store.send(ConsoleAction::Load).await;
//! let loading = store.state(|s| s.users.is_loading()).await;
//! # let _ = loading;
//! # }
//! ```

pub mod action;
pub mod actors;
pub mod combinators;
pub mod config;
pub mod environment;
pub mod error;
pub mod gate;
pub mod guard;
pub mod mapper;
pub mod reducer;
pub mod region;
pub mod regions;
pub mod service;
pub mod state;
pub mod types;

pub use action::{ConsoleAction, Tab};
pub use config::ConsoleConfig;
pub use environment::{ConsoleEnvironment, PermissionResolver, StaticPermissions};
pub use error::ConsoleError;
pub use gate::{ConfirmationGate, PendingRequest};
pub use reducer::ConsoleReducer;
pub use region::{Region, RegionId, RegionStatus};
pub use state::{ConsoleState, Notice};
