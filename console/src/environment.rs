//! Injected collaborators.

use crate::service::DataService;
use crate::types::{CallerContext, Role};
use admin_console_core::environment::{Clock, SystemClock};
use std::sync::Arc;

/// Everything the reducer may hand to an effect
#[derive(Clone)]
pub struct ConsoleEnvironment {
    /// Remote data service
    pub service: Arc<dyn DataService>,
    /// Time source for audit entries, bucketing and block expiry
    pub clock: Arc<dyn Clock>,
}

impl ConsoleEnvironment {
    /// Build an environment from its parts
    pub fn new(service: impl DataService + 'static, clock: impl Clock + 'static) -> Self {
        Self {
            service: Arc::new(service),
            clock: Arc::new(clock),
        }
    }

    /// Environment over `service` using the wall clock
    pub fn with_system_clock(service: impl DataService + 'static) -> Self {
        Self::new(service, SystemClock)
    }
}

impl std::fmt::Debug for ConsoleEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleEnvironment")
            .field("now", &self.clock.now())
            .finish_non_exhaustive()
    }
}

/// Source of the caller's identity and role
pub trait PermissionResolver: Send + Sync {
    /// The operating caller
    fn caller(&self) -> CallerContext;
}

/// Resolver returning a fixed caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticPermissions {
    caller: CallerContext,
}

impl StaticPermissions {
    /// Always resolve to `id` with `role`
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            caller: CallerContext::new(id, role),
        }
    }
}

impl PermissionResolver for StaticPermissions {
    fn caller(&self) -> CallerContext {
        self.caller.clone()
    }
}
