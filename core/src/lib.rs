//! # Admin Console Core
//!
//! Core traits and types for the admin console orchestration engine.
//!
//! The engine is built from a small number of abstractions:
//!
//! - **State**: everything the console knows (regions, caller, pending decision)
//! - **Action**: every input (UI events and terminal events produced by actors)
//! - **Reducer**: pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: description of a side effect, executed by the runtime
//! - **Environment**: injected collaborators (remote data service, clock)
//!
//! ## Architecture Principles
//!
//! - Functional core, imperative shell
//! - Unidirectional data flow: the presentation layer only dispatches actions
//! - Explicit effects: a reducer never performs I/O, it returns descriptions
//! - Dependency injection via the environment
//!
//! ## Example
//!
//! ```ignore
//! use admin_console_core::*;
//!
//! impl Reducer for ConsoleReducer {
//!     type State = ConsoleState;
//!     type Action = ConsoleAction;
//!     type Environment = ConsoleEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut ConsoleState,
//!         action: ConsoleAction,
//!         env: &ConsoleEnvironment,
//!     ) -> SmallVec<[Effect<ConsoleAction>; 4]> {
//!         match action {
//!             ConsoleAction::Refresh { region } => { /* start a fetch */ smallvec![] }
//!             _ => smallvec![Effect::None],
//!         }
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use smallvec::{smallvec, SmallVec};

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
/// They contain all orchestration rules and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// Most actions produce zero to two effects, so the return type keeps up
    /// to four inline before spilling to the heap.
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Validates the action against the current state
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed
        ///
        /// # Arguments
        ///
        /// - `state`: Mutable reference to current state
        /// - `action`: The action to process
        /// - `env`: Reference to injected dependencies
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects are values, not execution. The runtime interprets them and feeds
/// any produced action back into the reducer.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// Effect type - describes a side effect to be executed
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects in parallel
        Parallel(Vec<Effect<Action>>),

        /// Run effects sequentially
        Sequential(Vec<Effect<Action>>),

        /// Delayed action (periodic refresh ticks)
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Wrap an async computation that always yields an action
        pub fn run<F>(future: F) -> Effect<Action>
        where
            F: std::future::Future<Output = Action> + Send + 'static,
        {
            Effect::Future(Box::pin(async move { Some(future.await) }))
        }

        /// Whether this effect does nothing when executed
        #[must_use]
        pub fn is_none(&self) -> bool {
            match self {
                Effect::None => true,
                Effect::Parallel(effects) | Effect::Sequential(effects) => {
                    effects.iter().all(Effect::is_none)
                },
                Effect::Delay { .. } | Effect::Future(_) => false,
            }
        }

        /// Number of `Future` effects contained, counting nested groups
        #[must_use]
        pub fn future_count(&self) -> usize {
            match self {
                Effect::Future(_) => 1,
                Effect::Parallel(effects) | Effect::Sequential(effects) => {
                    effects.iter().map(Effect::future_count).sum()
                },
                Effect::None | Effect::Delay { .. } => 0,
            }
        }
    }
}

/// Environment module - Dependency injection traits
///
/// External collaborators are abstracted behind traits and injected via the
/// Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// Production uses [`SystemClock`]; tests use a fixed clock so audit
    /// timestamps and period buckets are deterministic.
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

pub use effect::Effect;
pub use environment::{Clock, SystemClock};
pub use reducer::Reducer;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Tick {
        Refresh,
    }

    #[test]
    fn test_effect_none_detection() {
        let effect: Effect<Tick> = Effect::merge(vec![Effect::None, Effect::chain(vec![])]);
        assert!(effect.is_none());

        let delayed = Effect::Delay {
            duration: Duration::from_secs(30),
            action: Box::new(Tick::Refresh),
        };
        assert!(!delayed.is_none());
    }

    #[test]
    fn test_future_count_walks_groups() {
        let effect = Effect::merge(vec![
            Effect::run(async { Tick::Refresh }),
            Effect::chain(vec![
                Effect::run(async { Tick::Refresh }),
                Effect::None,
            ]),
        ]);
        assert_eq!(effect.future_count(), 2);
    }

    #[test]
    fn test_run_always_yields_its_action() {
        let Effect::Future(fut) = Effect::run(async { Tick::Refresh }) else {
            unreachable!("Effect::run builds a future");
        };
        assert_eq!(tokio_test::block_on(fut), Some(Tick::Refresh));
    }

    #[test]
    fn test_debug_hides_future_body() {
        let effect: Effect<Tick> = Effect::run(async { Tick::Refresh });
        assert_eq!(format!("{effect:?}"), "Effect::Future(<future>)");
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
