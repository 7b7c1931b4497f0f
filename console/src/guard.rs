//! Role hierarchy and permission checks.
//!
//! Every permission decision the console makes goes through this module.

use crate::error::ConsoleError;
use crate::types::Role;

/// Whether `caller` may see `target` in the user directory
#[must_use]
pub const fn visible_to(caller: Role, target: Role) -> bool {
    caller.outranks(target)
}

/// Roles `caller` may assign to an account currently holding `current`.
///
/// Strictly below the caller, excluding the current role; empty when the
/// target is not strictly below the caller. Highest first.
#[must_use]
pub fn assignable_roles(caller: Role, current: Role) -> Vec<Role> {
    if !caller.outranks(current) {
        return Vec::new();
    }
    Role::ALL
        .into_iter()
        .filter(|role| caller.outranks(*role) && *role != current)
        .collect()
}

/// Only staff may request state-changing operations.
///
/// # Errors
///
/// [`ConsoleError::Forbidden`] for non-staff callers.
pub fn require_staff(caller: Role) -> Result<(), ConsoleError> {
    if caller.is_staff() {
        Ok(())
    } else {
        Err(ConsoleError::forbidden(format!(
            "{} accounts cannot change platform data",
            caller.label()
        )))
    }
}

/// The target account must rank strictly below the caller.
///
/// # Errors
///
/// [`ConsoleError::Forbidden`] when the target is at or above the caller.
pub fn require_below(caller: Role, target: Role) -> Result<(), ConsoleError> {
    if caller.outranks(target) {
        Ok(())
    } else {
        Err(ConsoleError::forbidden(format!(
            "{} cannot act on a {} account",
            caller.label(),
            target.label()
        )))
    }
}

/// Full role-change check.
///
/// # Errors
///
/// [`ConsoleError::Forbidden`] when `new_role` is not assignable.
pub fn check_role_change(caller: Role, current: Role, new_role: Role) -> Result<(), ConsoleError> {
    require_staff(caller)?;
    require_below(caller, current)?;

    if assignable_roles(caller, current).contains(&new_role) {
        Ok(())
    } else {
        Err(ConsoleError::forbidden(format!(
            "{} cannot assign the {} role",
            caller.label(),
            new_role.label()
        )))
    }
}
