//! User directory region.

use crate::region::RegionItem;
use crate::types::{Role, UserId, UserRecord, UserStatus};
use std::cmp::Ordering;

/// Sortable user columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSortField {
    /// Display name
    Name,
    /// Gross merchandise value
    Gmv,
    /// Platform fees
    Fees,
    /// Paid orders
    Orders,
    /// Signup time
    CreatedAt,
}

/// Structured user filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    /// Only this role
    pub role: Option<Role>,
    /// Only this moderation status
    pub status: Option<UserStatus>,
}

fn user_name(user: &UserRecord) -> &str {
    &user.name
}

fn user_email(user: &UserRecord) -> &str {
    &user.email
}

fn user_id(user: &UserRecord) -> &str {
    user.id.as_str()
}

impl RegionItem for UserRecord {
    type Id = UserId;
    type SortField = UserSortField;
    type Filter = UserFilter;

    const SEARCH_FIELDS: &'static [fn(&Self) -> &str] = &[user_name, user_email, user_id];
    const DEFAULT_SORT: UserSortField = UserSortField::Gmv;

    fn id(&self) -> &UserId {
        &self.id
    }

    fn compare(a: &Self, b: &Self, field: UserSortField) -> Ordering {
        match field {
            UserSortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            UserSortField::Gmv => a.total_gmv.cmp(&b.total_gmv),
            UserSortField::Fees => a.total_fees.cmp(&b.total_fees),
            UserSortField::Orders => a.orders_count.cmp(&b.orders_count),
            UserSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        }
    }

    fn matches(&self, filter: &UserFilter) -> bool {
        filter.role.is_none_or(|role| self.role == role)
            && filter.status.is_none_or(|status| self.status == status)
    }
}
