//! The four console regions.
//!
//! Each list region is a [`Region`](crate::region::Region) specialised over
//! its record type; this module supplies the columns, filters and search
//! fields for each.

pub mod orders;
pub mod products;
pub mod security;
pub mod users;

pub use orders::{OrderFilter, OrderSortField};
pub use products::{ProductFilter, ProductSortField};
pub use security::{AlertFilter, AlertSortField, AutoRefresh, SecurityRegion};
pub use users::{UserFilter, UserSortField};
