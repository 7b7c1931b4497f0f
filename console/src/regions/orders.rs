//! Order ledger region.

use crate::mapper::CanonicalStatus;
use crate::region::RegionItem;
use crate::types::{OrderId, OrderRecord, PeriodBucket};
use std::cmp::Ordering;

/// Sortable order columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSortField {
    /// Creation time
    CreatedAt,
    /// Amount
    Amount,
    /// Canonical status
    Status,
}

/// Structured order filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    /// Only this canonical status
    pub status: Option<CanonicalStatus>,
    /// Only this age bucket
    pub bucket: Option<PeriodBucket>,
    /// Only this gateway (case-insensitive)
    pub gateway: Option<String>,
}

fn order_id(order: &OrderRecord) -> &str {
    order.id.as_str()
}

fn order_product(order: &OrderRecord) -> &str {
    &order.product_name
}

fn order_customer(order: &OrderRecord) -> &str {
    &order.customer_email
}

impl RegionItem for OrderRecord {
    type Id = OrderId;
    type SortField = OrderSortField;
    type Filter = OrderFilter;

    const SEARCH_FIELDS: &'static [fn(&Self) -> &str] = &[order_id, order_product, order_customer];
    const DEFAULT_SORT: OrderSortField = OrderSortField::CreatedAt;

    fn id(&self) -> &OrderId {
        &self.id
    }

    fn compare(a: &Self, b: &Self, field: OrderSortField) -> Ordering {
        match field {
            OrderSortField::CreatedAt => a.created_at.cmp(&b.created_at),
            OrderSortField::Amount => a.amount.cmp(&b.amount),
            OrderSortField::Status => a.canonical_status.cmp(&b.canonical_status),
        }
    }

    fn matches(&self, filter: &OrderFilter) -> bool {
        filter.status.is_none_or(|status| self.canonical_status == status)
            && filter.bucket.is_none_or(|bucket| self.period_bucket == bucket)
            && filter
                .gateway
                .as_deref()
                .is_none_or(|gateway| self.gateway.eq_ignore_ascii_case(gateway))
    }
}
