//! Product catalog region.

use crate::region::RegionItem;
use crate::types::{ProductId, ProductRecord, ProductStatus};
use std::cmp::Ordering;

/// Sortable product columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSortField {
    /// Product name
    Name,
    /// Gross merchandise value
    Gmv,
    /// Paid orders
    Orders,
    /// Price
    Price,
    /// Creation time
    CreatedAt,
}

/// Structured product filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Only this status
    pub status: Option<ProductStatus>,
}

fn product_name(product: &ProductRecord) -> &str {
    &product.name
}

fn product_owner(product: &ProductRecord) -> &str {
    &product.owner_name
}

impl RegionItem for ProductRecord {
    type Id = ProductId;
    type SortField = ProductSortField;
    type Filter = ProductFilter;

    const SEARCH_FIELDS: &'static [fn(&Self) -> &str] = &[product_name, product_owner];
    const DEFAULT_SORT: ProductSortField = ProductSortField::Gmv;

    fn id(&self) -> &ProductId {
        &self.id
    }

    fn compare(a: &Self, b: &Self, field: ProductSortField) -> Ordering {
        match field {
            ProductSortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            ProductSortField::Gmv => a.total_gmv.cmp(&b.total_gmv),
            ProductSortField::Orders => a.orders_count.cmp(&b.orders_count),
            ProductSortField::Price => a.price.cmp(&b.price),
            ProductSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        }
    }

    fn matches(&self, filter: &ProductFilter) -> bool {
        filter.status.is_none_or(|status| self.status == status)
    }
}
