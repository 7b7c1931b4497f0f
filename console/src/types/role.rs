//! Caller roles and the hierarchy between them.

use crate::error::ConsoleError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Role of a platform account, strictly ordered by rank.
///
/// `Owner > Admin > Seller > Affiliate > User`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Platform owner
    Owner,
    /// Platform administrator
    Admin,
    /// Product seller
    Seller,
    /// Affiliate promoting sellers' products
    Affiliate,
    /// Plain buyer account
    User,
}

impl Role {
    /// All roles, highest rank first
    pub const ALL: [Self; 5] = [
        Self::Owner,
        Self::Admin,
        Self::Seller,
        Self::Affiliate,
        Self::User,
    ];

    /// Numeric rank; higher outranks lower
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Owner => 4,
            Self::Admin => 3,
            Self::Seller => 2,
            Self::Affiliate => 1,
            Self::User => 0,
        }
    }

    /// Whether `self` is strictly above `other`
    #[must_use]
    pub const fn outranks(self, other: Self) -> bool {
        self.rank() > other.rank()
    }

    /// Roles allowed to moderate accounts, products and security
    #[must_use]
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }

    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Seller => "seller",
            Self::Affiliate => "affiliate",
            Self::User => "user",
        }
    }

    /// Display label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Owner => "Owner",
            Self::Admin => "Admin",
            Self::Seller => "Seller",
            Self::Affiliate => "Affiliate",
            Self::User => "User",
        }
    }
}

impl PartialOrd for Role {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Role {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "seller" => Ok(Self::Seller),
            "affiliate" => Ok(Self::Affiliate),
            "user" => Ok(Self::User),
            other => Err(ConsoleError::validation(format!("unknown role '{other}'"))),
        }
    }
}
