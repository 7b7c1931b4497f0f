//! Configuration management for the admin console.
//!
//! Loads configuration from environment variables (and an optional `.env`
//! file) with sensible defaults. Unparseable values fall back to the default.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Console configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Remote data service
    pub api: ApiConfig,
    /// List views
    pub view: ViewConfig,
    /// Security feed
    pub security: SecurityConfig,
    /// Audit trail
    pub audit: AuditConfig,
}

/// Remote data service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the remote functions
    pub base_url: String,
    /// Bearer token sent with every call
    pub token: Option<String>,
    /// HTTP client timeout in seconds; the orchestrator itself enforces none
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321/functions/v1".to_string(),
            token: None,
            timeout_secs: 30,
        }
    }
}

/// List view configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Rows per page (at least 1)
    pub page_size: usize,
    /// Page numbers shown before collapsing into an ellipsis
    pub page_window: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_size: 15,
            page_window: 5,
        }
    }
}

/// Security feed configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Whether the alert feed refreshes periodically
    pub auto_refresh: bool,
    /// Seconds between refreshes; 0 disables refreshing
    pub refresh_interval_secs: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            auto_refresh: true,
            refresh_interval_secs: 30,
        }
    }
}

impl SecurityConfig {
    /// Refresh interval, `None` when disabled by a zero value
    #[must_use]
    pub const fn refresh_interval(&self) -> Option<Duration> {
        if self.refresh_interval_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.refresh_interval_secs))
        }
    }
}

/// Audit trail configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Confirmed requests kept in memory
    pub capacity: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self { capacity: 50 }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl ConsoleConfig {
    /// Load configuration from the process environment.
    ///
    /// A `.env` file in the working directory is read first if present.
    #[must_use]
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let number = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());
        let size = |key: &str| lookup(key).and_then(|s| s.trim().parse::<usize>().ok());

        Self {
            api: ApiConfig {
                base_url: lookup("ADMIN_API_URL")
                    .filter(|url| !url.trim().is_empty())
                    .unwrap_or(defaults.api.base_url),
                token: lookup("ADMIN_API_TOKEN").filter(|token| !token.is_empty()),
                timeout_secs: number("ADMIN_API_TIMEOUT_SECS").unwrap_or(defaults.api.timeout_secs),
            },
            view: ViewConfig {
                page_size: size("ADMIN_PAGE_SIZE")
                    .unwrap_or(defaults.view.page_size)
                    .max(1),
                page_window: size("ADMIN_PAGE_WINDOW").unwrap_or(defaults.view.page_window),
            },
            security: SecurityConfig {
                auto_refresh: lookup("ADMIN_SECURITY_AUTO_REFRESH")
                    .as_deref()
                    .and_then(parse_bool)
                    .unwrap_or(defaults.security.auto_refresh),
                refresh_interval_secs: number("ADMIN_SECURITY_REFRESH_SECS")
                    .unwrap_or(defaults.security.refresh_interval_secs),
            },
            audit: AuditConfig {
                capacity: size("ADMIN_AUDIT_CAPACITY").unwrap_or(defaults.audit.capacity),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> ConsoleConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ConsoleConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]);
        assert_eq!(config, ConsoleConfig::default());
        assert_eq!(config.view.page_size, 15);
        assert_eq!(
            config.security.refresh_interval(),
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("ADMIN_API_URL", "https://api.example.com/functions/v1"),
            ("ADMIN_API_TOKEN", "secret"),
            ("ADMIN_PAGE_SIZE", "25"),
            ("ADMIN_SECURITY_AUTO_REFRESH", "off"),
            ("ADMIN_AUDIT_CAPACITY", "5"),
        ]);

        assert_eq!(config.api.base_url, "https://api.example.com/functions/v1");
        assert_eq!(config.api.token.as_deref(), Some("secret"));
        assert_eq!(config.view.page_size, 25);
        assert!(!config.security.auto_refresh);
        assert_eq!(config.audit.capacity, 5);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = load(&[
            ("ADMIN_PAGE_SIZE", "0"),
            ("ADMIN_PAGE_WINDOW", "lots"),
            ("ADMIN_SECURITY_REFRESH_SECS", "0"),
        ]);

        assert_eq!(config.view.page_size, 1);
        assert_eq!(config.view.page_window, 5);
        assert_eq!(config.security.refresh_interval(), None);
    }
}
