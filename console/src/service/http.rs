//! HTTP implementation of the data service.
//!
//! Every operation is a JSON `POST` to one remote function under the
//! configured base URL, authenticated with a bearer token.

use super::wire::{
    AdminDataRequest, MutationAck, OrdersResponse, PeriodQuery, ProductActionBody,
    ProductsResponse, RawOrder, RawProduct, RawUser, RoleChangeBody, SecurityActionBody,
    SecurityOverview, UserStatusBody, UsersResponse,
};
use super::{DataService, ServiceFuture};
use crate::config::ApiConfig;
use crate::error::ConsoleError;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const ADMIN_DATA: &str = "admin-data";
const MANAGE_USER_ROLE: &str = "manage-user-role";
const MANAGE_USER_STATUS: &str = "manage-user-status";
const PRODUCT_MANAGEMENT: &str = "admin-product-management";
const SECURITY_MANAGEMENT: &str = "security-management";

/// Data service backed by the remote functions API
#[derive(Clone)]
pub struct HttpDataService {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for HttpDataService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDataService")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl HttpDataService {
    /// Build a client from configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Network`] if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ConsoleError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConsoleError::network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn call<B, R>(&self, function: &'static str, body: B) -> ServiceFuture<R>
    where
        B: Serialize + Send + 'static,
        R: DeserializeOwned + Send + 'static,
    {
        let client = self.client.clone();
        let url = format!("{}/{function}", self.base_url);
        let token = self.token.clone();

        Box::pin(async move {
            tracing::debug!(%url, "Calling remote function");

            let mut request = client.post(&url).json(&body);
            if let Some(token) = token {
                request = request.bearer_auth(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| ConsoleError::network(format!("Request to {function} failed: {e}")))?;

            let status = response.status();
            let text = response
                .text()
                .await
                .map_err(|e| ConsoleError::network(format!("Failed to read response: {e}")))?;

            decode(function, status, &text)
        })
    }

    fn mutate<B>(&self, function: &'static str, body: B) -> ServiceFuture<()>
    where
        B: Serialize + Send + 'static,
    {
        let ack = self.call::<B, MutationAck>(function, body);
        Box::pin(async move {
            ack.await?;
            Ok(())
        })
    }
}

/// Map a remote error message and code to the console taxonomy
fn remote_error(message: String, code: Option<String>) -> ConsoleError {
    match code.as_deref() {
        Some("NOT_FOUND") => ConsoleError::NotFound(message),
        Some("FORBIDDEN" | "UNAUTHORIZED") => ConsoleError::Forbidden(message),
        Some("VALIDATION_ERROR" | "INVALID_REQUEST") => ConsoleError::Validation(message),
        _ => ConsoleError::Network { message, code },
    }
}

/// Decode a response body, honouring the `{ "error": ... }` envelope
fn decode<R: DeserializeOwned>(
    function: &str,
    status: StatusCode,
    body: &str,
) -> Result<R, ConsoleError> {
    let value: serde_json::Value = if body.trim().is_empty() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        serde_json::from_str(body).map_err(|e| {
            ConsoleError::network_with_code(
                format!("{function} returned invalid JSON: {e}"),
                status.as_u16().to_string(),
            )
        })?
    };

    let envelope: MutationAck = serde_json::from_value(value.clone()).unwrap_or_default();

    if !status.is_success() {
        let message = envelope
            .error
            .unwrap_or_else(|| format!("{function} failed with status {status}"));
        return Err(match status {
            StatusCode::NOT_FOUND => ConsoleError::NotFound(message),
            StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => ConsoleError::Forbidden(message),
            _ => remote_error(
                message,
                envelope.code.or_else(|| Some(status.as_u16().to_string())),
            ),
        });
    }

    if let Some(message) = envelope.error {
        return Err(remote_error(message, envelope.code));
    }

    serde_json::from_value(value)
        .map_err(|e| ConsoleError::network(format!("{function} returned an unexpected shape: {e}")))
}

impl DataService for HttpDataService {
    fn list_users(&self, period: PeriodQuery) -> ServiceFuture<Vec<RawUser>> {
        let response =
            self.call::<_, UsersResponse>(ADMIN_DATA, AdminDataRequest::UsersWithMetrics(period));
        Box::pin(async move { Ok(response.await?.users) })
    }

    fn list_products(&self, period: PeriodQuery) -> ServiceFuture<Vec<RawProduct>> {
        let response = self
            .call::<_, ProductsResponse>(ADMIN_DATA, AdminDataRequest::ProductsWithMetrics(period));
        Box::pin(async move { Ok(response.await?.products) })
    }

    fn list_orders(&self, period: PeriodQuery) -> ServiceFuture<Vec<RawOrder>> {
        let response =
            self.call::<_, OrdersResponse>(ADMIN_DATA, AdminDataRequest::OrdersList(period));
        Box::pin(async move { Ok(response.await?.orders) })
    }

    fn security_overview(&self) -> ServiceFuture<SecurityOverview> {
        self.call(ADMIN_DATA, AdminDataRequest::SecurityOverview)
    }

    fn change_role(&self, body: RoleChangeBody) -> ServiceFuture<()> {
        self.mutate(MANAGE_USER_ROLE, body)
    }

    fn update_user(&self, body: UserStatusBody) -> ServiceFuture<()> {
        self.mutate(MANAGE_USER_STATUS, body)
    }

    fn product_action(&self, body: ProductActionBody) -> ServiceFuture<()> {
        self.mutate(PRODUCT_MANAGEMENT, body)
    }

    fn security_action(&self, body: SecurityActionBody) -> ServiceFuture<()> {
        self.mutate(SECURITY_MANAGEMENT, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_on_success_status() {
        let result: Result<MutationAck, _> = decode(
            MANAGE_USER_ROLE,
            StatusCode::OK,
            r#"{"error":"Target not found","code":"NOT_FOUND"}"#,
        );
        assert_eq!(result.err(), Some(ConsoleError::not_found("Target not found")));
    }

    #[test]
    fn test_http_forbidden() {
        let result: Result<UsersResponse, _> =
            decode(ADMIN_DATA, StatusCode::FORBIDDEN, r#"{"error":"Owner only"}"#);
        assert!(result.is_err_and(|e| e.is_forbidden()));
    }

    #[test]
    fn test_server_error_keeps_status_as_code() {
        let result: Result<UsersResponse, _> = decode(ADMIN_DATA, StatusCode::BAD_GATEWAY, "");
        let Err(error) = result else {
            return;
        };
        assert_eq!(error.code(), Some("502"));
    }

    #[test]
    fn test_invalid_json_is_network_failure() {
        let result: Result<UsersResponse, _> = decode(ADMIN_DATA, StatusCode::OK, "<html>");
        assert!(matches!(result, Err(ConsoleError::Network { .. })));
    }

    #[test]
    fn test_empty_body_decodes_as_ack() {
        let result: Result<MutationAck, _> = decode(PRODUCT_MANAGEMENT, StatusCode::OK, "");
        assert!(result.is_ok());
    }

    #[test]
    fn test_users_payload() {
        let body = r#"{"users":[{"user_id":"u-1","role":"seller","created_at":"2025-01-01T00:00:00Z"}]}"#;
        let result: Result<UsersResponse, _> = decode(ADMIN_DATA, StatusCode::OK, body);
        assert_eq!(result.map(|r| r.users.len()).ok(), Some(1));
    }
}
