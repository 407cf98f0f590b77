//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::gateway::handlers::HealthResponse;
use crate::ledger::{BalanceView, WithdrawRequest, WithdrawalView};
use crate::orders::{OrderStatus, OrderView};
use crate::session::SESSION_COOKIE_NAME;
use crate::user_auth::AuthRequest;

/// Signed session cookie security scheme
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    SESSION_COOKIE_NAME,
                    "Signed session token set by /api/user/register and /api/user/login: \
                     <token>|<hex HMAC-SHA256>",
                ))),
            );
        }
    }
}

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Loyalty Ledger API",
        version = "1.0.0",
        description = "Loyalty points: order accrual, balances and withdrawals.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health::health_check,
        crate::user_auth::handlers::register,
        crate::user_auth::handlers::login,
        crate::gateway::handlers::orders::upload_order,
        crate::gateway::handlers::orders::list_orders,
        crate::gateway::handlers::balance::get_balance,
        crate::gateway::handlers::balance::withdraw,
        crate::gateway::handlers::balance::list_withdrawals,
    ),
    components(
        schemas(
            HealthResponse,
            AuthRequest,
            OrderView,
            OrderStatus,
            BalanceView,
            WithdrawRequest,
            WithdrawalView,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration and login"),
        (name = "Orders", description = "Order upload and accrual status (auth required)"),
        (name = "Balance", description = "Balance and withdrawals (auth required)"),
        (name = "System", description = "Health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::OpenApi;

    #[test]
    fn test_openapi_document_generates() {
        let doc = ApiDoc::openapi();
        assert_eq!(doc.info.title, "Loyalty Ledger API");
        assert!(doc.to_json().is_ok());
    }

    #[test]
    fn test_endpoints_registered() {
        let paths = ApiDoc::openapi().paths;
        for path in [
            "/api/health",
            "/api/user/register",
            "/api/user/login",
            "/api/user/orders",
            "/api/user/balance",
            "/api/user/balance/withdraw",
            "/api/user/withdrawals",
        ] {
            assert!(paths.paths.contains_key(path), "{path} missing");
        }
    }

    #[test]
    fn test_security_scheme_registered() {
        let components = ApiDoc::openapi().components.expect("should have components");
        assert!(components.security_schemes.contains_key("session_cookie"));
    }
}
