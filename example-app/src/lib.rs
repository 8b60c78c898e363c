//! A user directory served by nestoi: field rules from `application.yaml`,
//! routes declared in code.

pub mod models;
pub mod routes;
pub mod services;

use nestoi::prelude::*;

use crate::services::UserService;

pub const API_KEY_HEADER: &str = "x-api-key";

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

/// Application config for the user directory on top of loaded settings.
pub fn app_config(settings: AppSettings, service: UserService, api_key: &str) -> AppConfig {
    AppConfig::from_settings(settings)
        .field(
            "email",
            ValidationRule::string()
                .pattern(EMAIL_PATTERN)
                .example("alice@example.com"),
        )
        .security_scheme("bearerAuth", SecurityScheme::bearer_auth())
        .security_scheme(
            "apiKey",
            SecurityScheme::api_key(API_KEY_HEADER, ApiKeyLocation::Header),
        )
        .route_tag(routes::users(service, api_key))
}
