use example_app::services::UserService;
use nestoi::prelude::*;

#[tokio::main]
async fn main() -> Result<(), NestoiError> {
    init_tracing();

    let settings = AppSettings::load("dev")?;
    let api_key = std::env::var("USERS_API_KEY").unwrap_or_else(|_| "change-me".to_string());
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    let router = nestoi::build(example_app::app_config(settings, UserService::new(), &api_key))?;

    tracing::info!("docs at http://{addr}/api-docs");
    nestoi::serve(router, &addr).await
}
