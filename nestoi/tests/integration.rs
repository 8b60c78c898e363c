use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use nestoi::prelude::*;
use nestoi_test::TestApp;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

// ── Helpers ─────────────────────────────────────────────────────────────────

async fn list_pets(Query(query): Query<Value>) -> Json<Value> {
    Json(json!({ "success": 1, "query": query }))
}

async fn create_pet(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    (StatusCode::CREATED, Json(json!({ "success": 1, "pet": body })))
}

async fn show_pet(Path(id): Path<String>) -> String {
    format!("pet {id}")
}

fn pets_tag() -> RouteTag {
    RouteTag::new("pets", "Pet operations")
        .route(
            "/pets",
            RouteMethods::new()
                .get(
                    RouteHandler::new()
                        .summary("List pets")
                        .schema(RouteSchema::new().query(["*page", "species"]))
                        .handler(Endpoint::new(list_pets)),
                )
                .post(
                    RouteHandler::new()
                        .summary("Create a pet")
                        .schema(RouteSchema::new().query(["species"]).body(["*name", "age"]))
                        .handler(Endpoint::new(create_pet)),
                ),
        )
        .route(
            "/pets/{id}",
            RouteMethods::new().get(
                RouteHandler::new()
                    .schema(RouteSchema::new().params(["*id"]))
                    .handler(Endpoint::new(show_pet)),
            ),
        )
}

fn config() -> AppConfig {
    AppConfig::new()
        .title("Pet store")
        .version("2.0.0")
        .field("page", ValidationRule::integer().min(1).example(1))
        .field("species", ValidationRule::string().one_of(["cat", "dog"]))
        .field("name", ValidationRule::string().min(1).example("Rex"))
        .field("age", ValidationRule::integer().min(0))
        .route_tag(pets_tag())
}

fn app(config: AppConfig) -> TestApp {
    TestApp::try_from_build(nestoi::build(config))
}

fn recorder(log: Arc<Mutex<Vec<&'static str>>>, label: &'static str) -> Middleware {
    Middleware::from_fn(move |req: Request, next: Next| {
        let log = log.clone();
        async move {
            log.lock().unwrap().push(label);
            next.run(req).await
        }
    })
}

// ── Landing page and docs ───────────────────────────────────────────────────

#[tokio::test]
async fn landing_page_links_to_docs() {
    let resp = app(config().title("<Pets>")).get("/").send().await.assert_ok();
    let html = resp.text();
    assert!(html.contains("<h1>Welcome to &lt;Pets&gt;</h1>"));
    assert!(html.contains(r#"<a href="/api-docs">"#));
}

#[tokio::test]
async fn generated_root_route_wins_over_landing_page() {
    let tag = RouteTag::new("home", "Home").route(
        "/",
        RouteMethods::new().get(RouteHandler::new().handler(Endpoint::new(|| async { "home" }))),
    );
    let resp = app(AppConfig::new().route_tag(tag)).get("/").send().await.assert_ok();
    assert_eq!(resp.text(), "home");
}

#[tokio::test]
async fn docs_document_describes_routes() {
    let test = app(config());
    test.get("/api-docs").send().await.assert_ok();
    test.get("/api-docs/openapi.json")
        .send()
        .await
        .assert_ok()
        .assert_json_path("info.title", "Pet store")
        .assert_json_path("info.version", "2.0.0")
        .assert_json_path("tags[0].name", "pets")
        .assert_json_path("paths./pets.get.summary", "List pets")
        .assert_json_path("paths./pets.get.parameters[0].name", "page")
        .assert_json_path("paths./pets.get.parameters[0].required", true)
        .assert_json_path("paths./pets.get.parameters[0].schema.type", "number")
        .assert_json_path("paths./pets.post.requestBody.content.application/json.schema.required", json!(["name"]))
        .assert_json_path("components.securitySchemes.bearerAuth.scheme", "bearer");
}

#[tokio::test]
async fn disabled_docs_are_not_mounted() {
    let test = app(config().disable_docs());
    test.get("/api-docs").send().await.assert_not_found();
    test.get("/api-docs/openapi.json").send().await.assert_not_found();
}

#[tokio::test]
async fn extracted_document_matches_served_one() {
    let bundle = nestoi::extract_app_config(&config()).unwrap();
    let served: Value = app(config())
        .get("/api-docs/openapi.json")
        .send()
        .await
        .assert_ok()
        .json();
    assert_eq!(bundle.api_docs, served);
    assert_eq!(bundle.routes.routes.len(), 3);
}

// ── Routing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn route_prefix_nests_generated_routes() {
    let test = app(config().route_prefix("/api/"));
    test.get("/api/pets").query("page", 1).send().await.assert_ok();
    test.get("/api/pets/7").send().await.assert_ok();
    test.get("/pets").query("page", 1).send().await.assert_not_found();
    test.get("/").send().await.assert_ok();
    test.get("/api-docs/openapi.json")
        .send()
        .await
        .assert_json_path("servers[0].url", "/api");
}

#[tokio::test]
async fn path_params_reach_the_handler() {
    let resp = app(config()).get("/pets/42").send().await.assert_ok();
    assert_eq!(resp.text(), "pet 42");
}

#[tokio::test]
async fn custom_verb_answers_on_get() {
    let tag = RouteTag::new("search", "Search").route(
        "/search",
        RouteMethods::new().method("search", RouteHandler::new().handler(Endpoint::new(|| async { "found" }))),
    );
    let resp = app(AppConfig::new().route_tag(tag)).get("/search").send().await.assert_ok();
    assert_eq!(resp.text(), "found");
}

// ── Validation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn valid_query_is_coerced_and_passed_through() {
    app(config())
        .get("/pets")
        .query("page", 2)
        .query("species", "cat")
        .send()
        .await
        .assert_ok()
        .assert_json_path("query.page", "2")
        .assert_json_path("query.species", "cat");
}

#[tokio::test]
async fn missing_required_query_field_is_rejected() {
    app(config())
        .get("/pets")
        .send()
        .await
        .assert_validation_error_contains("page");
}

#[tokio::test]
async fn query_is_checked_before_body() {
    app(config())
        .post("/pets")
        .query("species", "horse")
        .json(&json!({ "age": -1 }))
        .send()
        .await
        .assert_validation_error_contains("species");
}

#[tokio::test]
async fn body_validation_and_passthrough() {
    let test = app(config());
    test.post("/pets")
        .json(&json!({ "age": 3 }))
        .send()
        .await
        .assert_validation_error_contains("name");
    test.post("/pets")
        .json(&json!({ "name": "Rex", "age": 3 }))
        .send()
        .await
        .assert_created()
        .assert_json_path("pet.name", "Rex");
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let test = app(config().body_limit(16));
    test.post("/pets")
        .json(&json!({ "name": "a name far longer than sixteen bytes" }))
        .send()
        .await
        .assert_payload_too_large()
        .assert_json_path("success", 0);
}

// ── Configuration ───────────────────────────────────────────────────────────

#[tokio::test]
async fn fields_can_come_from_settings() {
    let settings = AppSettings::from_yaml_str(
        r#"
title: From YAML
fields:
  page: { type: integer, minimum: 1 }
  species: { type: string }
  name: { type: string, minLength: 1 }
  age: { type: integer }
"#,
    )
    .unwrap();
    let test = app(AppConfig::from_settings(settings).route_tag(pets_tag()));
    test.get("/pets").query("page", 0).send().await.assert_bad_request();
    test.get("/pets").query("page", 1).send().await.assert_ok();
    test.get("/api-docs/openapi.json")
        .send()
        .await
        .assert_json_path("info.title", "From YAML");
}

#[test]
fn conflicting_field_rules_fail_the_build() {
    let config = config().field("page", ValidationRule::string());
    let err = nestoi::build(config).unwrap_err();
    assert!(matches!(err, NestoiError::ConflictingField(ref field) if field == "page"));
}

#[test]
fn body_field_without_rule_fails_the_build() {
    let tag = RouteTag::new("users", "Users").route(
        "/users",
        RouteMethods::new().post(
            RouteHandler::new()
                .schema(RouteSchema::new().body(["*nick"]))
                .handler(Endpoint::new(|| async { "created" })),
        ),
    );
    let err = nestoi::build(AppConfig::new().route_tag(tag)).unwrap_err();
    assert!(matches!(err, NestoiError::UnknownField { ref field, .. } if field == "nick"));
}

#[test]
fn invalid_rule_fails_the_build() {
    let config = AppConfig::new().field("broken", ValidationRule::from(json!({ "type": 12 })));
    let err = nestoi::build(config).unwrap_err();
    assert!(matches!(err, NestoiError::InvalidRule { .. }));
}

#[tokio::test]
async fn custom_security_scheme_replaces_bearer() {
    let config = config().security_scheme("apiKey", SecurityScheme::api_key("x-api-key", ApiKeyLocation::Header));
    app(config)
        .get("/api-docs/openapi.json")
        .send()
        .await
        .assert_json_path("components.securitySchemes.len()", 1)
        .assert_json_path("paths./pets.get.security[0].apiKey", json!([]));
}

#[tokio::test]
async fn security_requirements_follow_declaration_order() {
    let config = config()
        .security_scheme("zeta", SecurityScheme::bearer_auth())
        .security_scheme("alpha", SecurityScheme::api_key("x-api-key", ApiKeyLocation::Header));
    app(config)
        .get("/api-docs/openapi.json")
        .send()
        .await
        .assert_json_path("paths./pets.get.security", json!([{ "zeta": [] }, { "alpha": [] }]));
}

// ── Layers ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn global_middlewares_run_in_order_before_tag_middlewares() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let tag = RouteTag::new("t", "t").middleware(recorder(log.clone(), "tag")).route(
        "/ping",
        RouteMethods::new().get(RouteHandler::new().handler(Endpoint::new(|| async { "pong" }))),
    );
    let config = AppConfig::new()
        .middleware(recorder(log.clone(), "first"))
        .middleware(recorder(log.clone(), "second"))
        .route_tag(tag);

    app(config).get("/ping").send().await.assert_ok();
    assert_eq!(*log.lock().unwrap(), vec!["first", "second", "tag"]);
}

#[tokio::test]
async fn hardening_headers_are_present() {
    app(config())
        .get("/")
        .header("origin", "https://example.com")
        .send()
        .await
        .assert_ok()
        .assert_header("x-content-type-options", "nosniff")
        .assert_header("x-frame-options", "SAMEORIGIN")
        .assert_header("access-control-allow-origin", "*");
}

#[tokio::test]
async fn rate_limit_is_per_client() {
    let test = app(config().rate_limit(2, 15));
    let alice: SocketAddr = "10.0.0.1:5000".parse().unwrap();
    let bob: SocketAddr = "10.0.0.2:5000".parse().unwrap();

    test.get("/").remote_addr(alice).send().await.assert_ok();
    test.get("/").remote_addr(alice).send().await.assert_ok();
    let resp = test.get("/").remote_addr(alice).send().await.assert_too_many_requests();
    assert_eq!(resp.text(), "Too many requests, please try again later.");
    test.get("/").remote_addr(bob).send().await.assert_ok();
}

#[tokio::test]
async fn zero_rate_limit_does_not_block_requests() {
    let test = app(config().rate_limit(0, 0));
    for _ in 0..3 {
        test.get("/").send().await.assert_ok();
    }
}

// ── Serving ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn serves_over_tcp_until_shutdown() {
    let router = nestoi::build(config()).unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(nestoi::serve_with_shutdown(listener, router, async {
        let _ = rx.await;
    }));

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /pets/9 HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();
    assert!(raw.starts_with("HTTP/1.1 200"));
    assert!(raw.ends_with("pet 9"));

    tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}
