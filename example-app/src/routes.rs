use nestoi::prelude::*;
use serde_json::json;

use crate::models::{CreateUserRequest, ListParams};
use crate::services::UserService;
use crate::API_KEY_HEADER;

/// The `users` tag: list, create, show, delete and search.
pub fn users(service: UserService, api_key: &str) -> RouteTag {
    RouteTag::new("users", "User directory")
        .middleware(audit())
        .route(
            "/users",
            RouteMethods::new()
                .get(
                    RouteHandler::new()
                        .summary("List users")
                        .schema(RouteSchema::new().query(["limit"]))
                        .handler(list_users(service.clone())),
                )
                .post(
                    RouteHandler::new()
                        .summary("Create a user")
                        .schema(RouteSchema::new().body(["*name", "*email"]))
                        .handler(create_user(service.clone())),
                ),
        )
        .route(
            "/users/search",
            RouteMethods::new().method(
                "search",
                RouteHandler::new()
                    .summary("Find users by exact name")
                    .schema(RouteSchema::new().query(["*name"]))
                    .handler(search_users(service.clone())),
            ),
        )
        .route(
            "/users/{id}",
            RouteMethods::new()
                .get(
                    RouteHandler::new()
                        .summary("Show a user")
                        .schema(RouteSchema::new().params(["*id"]))
                        .handler(show_user(service.clone())),
                )
                .delete(
                    RouteHandler::new()
                        .summary("Delete a user")
                        .schema(RouteSchema::new().params(["*id"]))
                        .middleware(require_api_key(api_key))
                        .handler(delete_user(service)),
                ),
        )
}

fn list_users(service: UserService) -> Endpoint {
    Endpoint::new(move |Query(params): Query<ListParams>| {
        let service = service.clone();
        async move { Json(json!({ "success": 1, "data": service.list(params.limit).await })) }
    })
}

fn create_user(service: UserService) -> Endpoint {
    Endpoint::new(move |Json(body): Json<CreateUserRequest>| {
        let service = service.clone();
        async move {
            let user = service.create(body.name, body.email).await;
            (StatusCode::CREATED, Json(json!({ "success": 1, "data": user })))
        }
    })
}

fn search_users(service: UserService) -> Endpoint {
    Endpoint::new(move |Query(query): Query<std::collections::HashMap<String, String>>| {
        let service = service.clone();
        async move {
            let name = query.get("name").cloned().unwrap_or_default();
            let found: Vec<_> = service
                .list(None)
                .await
                .into_iter()
                .filter(|u| u.name == name)
                .collect();
            Json(json!({ "success": 1, "data": found }))
        }
    })
}

fn show_user(service: UserService) -> Endpoint {
    Endpoint::new(move |Path(id): Path<u64>| {
        let service = service.clone();
        async move {
            match service.get_by_id(id).await {
                Some(user) => (StatusCode::OK, Json(json!({ "success": 1, "data": user }))),
                None => (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "success": 0, "msg": format!("user {id} not found") })),
                ),
            }
        }
    })
}

fn delete_user(service: UserService) -> Endpoint {
    Endpoint::new(move |Path(id): Path<u64>| {
        let service = service.clone();
        async move {
            if service.delete(id).await {
                StatusCode::NO_CONTENT
            } else {
                StatusCode::NOT_FOUND
            }
        }
    })
}

fn audit() -> Middleware {
    Middleware::from_fn(|req: Request, next: Next| async move {
        tracing::debug!(method = %req.method(), path = %req.uri().path(), "users route hit");
        next.run(req).await
    })
}

fn require_api_key(expected: &str) -> Middleware {
    let expected = expected.to_string();
    Middleware::from_fn(move |req: Request, next: Next| {
        let authorized = req
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == expected);
        async move {
            if authorized {
                next.run(req).await
            } else {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "success": 0, "msg": "Unauthorized" })),
                )
                    .into_response()
            }
        }
    })
}
