// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{coins, docs, health, leaderboard, questions, quiz, reference, users},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Public reads: reference data, questions, leaderboard, public profiles.
/// * Authenticated: the caller's profile and quiz sessions.
/// * Admin: coin credits from the payment flow.
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
        HeaderValue::from_static("http://localhost:5173"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let public_routes = Router::new()
        .route("/health", get(health::health))
        .route("/openapi.json", get(docs::openapi_json))
        .route("/questions/categories", get(reference::list_categories))
        .route("/questions/random", get(questions::random_questions))
        .route("/continents", get(reference::list_continents))
        .route("/countries", get(reference::list_countries))
        .route("/coins/packages", get(reference::list_coin_packages))
        .route("/leaderboard", get(leaderboard::get_leaderboard))
        .route("/users/{id}", get(users::get_user))
        .route("/users/{id}/rank", get(users::get_rank));

    let protected_routes = Router::new()
        .route("/users", post(users::create_profile))
        .route("/users/me", get(users::get_me).put(users::update_me))
        .route("/quiz-sessions", post(quiz::create_session))
        .route("/quiz-sessions/{id}", get(quiz::get_session))
        .route("/quiz-sessions/{id}/answers", post(quiz::submit_answer))
        .route("/quiz-sessions/{id}/unlock", post(quiz::unlock_character))
        .route("/quiz-sessions/{id}/complete", post(quiz::complete_session))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Auth first, then the admin check
    let admin_routes = Router::new()
        .route("/coins/credit", post(coins::credit_coins))
        .route_layer(middleware::from_fn(admin_middleware))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(public_routes)
                .merge(protected_routes)
                .nest("/admin", admin_routes),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::{net::SocketAddr, sync::Arc, time::Duration};

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::{
        config::Config,
        models::category::Category,
        services::{
            question_bank::QuestionBank,
            trivia::{RawQuestion, TriviaSource, TriviaSourceError},
        },
        store::{DynStore, MemoryStore},
        utils::jwt::{ROLE_USER, sign_jwt},
    };

    struct NoSource;

    #[async_trait]
    impl TriviaSource for NoSource {
        async fn fetch(&self, _category: Category, _amount: u32) -> Result<Vec<RawQuestion>, TriviaSourceError> {
            Ok(Vec::new())
        }
    }

    fn app() -> Router {
        let store: DynStore = Arc::new(MemoryStore::new());
        let bank = Arc::new(QuestionBank::new(store.clone(), Arc::new(NoSource)));
        let config = Config {
            database_url: None,
            jwt_secret: "router-secret".to_string(),
            rust_log: "error".to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            trivia_api_url: url::Url::parse("http://127.0.0.1:9/").unwrap(),
            trivia_timeout: Duration::from_secs(1),
            log_dir: "logs".to_string(),
        };
        create_router(AppState::new(store, config, bank))
    }

    async fn status(app: Router, req: Request<Body>) -> StatusCode {
        app.oneshot(req).await.unwrap().status()
    }

    #[tokio::test]
    async fn health_is_public() {
        let req = Request::get("/api/health").body(Body::empty()).unwrap();
        assert_eq!(status(app(), req).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn me_requires_bearer_token() {
        let req = Request::get("/api/users/me").body(Body::empty()).unwrap();
        assert_eq!(status(app(), req).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn missing_profile_is_not_found() {
        let token = sign_jwt("nobody", ROLE_USER, "router-secret", 60).unwrap();
        let req = Request::get("/api/users/me")
            .header("Authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        assert_eq!(status(app(), req).await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn credit_is_admin_only() {
        let token = sign_jwt("someone", ROLE_USER, "router-secret", 60).unwrap();
        let req = Request::post("/api/admin/coins/credit")
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/json")
            .body(Body::from(r#"{"user_id":"someone","coins":5}"#))
            .unwrap();
        assert_eq!(status(app(), req).await, StatusCode::FORBIDDEN);
    }
}
