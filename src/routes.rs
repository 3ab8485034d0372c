// src/routes.rs

use axum::{
    Json, Router,
    http::Method,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    handlers::{auth, favorites, owner, restaurants, reviews, users},
    state::AppState,
    utils::jwt::{auth_middleware, owner_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, users, restaurants, owner).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Database Pool + Config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me));

    // Everything under /users requires a valid token.
    let user_routes = Router::new()
        .route(
            "/profile",
            get(users::get_profile).put(users::update_profile),
        )
        .route("/profile/picture", post(users::upload_profile_picture))
        .route(
            "/preferences",
            get(users::get_preferences).put(users::update_preferences),
        )
        .route("/me/reviews", get(reviews::list_my_reviews))
        .route("/me/favorites", get(favorites::list_my_favorites))
        .route("/me/history", get(favorites::get_history))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Reads are public; mutations authenticate through the Claims extractor.
    let restaurant_routes = Router::new()
        .route(
            "/",
            get(restaurants::search_restaurants).post(restaurants::create_restaurant),
        )
        .route("/me/listings", get(restaurants::list_my_restaurants))
        .route(
            "/{id}",
            get(restaurants::get_restaurant)
                .put(restaurants::update_restaurant)
                .delete(restaurants::delete_restaurant),
        )
        .route(
            "/{id}/reviews",
            get(reviews::list_reviews).post(reviews::create_review),
        )
        .route(
            "/{id}/reviews/{review_id}",
            put(reviews::update_review).delete(reviews::delete_review),
        )
        .route(
            "/{id}/favorite",
            post(favorites::add_favorite).delete(favorites::remove_favorite),
        );

    let owner_routes = Router::new()
        .route("/restaurants", get(owner::list_owner_restaurants))
        .route("/restaurants/{id}", put(owner::update_owner_restaurant))
        .route(
            "/restaurants/{id}/reviews",
            get(owner::list_owner_restaurant_reviews),
        )
        .route("/claim", post(owner::claim_restaurant))
        .route("/claims", get(owner::list_claims))
        .route("/claims/{id}", delete(owner::withdraw_claim))
        .route("/dashboard/{id}", get(owner::dashboard))
        // Double middleware protection: Auth first, then Owner-role check
        .layer(middleware::from_fn(owner_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let uploads = ServeDir::new(&state.config.upload_dir);

    Router::new()
        .route("/", get(root))
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/restaurants", restaurant_routes)
        .nest("/owner", owner_routes)
        .nest_service("/uploads", uploads)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Liveness message.
async fn root() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "dinely API is running!" }))
}
