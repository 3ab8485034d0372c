// tests/owner_tests.rs
//
// Claim workflow and owner dashboard flows.

use dinely::{config::Config, routes, state::AppState};
use sqlx::postgres::PgPoolOptions;

async fn spawn_app() -> String {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Make sure DATABASE_URL is set.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        upload_dir: std::env::temp_dir()
            .join("dinely-test-uploads")
            .to_string_lossy()
            .into_owned(),
        rust_log: "error".to_string(),
    };

    let state = AppState { pool, config };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

async fn signup(client: &reqwest::Client, address: &str, role: &str) -> String {
    let email = format!("u_{}@example.com", &uuid::Uuid::new_v4().to_string()[..8]);

    let response = client
        .post(format!("{}/auth/signup", address))
        .json(&serde_json::json!({
            "name": "Owner Tester",
            "email": email,
            "password": "password123",
            "role": role
        }))
        .send()
        .await
        .expect("Signup failed");
    assert_eq!(response.status().as_u16(), 201);

    let body: serde_json::Value = response.json().await.unwrap();
    body["access_token"].as_str().unwrap().to_string()
}

async fn create_restaurant(client: &reqwest::Client, address: &str, token: &str) -> i64 {
    let response = client
        .post(format!("{}/restaurants", address))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "name": format!("Bistro {}", &uuid::Uuid::new_v4().to_string()[..8])
        }))
        .send()
        .await
        .expect("Create restaurant failed");
    assert_eq!(response.status().as_u16(), 201);

    let body: serde_json::Value = response.json().await.unwrap();
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn owner_routes_require_owner_role() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let regular = signup(&client, &address, "user").await;
    let response = client
        .get(format!("{}/owner/restaurants", address))
        .bearer_auth(&regular)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let anonymous = client
        .get(format!("{}/owner/restaurants", address))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status().as_u16(), 401);
}

#[tokio::test]
async fn claim_is_auto_approved_and_flips_ownership() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // A regular user lists the restaurant; it starts unclaimed.
    let lister = signup(&client, &address, "user").await;
    let restaurant_id = create_restaurant(&client, &address, &lister).await;

    let owner = signup(&client, &address, "owner").await;
    let claim: serde_json::Value = client
        .post(format!("{}/owner/claim", address))
        .bearer_auth(&owner)
        .json(&serde_json::json!({ "restaurant_id": restaurant_id }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(claim["status"].as_str().unwrap(), "approved");

    // Ownership and the claimed flag flip together.
    let restaurant: serde_json::Value = client
        .get(format!("{}/restaurants/{}", address, restaurant_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(restaurant["is_claimed"].as_bool().unwrap(), true);
    assert_eq!(
        restaurant["owner_id"].as_i64().unwrap(),
        claim["user_id"].as_i64().unwrap()
    );

    // The new owner sees it under /owner/restaurants.
    let owned: serde_json::Value = client
        .get(format!("{}/owner/restaurants", address))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(
        owned
            .as_array()
            .unwrap()
            .iter()
            .any(|r| r["id"].as_i64() == Some(restaurant_id))
    );
}

#[tokio::test]
async fn claiming_anothers_restaurant_conflicts() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let lister = signup(&client, &address, "user").await;
    let restaurant_id = create_restaurant(&client, &address, &lister).await;

    let first_owner = signup(&client, &address, "owner").await;
    let response = client
        .post(format!("{}/owner/claim", address))
        .bearer_auth(&first_owner)
        .json(&serde_json::json!({ "restaurant_id": restaurant_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    let second_owner = signup(&client, &address, "owner").await;
    let response = client
        .post(format!("{}/owner/claim", address))
        .bearer_auth(&second_owner)
        .json(&serde_json::json!({ "restaurant_id": restaurant_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn claim_on_missing_restaurant_not_found() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let owner = signup(&client, &address, "owner").await;
    let response = client
        .post(format!("{}/owner/claim", address))
        .bearer_auth(&owner)
        .json(&serde_json::json!({ "restaurant_id": 999_999_999 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn approved_claim_cannot_be_withdrawn() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let lister = signup(&client, &address, "user").await;
    let restaurant_id = create_restaurant(&client, &address, &lister).await;

    let owner = signup(&client, &address, "owner").await;
    let claim: serde_json::Value = client
        .post(format!("{}/owner/claim", address))
        .bearer_auth(&owner)
        .json(&serde_json::json!({ "restaurant_id": restaurant_id }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let claim_id = claim["id"].as_i64().unwrap();

    // Terminal state: withdrawal is a conflict.
    let response = client
        .delete(format!("{}/owner/claims/{}", address, claim_id))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    // The claim still shows up in the listing, approved.
    let listed: serde_json::Value = client
        .get(format!("{}/owner/claims", address))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(
        listed
            .as_array()
            .unwrap()
            .iter()
            .any(|c| c["id"].as_i64() == Some(claim_id)
                && c["status"].as_str() == Some("approved"))
    );
}

#[tokio::test]
async fn dashboard_summarizes_reviews() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let owner = signup(&client, &address, "owner").await;
    let restaurant_id = create_restaurant(&client, &address, &owner).await;

    // Five reviewers: ratings 5, 5, 4, 2, 1.
    for rating in [5, 5, 4, 2, 1] {
        let reviewer = signup(&client, &address, "user").await;
        let response = client
            .post(format!("{}/restaurants/{}/reviews", address, restaurant_id))
            .bearer_auth(&reviewer)
            .json(&serde_json::json!({ "rating": rating }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
    }

    let dashboard: serde_json::Value = client
        .get(format!("{}/owner/dashboard/{}", address, restaurant_id))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(dashboard["total_reviews"].as_i64().unwrap(), 5);
    assert_eq!(dashboard["avg_rating"].as_f64().unwrap(), 3.4);

    let distribution = &dashboard["rating_distribution"];
    assert_eq!(distribution["1"].as_i64().unwrap(), 1);
    assert_eq!(distribution["2"].as_i64().unwrap(), 1);
    assert_eq!(distribution["3"].as_i64().unwrap(), 0);
    assert_eq!(distribution["4"].as_i64().unwrap(), 1);
    assert_eq!(distribution["5"].as_i64().unwrap(), 2);

    let sentiment = &dashboard["sentiment"];
    assert_eq!(sentiment["positive"].as_i64().unwrap(), 3);
    assert_eq!(sentiment["neutral"].as_i64().unwrap(), 0);
    assert_eq!(sentiment["negative"].as_i64().unwrap(), 2);
    assert_eq!(sentiment["positive_pct"].as_f64().unwrap(), 60.0);
    assert_eq!(sentiment["negative_pct"].as_f64().unwrap(), 40.0);

    assert_eq!(dashboard["recent_reviews"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn dashboard_requires_ownership() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let lister = signup(&client, &address, "user").await;
    let restaurant_id = create_restaurant(&client, &address, &lister).await;

    let other_owner = signup(&client, &address, "owner").await;
    let response = client
        .get(format!("{}/owner/dashboard/{}", address, restaurant_id))
        .bearer_auth(&other_owner)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}
