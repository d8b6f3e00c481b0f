//! End-to-end tests for the catalog and order lifecycle.
//!
//! Same requirements as `e2e_auth`. The admin account is created through the
//! API and promoted directly in the database.
//!
//! Run with: cargo test -p emporium-integration-tests -- --ignored

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

use emporium_integration_tests::{api_base_url, e2e_pool, unique_email};

const PASSWORD: &str = "Sup3rSecret";

/// Register, verify through the database, optionally promote, and log in.
async fn account(client: &Client, pool: &PgPool, admin: bool) -> String {
    let base = api_base_url();
    let email = unique_email(if admin { "admin" } else { "shopper" });

    let resp = client
        .post(format!("{base}/api/v1/auth/register"))
        .json(&json!({"email": email, "password": PASSWORD}))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let role = if admin { "admin" } else { "customer" };
    sqlx::query(
        "UPDATE users SET is_verified = TRUE, role = $2::user_role WHERE email = $1",
    )
    .bind(&email)
    .bind(role)
    .execute(pool)
    .await
    .expect("Failed to prepare account");

    let body: Value = client
        .post(format!("{base}/api/v1/auth/login"))
        .json(&json!({"email": email, "password": PASSWORD}))
        .send()
        .await
        .expect("Failed to log in")
        .json()
        .await
        .expect("token body");
    body["access_token"].as_str().expect("access token").to_owned()
}

async fn create_product(client: &Client, admin: &str, stock: i32) -> Value {
    let slug = format!("mug-{}", Uuid::new_v4().simple());
    let resp = client
        .post(format!("{}/api/v1/products", api_base_url()))
        .bearer_auth(admin)
        .json(&json!({
            "name": "Enamel Mug",
            "slug": slug,
            "price_usd": "12.50",
            "price_pln": "50.00",
            "price_eur": "11.50",
            "stock": stock,
            "images": ["https://img.example.com/mug.jpg"],
        }))
        .send()
        .await
        .expect("Failed to create product");
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.expect("product body")
}

async fn product_stock(client: &Client, id: &Value) -> i64 {
    let body: Value = client
        .get(format!("{}/api/v1/products/{id}", api_base_url()))
        .send()
        .await
        .expect("Failed to fetch product")
        .json()
        .await
        .expect("product body");
    body["stock"].as_i64().expect("stock")
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_order_reserves_and_cancel_restores_stock() {
    let client = Client::new();
    let pool = e2e_pool().await;
    let admin = account(&client, &pool, true).await;
    let shopper = account(&client, &pool, false).await;
    let base = api_base_url();

    let product = create_product(&client, &admin, 5).await;
    let id = &product["id"];

    let resp = client
        .post(format!("{base}/api/v1/orders"))
        .bearer_auth(&shopper)
        .json(&json!({
            "shipping_address": "1 Market St",
            "shipping_city": "Krakow",
            "shipping_postal_code": "30-001",
            "shipping_country": "PL",
            "currency": "PLN",
            "items": [{"product_id": id, "quantity": 1}, {"product_id": id, "quantity": 2}],
        }))
        .send()
        .await
        .expect("Failed to place order");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = resp.json().await.expect("order body");

    assert_eq!(order["status"], "pending");
    assert_eq!(order["currency"], "PLN");
    assert_eq!(order["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(order["items"][0]["quantity"], 3);
    assert!(order["order_number"].as_str().is_some_and(|n| n.starts_with("ORD-")));
    assert_eq!(product_stock(&client, id).await, 2);

    let too_many = client
        .post(format!("{base}/api/v1/orders"))
        .bearer_auth(&shopper)
        .json(&json!({
            "shipping_address": "1 Market St",
            "shipping_city": "Krakow",
            "shipping_postal_code": "30-001",
            "shipping_country": "PL",
            "items": [{"product_id": id, "quantity": 3}],
        }))
        .send()
        .await
        .expect("Failed to place order");
    assert_eq!(too_many.status(), StatusCode::BAD_REQUEST);

    let order_id = &order["id"];
    let cancelled = client
        .delete(format!("{base}/api/v1/orders/{order_id}"))
        .bearer_auth(&shopper)
        .send()
        .await
        .expect("Failed to cancel order");
    assert_eq!(cancelled.status(), StatusCode::OK);
    let cancelled: Value = cancelled.json().await.expect("order body");
    assert_eq!(cancelled["status"], "cancelled");
    assert_eq!(product_stock(&client, id).await, 5);

    // Cancelled is terminal
    let again = client
        .put(format!("{base}/api/v1/orders/{order_id}"))
        .bearer_auth(&admin)
        .json(&json!({"status": "paid"}))
        .send()
        .await
        .expect("Failed to update order");
    assert_eq!(again.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_customers_cannot_manage_catalog() {
    let client = Client::new();
    let pool = e2e_pool().await;
    let shopper = account(&client, &pool, false).await;

    let resp = client
        .post(format!("{}/api/v1/categories", api_base_url()))
        .bearer_auth(&shopper)
        .json(&json!({"name": "Mugs", "slug": "mugs"}))
        .send()
        .await
        .expect("Failed to create category");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = resp.json().await.expect("error body");
    assert_eq!(body["detail"], "Not enough permissions");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_category_with_products_cannot_be_deleted() {
    let client = Client::new();
    let pool = e2e_pool().await;
    let admin = account(&client, &pool, true).await;
    let base = api_base_url();

    let slug = format!("cups-{}", Uuid::new_v4().simple());
    let category: Value = client
        .post(format!("{base}/api/v1/categories"))
        .bearer_auth(&admin)
        .json(&json!({"name": "Cups", "slug": slug}))
        .send()
        .await
        .expect("Failed to create category")
        .json()
        .await
        .expect("category body");
    let category_id = &category["id"];

    let product = create_product(&client, &admin, 1).await;
    let resp = client
        .put(format!("{base}/api/v1/products/{}", product["id"]))
        .bearer_auth(&admin)
        .json(&json!({"category_id": category_id}))
        .send()
        .await
        .expect("Failed to update product");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .delete(format!("{base}/api/v1/categories/{category_id}"))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to delete category");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let detail: Value = client
        .get(format!("{base}/api/v1/products/{}", product["id"]))
        .send()
        .await
        .expect("Failed to fetch product")
        .json()
        .await
        .expect("product body");
    assert_eq!(detail["category"]["id"], *category_id);
}
