//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::Money;
use doc_store::InMemoryDocStore;
use domain::{Product, ProductId, StoreFront, StoreId};
use ledger::{InMemoryLedger, User};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> (axum::Router, InMemoryLedger, InMemoryDocStore) {
    let ledger = InMemoryLedger::new();
    ledger.insert_user(User {
        username: "ada".to_string(),
        password_hash: api::auth::hash_password("s3cret").unwrap(),
        national_id: "12345678".into(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
    });
    ledger.insert_account("ACC-BUYER", "12345678", Money::from_cents(10_000));
    ledger.insert_account("ACC-STORE-A", "11111111", Money::zero());
    ledger.insert_account("ACC-STORE-B", "22222222", Money::zero());

    let docs = InMemoryDocStore::new();
    docs.insert_store(StoreFront {
        id: StoreId::new("store-a"),
        name: "Store A".to_string(),
        payout_account: "ACC-STORE-A".into(),
    });
    docs.insert_store(StoreFront {
        id: StoreId::new("store-b"),
        name: "Store B".to_string(),
        payout_account: "ACC-STORE-B".into(),
    });
    docs.insert_product(Product {
        id: ProductId::new("p-a"),
        name: "Widget".to_string(),
        sku: "SKU-A".to_string(),
        price: Money::from_cents(3000),
        store_id: StoreId::new("store-a"),
    });
    docs.insert_product(Product {
        id: ProductId::new("p-b"),
        name: "Gadget".to_string(),
        sku: "SKU-B".to_string(),
        price: Money::from_cents(2000),
        store_id: StoreId::new("store-b"),
    });

    let state = api::create_state(ledger.clone(), docs.clone(), Duration::from_secs(300));
    let app = api::create_app(state, get_metrics_handle());
    (app, ledger, docs)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn login(app: &axum::Router, username: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from(format!(
                    "username={username}&password={password}"
                )))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["token_type"], "bearer");
    json["access_token"].as_str().unwrap().to_string()
}

async fn add_to_cart(app: &axum::Router, token: &str, product_id: &str, quantity: u32) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/cart/items")
                .header("content-type", "application/json")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::from(
                    serde_json::json!({ "product_id": product_id, "quantity": quantity })
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_check() {
    let (app, _, _) = setup();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_login_and_account_info() {
    let (app, _, _) = setup();
    let token = login(&app, "ada", "s3cret").await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/me/info")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["username"], "ada");
    assert_eq!(json["first_name"], "Ada");
    assert_eq!(json["account_number"], "ACC-BUYER");
    assert_eq!(json["balance_cents"], 10_000);
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let (app, _, _) = setup();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from("username=ada&password=wrong"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let (app, _, _) = setup();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/cart")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_list_products() {
    let (app, _, _) = setup();
    let token = login(&app, "ada", "s3cret").await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/products")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let products = body_json(response).await;
    assert_eq!(products.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_cart_lifecycle() {
    let (app, _, _) = setup();
    let token = login(&app, "ada", "s3cret").await;

    // Empty to begin with
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/cart")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["exists"], false);

    add_to_cart(&app, &token, "p-a", 2).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/cart")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["exists"], true);
    assert_eq!(json["cart"]["total_cents"], 6000);
    assert_eq!(json["cart"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(json["cart"]["subtotals"][0]["store_id"], "store-a");
}

#[tokio::test]
async fn test_checkout_happy_path() {
    let (app, ledger, docs) = setup();
    let token = login(&app, "ada", "s3cret").await;

    add_to_cart(&app, &token, "p-a", 1).await;
    add_to_cart(&app, &token, "p-b", 1).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/orders")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["status"], "COMPLETED");
    assert_eq!(json["total_cents"], 5000);
    assert!(json["order_number"].as_str().unwrap().starts_with("ORD-"));

    assert_eq!(
        ledger.balance(&"ACC-BUYER".into()),
        Some(Money::from_cents(5000))
    );
    assert_eq!(
        ledger.balance(&"ACC-STORE-A".into()),
        Some(Money::from_cents(3000))
    );
    assert_eq!(
        ledger.balance(&"ACC-STORE-B".into()),
        Some(Money::from_cents(2000))
    );
    assert_eq!(docs.order_count(), 1);

    // The cart is gone afterwards
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/cart")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["exists"], false);
}

#[tokio::test]
async fn test_checkout_insufficient_funds() {
    let (app, ledger, docs) = setup();
    let token = login(&app, "ada", "s3cret").await;

    add_to_cart(&app, &token, "p-a", 1).await;
    ledger.insert_account("ACC-BUYER", "12345678", Money::from_cents(100));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/orders")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INSUFFICIENT_FUNDS");

    assert_eq!(ledger.movement_count(), 0);
    assert_eq!(docs.order_count(), 0);

    // The cart survives
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/cart")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["exists"], true);
}

#[tokio::test]
async fn test_checkout_empty_cart() {
    let (app, _, _) = setup();
    let token = login(&app, "ada", "s3cret").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/orders")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "CART_EMPTY");
}

#[tokio::test]
async fn test_checkout_idempotency_key_replay() {
    let (app, ledger, docs) = setup();
    let token = login(&app, "ada", "s3cret").await;

    add_to_cart(&app, &token, "p-a", 1).await;

    let request = |app: &axum::Router| {
        app.clone().oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/orders")
                .header("authorization", format!("Bearer {token}"))
                .header("idempotency-key", "retry-1")
                .body(Body::empty())
                .unwrap(),
        )
    };

    let first = body_json(request(&app).await.unwrap()).await;
    let movements = ledger.movement_count();

    let second_response = request(&app).await.unwrap();
    assert_eq!(second_response.status(), StatusCode::CREATED);
    let second = body_json(second_response).await;

    assert_eq!(second["order_number"], first["order_number"]);
    assert_eq!(ledger.movement_count(), movements);
    assert_eq!(docs.order_count(), 1);
}

#[tokio::test]
async fn test_transfer() {
    let (app, ledger, _) = setup();
    let token = login(&app, "ada", "s3cret").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/transfers")
                .header("content-type", "application/json")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::from(
                    serde_json::json!({
                        "source_account": "ACC-BUYER",
                        "destination_account": "ACC-STORE-A",
                        "amount_cents": 2500
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["status"], "COMPLETED");
    assert_eq!(
        ledger.balance(&"ACC-BUYER".into()),
        Some(Money::from_cents(7500))
    );
}

#[tokio::test]
async fn test_transfer_from_foreign_account_is_forbidden() {
    let (app, ledger, _) = setup();
    let token = login(&app, "ada", "s3cret").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/transfers")
                .header("content-type", "application/json")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::from(
                    serde_json::json!({
                        "source_account": "ACC-STORE-A",
                        "destination_account": "ACC-BUYER",
                        "amount_cents": 100
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "FORBIDDEN");
    assert_eq!(ledger.movement_count(), 0);
}

#[tokio::test]
async fn test_movements_after_transfer() {
    let (app, _, _) = setup();
    let token = login(&app, "ada", "s3cret").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/transfers")
                .header("content-type", "application/json")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::from(
                    serde_json::json!({
                        "source_account": "ACC-BUYER",
                        "destination_account": "ACC-STORE-A",
                        "amount_cents": 1000
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/me/movements")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let movements = body_json(response).await;
    assert_eq!(movements.as_array().unwrap().len(), 1);
    assert_eq!(movements[0]["amount_cents"], 1000);
    assert_eq!(movements[0]["destination_account"], "ACC-STORE-A");
}

#[tokio::test]
async fn test_create_review() {
    let (app, _, docs) = setup();
    let token = login(&app, "ada", "s3cret").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/reviews")
                .header("content-type", "application/json")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::from(
                    serde_json::json!({ "score": 9, "comment": "Great" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert!(json["review_id"].as_str().is_some());
    assert_eq!(docs.review_count(), 1);
}

#[tokio::test]
async fn test_review_with_invalid_score() {
    let (app, _, docs) = setup();
    let token = login(&app, "ada", "s3cret").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/reviews")
                .header("content-type", "application/json")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::from(serde_json::json!({ "score": 0 }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION");
    assert_eq!(docs.review_count(), 0);
}
