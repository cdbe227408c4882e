//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use api::config::Config;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use checkout::InMemoryOrderService;
use common::ObjectId;
use domain::{InMemoryProductCatalog, ProductSnapshot};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
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

const TEACHER: &str = "teacher-1";

struct TestApp {
    app: axum::Router,
    orders: InMemoryOrderService,
    product: ObjectId,
}

fn setup() -> TestApp {
    let catalog = InMemoryProductCatalog::new();
    let product = ObjectId::new();
    catalog.insert(
        product,
        ProductSnapshot::new("Microscope", 120.5, "scope.png").with_topic("Biology"),
    );
    let orders = InMemoryOrderService::new();

    let state = api::create_in_memory_state(
        Arc::new(catalog),
        Arc::new(orders.clone()),
        &Config::default(),
    );
    let app = api::create_app(state, get_metrics_handle());

    TestApp {
        app,
        orders,
        product,
    }
}

fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", TEACHER);
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

async fn add(test: &TestApp, student: &str, quantity: i64) -> (StatusCode, Value) {
    send(
        &test.app,
        request(
            "POST",
            "/api/v1/cart/items",
            Some(json!({
                "student_id": student,
                "product_id": test.product.to_hex(),
                "quantity": quantity
            })),
        ),
    )
    .await
}

fn shipping() -> Value {
    json!({
        "email": "teacher@school.edu",
        "types": "cod",
        "street": "1 Main St",
        "city": "Springfield",
        "country": "US",
        "phone": "555-0100"
    })
}

#[tokio::test]
async fn test_health_check() {
    let test = setup();

    let response = test
        .app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let test = setup();

    let response = test
        .app
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn test_add_and_list_cart_items() {
    let test = setup();

    let (status, body) = add(&test, "student-1", 2).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Product has been added to cart");
    assert_eq!(body["data"]["quantity"], 2);
    assert_eq!(body["data"]["product_name"], "Microscope");

    let (status, _) = add(&test, "student-1", 1).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&test.app, request("GET", "/api/v1/cart/items", None)).await;
    assert_eq!(status, StatusCode::OK);
    let carts = body["data"].as_array().unwrap();
    assert_eq!(carts.len(), 1);
    assert_eq!(carts[0]["student_id"], "student-1");
    assert_eq!(carts[0]["items"][0]["quantity"], 3);
    assert_eq!(carts[0]["total_price"], 361.5);
}

#[tokio::test]
async fn test_missing_user_header_is_bad_request() {
    let test = setup();

    let req = Request::builder()
        .uri("/api/v1/cart/items")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&test.app, req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_add_validation_errors() {
    let test = setup();

    let (status, _) = add(&test, "student-1", 0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = add(&test, "student-1", -3).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = add(&test, "  ", 1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "INVALID_IDENTIFIER");

    let (status, body) = send(
        &test.app,
        request(
            "POST",
            "/api/v1/cart/items",
            Some(json!({ "student_id": "student-1", "product_id": "not-hex", "quantity": 1 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "INVALID_IDENTIFIER");
}

#[tokio::test]
async fn test_add_unknown_product_is_not_found() {
    let test = setup();

    let (status, body) = send(
        &test.app,
        request(
            "POST",
            "/api/v1/cart/items",
            Some(json!({
                "student_id": "student-1",
                "product_id": ObjectId::new().to_hex(),
                "quantity": 1
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "PRODUCT_NOT_FOUND");
}

#[tokio::test]
async fn test_update_quantity_increase_and_decrease() {
    let test = setup();
    add(&test, "student-1", 1).await;
    let uri = format!("/api/v1/cart/items/{}", test.product.to_hex());

    let (status, body) = send(
        &test.app,
        request(
            "PUT",
            &uri,
            Some(json!({ "student_id": "student-1", "types": "increase" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["quantity"], 2);

    for expected in [json!(1), Value::Null] {
        let (status, body) = send(
            &test.app,
            request(
                "PUT",
                &uri,
                Some(json!({ "student_id": "student-1", "types": "decrease" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["quantity"], expected);
    }

    let (status, body) = send(
        &test.app,
        request(
            "PUT",
            &uri,
            Some(json!({ "student_id": "student-1", "types": "decrease" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "ITEM_NOT_FOUND");
}

#[tokio::test]
async fn test_update_quantity_rejects_unknown_type() {
    let test = setup();
    add(&test, "student-1", 1).await;

    let (status, body) = send(
        &test.app,
        request(
            "PUT",
            &format!("/api/v1/cart/items/{}", test.product.to_hex()),
            Some(json!({ "student_id": "student-1", "types": "double" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("increase or decrease"));
}

#[tokio::test]
async fn test_remove_item() {
    let test = setup();
    add(&test, "student-1", 4).await;
    let uri = format!("/api/v1/cart/items/{}", test.product.to_hex());
    let body = json!({ "student_id": "student-1" });

    let (status, removed) = send(&test.app, request("DELETE", &uri, Some(body.clone()))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(removed["message"], "Product deleted successfully");
    assert_eq!(removed["data"]["quantity"], 4);

    let (status, _) = send(&test.app, request("DELETE", &uri, Some(body))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_clear_archives_history() {
    let test = setup();
    add(&test, "student-1", 2).await;
    add(&test, "student-2", 1).await;

    let (status, body) = send(&test.app, request("DELETE", "/api/v1/cart/items", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["carts_cleared"], 2);
    assert_eq!(body["data"]["items_archived"], 2);

    let (status, body) = send(
        &test.app,
        request("GET", "/api/v1/admin/cart/history?teacher_id=teacher-1", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["teacher_id"], TEACHER);
    let students = body["data"]["students"].as_array().unwrap();
    assert_eq!(students.len(), 2);
    for student in students {
        let kinds: Vec<_> = student["events"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["event_type"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(kinds, ["add", "order"]);
    }
}

#[tokio::test]
async fn test_admin_carts_grouped_by_teacher() {
    let test = setup();
    add(&test, "student-1", 1).await;
    add(&test, "student-2", 1).await;

    let (status, body) = send(&test.app, request("GET", "/api/v1/admin/cart", None)).await;
    assert_eq!(status, StatusCode::OK);
    let groups = body["data"].as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["teacher_id"], TEACHER);
    assert_eq!(groups[0]["carts"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_admin_history_requires_teacher_id() {
    let test = setup();

    let (status, body) =
        send(&test.app, request("GET", "/api/v1/admin/cart/history", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "INVALID_IDENTIFIER");
}

#[tokio::test]
async fn test_checkout_places_order_and_clears_carts() {
    let test = setup();
    add(&test, "student-1", 2).await;

    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/cart/items/checkout")
        .header("x-user-id", TEACHER)
        .header("authorization", "Bearer abc")
        .header("content-type", "application/json")
        .body(Body::from(shipping().to_string()))
        .unwrap();
    let (status, body) = send(&test.app, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Checkout successfully");
    assert_eq!(body["data"]["state"], "completed");
    assert_eq!(body["data"]["cleared"]["items_archived"], 1);

    let placed = test.orders.orders();
    assert_eq!(placed.len(), 1);
    assert_eq!(placed[0].auth_token.as_deref(), Some("Bearer abc"));
    assert_eq!(placed[0].request.teacher_id.as_str(), TEACHER);

    let (_, body) = send(&test.app, request("GET", "/api/v1/cart/items", None)).await;
    assert_eq!(body["data"][0]["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_checkout_validation_makes_no_remote_call() {
    let test = setup();
    let mut form = shipping();
    form["street"] = json!("");

    let (status, body) = send(
        &test.app,
        request("POST", "/api/v1/cart/items/checkout", Some(form)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("street cannot be empty"));
    assert_eq!(test.orders.call_count(), 0);
}

#[tokio::test]
async fn test_checkout_rejected_keeps_cart() {
    let test = setup();
    add(&test, "student-1", 1).await;
    test.orders.set_reject(500, "ORDER_FAILED", "warehouse offline");

    let (status, body) = send(
        &test.app,
        request("POST", "/api/v1/cart/items/checkout", Some(shipping())),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error_code"], "ORDER_REJECTED");

    let (_, body) = send(&test.app, request("GET", "/api/v1/cart/items", None)).await;
    assert_eq!(body["data"][0]["items"][0]["quantity"], 1);
}

#[tokio::test]
async fn test_checkout_transport_failure_is_bad_gateway() {
    let test = setup();
    test.orders.set_fail_on_transport(true);

    let (status, body) = send(
        &test.app,
        request("POST", "/api/v1/cart/items/checkout", Some(shipping())),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error_code"], "UPSTREAM_UNAVAILABLE");
}

#[tokio::test]
async fn test_missing_or_malformed_body_uses_error_envelope() {
    let test = setup();
    add(&test, "student-1", 1).await;
    let uri = format!("/api/v1/cart/items/{}", test.product.to_hex());

    for method in ["PUT", "DELETE"] {
        let (status, body) = send(&test.app, request(method, &uri, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "INVALID_REQUEST");
        assert!(body["error"].is_string());
    }

    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/cart/items")
        .header("x-user-id", TEACHER)
        .header("content-type", "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let (status, body) = send(&test.app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "INVALID_REQUEST");

    let (_, body) = send(&test.app, request("GET", "/api/v1/cart/items", None)).await;
    assert_eq!(body["data"][0]["items"][0]["quantity"], 1);
}

#[tokio::test]
async fn test_quantity_beyond_limit_is_rejected_without_write() {
    let test = setup();

    let (status, body) = add(&test, "student-1", 3_000_000_000).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "INVALID_REQUEST");

    let (_, body) = send(&test.app, request("GET", "/api/v1/cart/items", None)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let (_, body) = send(
        &test.app,
        request("GET", "/api/v1/admin/cart/history?teacher_id=teacher-1", None),
    )
    .await;
    assert_eq!(body["data"]["students"].as_array().unwrap().len(), 0);
}
