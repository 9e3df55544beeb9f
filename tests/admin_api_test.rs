mod common;

use axum::http::StatusCode;
use common::{id_of, onboard_customer, product_body, TestApp};
use insureinfra_core::domain::Role;
use serde_json::json;

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = TestApp::new();

    let res = app.send("GET", "/api/admin/products", None, None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["status"], 401);
}

#[tokio::test]
async fn test_customer_token_is_forbidden_on_admin_routes() {
    let app = TestApp::new();
    let (_, token) = app.login("founder@techflow.io", Role::Customer).await;

    let res = app.get("/api/admin/products", &token).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let admin = app.admin().await;
    let res = app.get("/api/admin/products", &admin).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_token_is_forbidden_on_customer_routes() {
    let app = TestApp::new();
    let admin = app.admin().await;

    let res = app.get("/api/customer/products", &admin).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let app = TestApp::new();

    let res = app.get("/api/auth/session", "not-a-jwt").await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_endpoint_echoes_claims() {
    let app = TestApp::new();
    let (user, token) = app.login("founder@techflow.io", Role::Customer).await;

    let res = app.get("/api/auth/session", &token).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["sub"], user.id.to_string());
    assert_eq!(res.body["role"], "customer");
}

#[tokio::test]
async fn test_product_coverage_bounds_are_enforced() {
    let app = TestApp::new();
    let admin = app.admin().await;

    let res = app
        .post(
            "/api/admin/products",
            &admin,
            product_body("Device Protection", "50", "5000", "5000"),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body["error"].as_str().unwrap().contains("coverage_max"));

    let res = app
        .post(
            "/api/admin/products",
            &admin,
            product_body("Device Protection", "50", "9000", "5000"),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    for (base, max) in [("49.999", "5000"), ("50", "1e2000000")] {
        let res = app
            .post(
                "/api/admin/products",
                &admin,
                product_body("Device Protection", base, "1000", max),
            )
            .await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{}", res.text);
    }

    let list = app.get("/api/admin/products", &admin).await;
    assert_eq!(list.body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_product_lifecycle() {
    let app = TestApp::new();
    let admin = app.admin().await;

    let created = app
        .post(
            "/api/admin/products",
            &admin,
            product_body("Device Protection", "50", "1000", "100000"),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["status"], "active");
    let id = id_of(&created.body);

    let updated = app
        .patch(
            &format!("/api/admin/products/{}", id),
            &admin,
            json!({ "base_price": "75", "status": "archived" }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["status"], "archived");

    let invalid = app
        .patch(
            &format!("/api/admin/products/{}", id),
            &admin,
            json!({ "coverage_min": "200000" }),
        )
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);

    let archived = app.get("/api/admin/products?status=archived", &admin).await;
    assert_eq!(archived.body.as_array().unwrap().len(), 1);

    let deleted = app
        .send("DELETE", &format!("/api/admin/products/{}", id), Some(&admin), None)
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let missing = app.get(&format!("/api/admin/products/{}", id), &admin).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let trail = app
        .get(&format!("/api/admin/audit-logs?entity_id={}", id), &admin)
        .await;
    let actions: Vec<&str> = trail
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions.len(), 3);
    assert!(actions.contains(&"created"));
    assert!(actions.contains(&"updated"));
    assert!(actions.contains(&"deleted"));
}

#[tokio::test]
async fn test_startup_search_and_kyc_filter() {
    let app = TestApp::new();
    let admin = app.admin().await;
    let (_, techflow) = onboard_customer(&app, "ada@techflow.io", "TechFlow Hardware").await;
    onboard_customer(&app, "bo@greenleaf.io", "GreenLeaf Foods").await;

    let res = app
        .get("/api/admin/startups?search=Tech", &admin)
        .await;
    let names: Vec<&str> = res
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["company_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["TechFlow Hardware"]);

    let verified = app
        .patch(
            &format!("/api/admin/startups/{}", techflow),
            &admin,
            json!({ "kyc_status": "verified", "risk_score": 35 }),
        )
        .await;
    assert_eq!(verified.status, StatusCode::OK);
    assert_eq!(verified.body["risk_score"], 35);

    let res = app.get("/api/admin/startups?kyc_status=verified", &admin).await;
    assert_eq!(res.body.as_array().unwrap().len(), 1);

    let res = app.get("/api/admin/startups?kyc_status=pending&limit=10", &admin).await;
    assert_eq!(res.body.as_array().unwrap().len(), 1);

    let bad_score = app
        .patch(
            &format!("/api/admin/startups/{}", techflow),
            &admin,
            json!({ "risk_score": 140 }),
        )
        .await;
    assert_eq!(bad_score.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_calculate_premium() {
    let app = TestApp::new();
    let admin = app.admin().await;

    let res = app
        .post(
            "/api/admin/calculate-premium",
            &admin,
            json!({ "base_price": "50", "product_price": "25000" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["premium_amount"], "150.00");
    assert_eq!(res.body["total_amount"], "25150.00");

    let res = app
        .post(
            "/api/admin/calculate-premium",
            &admin,
            json!({ "base_price": "50", "product_price": "10000" }),
        )
        .await;
    assert_eq!(res.body["premium_amount"], "50.00");

    let res = app
        .post(
            "/api/admin/calculate-premium",
            &admin,
            json!({ "product_price": "10000" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .post(
            "/api/admin/calculate-premium",
            &admin,
            json!({ "base_price": "-5", "product_price": "10000" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .post(
            "/api/admin/calculate-premium",
            &admin,
            json!({ "base_price": "50", "product_price": "1e-2000000" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.text.contains("product_price"), "{}", res.text);
}

#[tokio::test]
async fn test_settings_are_upserted() {
    let app = TestApp::new();
    let admin = app.admin().await;

    let res = app
        .put(
            "/api/admin/settings/claims.auto_review_limit",
            &admin,
            json!({ "value": { "amount": "500" } }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);

    app.put(
        "/api/admin/settings/claims.auto_review_limit",
        &admin,
        json!({ "value": { "amount": "750" } }),
    )
    .await;

    let res = app.get("/api/admin/settings", &admin).await;
    let settings = res.body.as_array().unwrap();
    assert_eq!(settings.len(), 1);
    assert_eq!(settings[0]["value"]["amount"], "750");
}

#[tokio::test]
async fn test_users_are_listed() {
    let app = TestApp::new();
    let admin = app.admin().await;
    app.login("founder@techflow.io", Role::Customer).await;

    let res = app.get("/api/admin/users?limit=1", &admin).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body.as_array().unwrap().len(), 1);
    assert!(res.body[0].get("password_hash").is_none());
}

#[tokio::test]
async fn test_health_without_dependencies() {
    let app = TestApp::new();

    let res = app.send("GET", "/health", None, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "healthy");
    assert!(res.headers.contains_key("x-request-id"));
}
