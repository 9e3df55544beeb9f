mod common;

use axum::http::StatusCode;
use common::{id_of, onboard_customer, product_body, TestApp};
use serde_json::{json, Value};

struct Insured {
    customer: String,
    admin: String,
    policy_id: String,
}

/// Walks a startup from profile to an issued policy.
async fn insured_startup(app: &TestApp) -> Insured {
    let admin = app.admin().await;
    let (customer, _) = onboard_customer(app, "ada@techflow.io", "TechFlow Hardware").await;

    let product = app
        .post(
            "/api/admin/products",
            &admin,
            product_body("Device Protection", "50", "1000", "100000"),
        )
        .await;
    let product_id = id_of(&product.body);

    let application = app
        .post(
            "/api/customer/applications",
            &customer,
            json!({ "product_id": product_id, "requested_coverage": "25000" }),
        )
        .await;
    assert_eq!(application.status, StatusCode::CREATED, "{}", application.text);
    assert_eq!(application.body["recommended_premium"], "150.00");
    let application_id = id_of(&application.body);
    let uri = format!("/api/admin/applications/{}", application_id);

    let review = app.patch(&uri, &admin, json!({ "status": "under_review" })).await;
    assert_eq!(review.status, StatusCode::OK);
    assert!(review.body.get("policy").is_none());

    let approved = app.patch(&uri, &admin, json!({ "status": "approved" })).await;
    assert_eq!(approved.status, StatusCode::OK, "{}", approved.text);
    assert_eq!(approved.body["application"]["status"], "approved");
    let policy = &approved.body["policy"];
    assert_eq!(policy["status"], "active");
    assert_eq!(policy["premium"], "150.00");

    Insured {
        customer,
        admin,
        policy_id: id_of(policy),
    }
}

#[tokio::test]
async fn test_application_outside_coverage_is_rejected() {
    let app = TestApp::new();
    let admin = app.admin().await;
    let (customer, _) = onboard_customer(&app, "ada@techflow.io", "TechFlow Hardware").await;
    let product = app
        .post(
            "/api/admin/products",
            &admin,
            product_body("Device Protection", "50", "1000", "100000"),
        )
        .await;

    let res = app
        .post(
            "/api/customer/applications",
            &customer,
            json!({ "product_id": id_of(&product.body), "requested_coverage": "250000" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    for coverage in ["5000.005", "1e-2000000", "1e2000000"] {
        let res = app
            .post(
                "/api/customer/applications",
                &customer,
                json!({ "product_id": id_of(&product.body), "requested_coverage": coverage }),
            )
            .await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{}", res.text);
    }

    let listed = app.get("/api/customer/applications", &customer).await;
    assert_eq!(listed.body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_approval_issues_policy_visible_to_customer() {
    let app = TestApp::new();
    let insured = insured_startup(&app).await;

    let policies = app.get("/api/customer/policies", &insured.customer).await;
    let policies = policies.body.as_array().unwrap();
    assert_eq!(policies.len(), 1);
    assert_eq!(policies[0]["id"], insured.policy_id.as_str());

    let admin_view = app
        .get(&format!("/api/admin/policies/{}", insured.policy_id), &insured.admin)
        .await;
    assert_eq!(admin_view.status, StatusCode::OK);
}

#[tokio::test]
async fn test_approved_application_is_terminal() {
    let app = TestApp::new();
    let insured = insured_startup(&app).await;

    let applications = app.get("/api/customer/applications", &insured.customer).await;
    let id = id_of(&applications.body[0]);

    let res = app
        .patch(
            &format!("/api/admin/applications/{}", id),
            &insured.admin,
            json!({ "status": "rejected" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_claim_status_update_persists_and_illegal_transition_conflicts() {
    let app = TestApp::new();
    let insured = insured_startup(&app).await;

    let filed = app
        .post(
            "/api/customer/claims",
            &insured.customer,
            json!({
                "policy_id": insured.policy_id,
                "amount": "1200.50",
                "description": "Laptop dropped during transit",
            }),
        )
        .await;
    assert_eq!(filed.status, StatusCode::CREATED, "{}", filed.text);
    assert_eq!(filed.body["status"], "new");
    let uri = format!("/api/admin/claims/{}", id_of(&filed.body));

    let res = app
        .patch(&uri, &insured.admin, json!({ "status": "under_investigation" }))
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let reread = app.get(&uri, &insured.admin).await;
    assert_eq!(reread.body["status"], "under_investigation");

    let illegal = app.patch(&uri, &insured.admin, json!({ "status": "paid" })).await;
    assert_eq!(illegal.status, StatusCode::CONFLICT);
    assert!(illegal.body["error"]
        .as_str()
        .unwrap()
        .contains("cannot move from 'under_investigation' to 'paid'"));

    let reread = app.get(&uri, &insured.admin).await;
    assert_eq!(reread.body["status"], "under_investigation");

    for status in ["approved", "paid"] {
        let res = app.patch(&uri, &insured.admin, json!({ "status": status })).await;
        assert_eq!(res.status, StatusCode::OK);
    }
    let terminal = app
        .patch(&uri, &insured.admin, json!({ "status": "disputed" }))
        .await;
    assert_eq!(terminal.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_claim_above_coverage_is_rejected() {
    let app = TestApp::new();
    let insured = insured_startup(&app).await;

    let res = app
        .post(
            "/api/customer/claims",
            &insured.customer,
            json!({
                "policy_id": insured.policy_id,
                "amount": "25000.01",
                "description": "Total loss",
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .post(
            "/api/customer/claims",
            &insured.customer,
            json!({
                "policy_id": insured.policy_id,
                "amount": "1200.005",
                "description": "Cracked screen",
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.text.contains("decimal places"), "{}", res.text);
}

#[tokio::test]
async fn test_claims_are_scoped_to_the_owning_startup() {
    let app = TestApp::new();
    let insured = insured_startup(&app).await;
    let (other, _) = onboard_customer(&app, "bo@greenleaf.io", "GreenLeaf Foods").await;

    let res = app
        .post(
            "/api/customer/claims",
            &other,
            json!({
                "policy_id": insured.policy_id,
                "amount": "10",
                "description": "Not my policy",
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let own = app.get("/api/customer/claims", &other).await;
    assert_eq!(own.body, Value::Array(vec![]));
}

#[tokio::test]
async fn test_admin_claim_search_and_status_filter() {
    let app = TestApp::new();
    let insured = insured_startup(&app).await;

    for description in ["Flooded warehouse", "Stolen laptop"] {
        app.post(
            "/api/customer/claims",
            &insured.customer,
            json!({
                "policy_id": insured.policy_id,
                "amount": "100",
                "description": description,
            }),
        )
        .await;
    }

    let res = app.get("/api/admin/claims?search=flood", &insured.admin).await;
    assert_eq!(res.body.as_array().unwrap().len(), 1);

    let res = app.get("/api/admin/claims?status=new", &insured.admin).await;
    assert_eq!(res.body.as_array().unwrap().len(), 2);

    let res = app
        .get("/api/admin/claims?search=flood&status=paid", &insured.admin)
        .await;
    assert_eq!(res.body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_customer_without_profile_gets_not_found() {
    let app = TestApp::new();
    let (_, token) = app
        .login("new@startup.io", insureinfra_core::domain::Role::Customer)
        .await;

    let res = app.get("/api/customer/profile", &token).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app.get("/api/customer/applications", &token).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}
