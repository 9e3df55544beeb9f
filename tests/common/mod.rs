#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Duration;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use insureinfra_core::domain::{Role, User};
use insureinfra_core::middleware::auth::AuthKeys;
use insureinfra_core::ports::Repositories;
use insureinfra_core::{create_app, AppState};

pub const SESSION_SECRET: &str = "integration-session-secret-0123456789";
pub const API_KEY_PEPPER: &str = "integration-api-key-pepper-0123456789";

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
}

pub struct Response {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
    pub text: String,
}

impl TestApp {
    pub fn new() -> Self {
        let state = AppState::new(
            Repositories::in_memory(),
            AuthKeys::new(SESSION_SECRET, API_KEY_PEPPER),
        );
        Self {
            app: create_app(state.clone()),
            state,
        }
    }

    /// Registers a user and mints a session token for it.
    pub async fn login(&self, email: &str, role: Role) -> (User, String) {
        let user = self
            .state
            .repos
            .users
            .insert(&User::new(email.to_string(), role))
            .await
            .unwrap();
        let token = self
            .state
            .auth
            .issue_session(user.id, role, Duration::hours(1))
            .unwrap();
        (user, token)
    }

    /// A fresh admin session; each call registers a new underwriter.
    pub async fn admin(&self) -> String {
        let email = format!("underwriter+{}@insureinfra.io", Uuid::new_v4().simple());
        self.login(&email, Role::Admin).await.1
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let text = String::from_utf8_lossy(&bytes).to_string();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        Response {
            status,
            headers,
            body,
            text,
        }
    }

    pub async fn get(&self, uri: &str, token: &str) -> Response {
        self.send("GET", uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> Response {
        self.send("POST", uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> Response {
        self.send("PATCH", uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> Response {
        self.send("PUT", uri, Some(token), Some(body)).await
    }
}

pub fn id_of(body: &Value) -> String {
    body["id"].as_str().unwrap().to_string()
}

pub fn product_body(name: &str, base_price: &str, min: &str, max: &str) -> Value {
    serde_json::json!({
        "name": name,
        "description": "Covers accidental damage and theft",
        "base_price": base_price,
        "coverage_min": min,
        "coverage_max": max,
    })
}

/// A customer with a startup profile; returns (token, startup id).
pub async fn onboard_customer(app: &TestApp, email: &str, company: &str) -> (String, String) {
    let (_, token) = app.login(email, Role::Customer).await;
    let res = app
        .put(
            "/api/customer/profile",
            &token,
            serde_json::json!({
                "company_name": company,
                "founder_name": "Ada Founder",
                "founder_email": email,
                "industry": "Hardware",
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.text);
    (token, id_of(&res.body))
}
