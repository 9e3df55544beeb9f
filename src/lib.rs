pub mod adapters;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod ports;
pub mod services;
pub mod startup;
pub mod utils;
pub mod validation;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Instant;

use crate::handlers::admin;
use crate::health::DependencyChecker;
use crate::middleware::auth::{
    require_admin, require_api_key, require_customer, require_session, AuthKeys,
};
use crate::middleware::request_logger::{request_logger_middleware, RequestLogConfig};
use crate::ports::Repositories;

#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub auth: Arc<AuthKeys>,
    pub health_checks: Arc<Vec<Arc<dyn DependencyChecker>>>,
    pub start_time: Instant,
    pub request_log: RequestLogConfig,
}

impl AppState {
    pub fn new(repos: Repositories, auth: AuthKeys) -> Self {
        Self {
            repos,
            auth: Arc::new(auth),
            health_checks: Arc::new(Vec::new()),
            start_time: Instant::now(),
            request_log: RequestLogConfig::default(),
        }
    }

    pub fn with_health_checks(mut self, checks: Vec<Arc<dyn DependencyChecker>>) -> Self {
        self.health_checks = Arc::new(checks);
        self
    }

    pub fn with_request_log(mut self, request_log: RequestLogConfig) -> Self {
        self.request_log = request_log;
        self
    }
}

pub fn create_app(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route(
            "/products",
            get(admin::products::list_products).post(admin::products::create_product),
        )
        .route(
            "/products/:id",
            get(admin::products::get_product)
                .patch(admin::products::update_product)
                .delete(admin::products::delete_product),
        )
        .route("/startups", get(admin::startups::list_startups))
        .route(
            "/startups/:id",
            get(admin::startups::get_startup).patch(admin::startups::update_startup),
        )
        .route("/startups/:id/api-key", post(admin::startups::issue_api_key))
        .route("/applications", get(admin::applications::list_applications))
        .route(
            "/applications/:id",
            get(admin::applications::get_application)
                .patch(admin::applications::update_application),
        )
        .route("/policies", get(admin::applications::list_policies))
        .route("/policies/:id", get(admin::applications::get_policy))
        .route("/claims", get(admin::claims::list_claims))
        .route(
            "/claims/:id",
            get(admin::claims::get_claim).patch(admin::claims::update_claim),
        )
        .route("/transactions", get(admin::payments::list_transactions))
        .route("/transactions/export", get(admin::payments::export_transactions))
        .route("/settlements", get(admin::payments::list_settlements))
        .route("/settlements/run", post(admin::payments::run_settlements))
        .route("/settlements/:id", get(admin::payments::get_settlement))
        .route("/calculate-premium", post(admin::reports::calculate_premium))
        .route("/analytics", get(admin::reports::analytics))
        .route("/audit-logs", get(admin::reports::list_audit_logs))
        .route("/users", get(admin::reports::list_users))
        .route("/settings", get(admin::settings::list_settings))
        .route("/settings/:key", put(admin::settings::put_setting))
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    let customer_routes = Router::new()
        .route(
            "/profile",
            get(handlers::customer::get_profile).put(handlers::customer::put_profile),
        )
        .route("/products", get(handlers::customer::list_products))
        .route(
            "/applications",
            get(handlers::customer::list_applications).post(handlers::customer::create_application),
        )
        .route("/policies", get(handlers::customer::list_policies))
        .route(
            "/claims",
            get(handlers::customer::list_claims).post(handlers::customer::create_claim),
        )
        .route("/transactions", get(handlers::customer::list_transactions))
        .route_layer(from_fn_with_state(state.clone(), require_customer));

    let auth_routes = Router::new()
        .route("/session", get(handlers::auth::session))
        .route_layer(from_fn_with_state(state.clone(), require_session));

    let partner_routes = Router::new()
        .route("/premium", post(handlers::partner::premium_quote))
        .route("/payments", post(handlers::partner::create_payment))
        .route("/payments/:id", get(handlers::partner::get_payment))
        .route_layer(from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/admin", admin_routes)
        .nest("/api/customer", customer_routes)
        .nest("/api/auth", auth_routes)
        .nest("/api/v1", partner_routes)
        .layer(from_fn_with_state(state.request_log, request_logger_middleware))
        .with_state(state)
}
