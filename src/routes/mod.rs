pub mod assessment;
pub mod catalog;
pub mod directory;
pub mod health;
pub mod notifications;
pub mod reports;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::middleware::{cors::api_cors, rate_limit};
use crate::AppState;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/api/assignments/:id",
            axum::routing::delete(assessment::delete_assignment),
        )
        .route(
            "/api/assignments/:id/current-question",
            get(assessment::current_question),
        )
        .route("/api/assignments/:id/answers", post(assessment::submit_answer))
        .route("/api/assignments/:id/result", get(assessment::result))
        .route("/api/assignments/:id/decision", post(assessment::decide))
        .route("/api/answers/:id/manual-score", post(assessment::manual_score))
        .route(
            "/api/categories",
            get(catalog::list_categories).post(catalog::create_category),
        )
        .route(
            "/api/tests",
            get(catalog::list_tests).post(catalog::create_test),
        )
        .route(
            "/api/tests/:id",
            get(catalog::get_test)
                .patch(catalog::update_test)
                .delete(catalog::delete_test),
        )
        .route("/api/tests/:id/questions", post(catalog::create_question))
        .route("/api/tests/:id/assignments", post(assessment::assign_test))
        .route(
            "/api/questions/:id",
            axum::routing::patch(catalog::update_question).delete(catalog::delete_question),
        )
        .route("/api/companies/register", post(directory::register_company))
        .route(
            "/api/admin/companies/pending",
            get(directory::pending_companies),
        )
        .route(
            "/api/admin/companies/:id/approve",
            post(directory::approve_company),
        )
        .route(
            "/api/admin/companies/:id/reject",
            post(directory::reject_company),
        )
        .route(
            "/api/register/applicant",
            post(directory::register_applicant),
        )
        .route("/api/register/employer", post(directory::register_employer))
        .route("/api/company/employers", get(directory::list_employers))
        .route(
            "/api/company/employers/:id/:action",
            post(directory::manage_employer),
        )
        .route("/api/company/applicants", get(directory::list_applicants))
        .route("/api/invitations", post(directory::invite_applicant))
        .route("/api/notifications", get(notifications::list))
        .route(
            "/api/notifications/:id/read",
            post(notifications::mark_read),
        )
        .route(
            "/api/dashboard/applicant",
            get(reports::applicant_dashboard),
        )
        .route("/api/dashboard/employer", get(reports::employer_dashboard))
        .route("/api/reports", get(reports::employer_reports))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit::RateLimiter::new(state.config.api_rps),
            rate_limit::limit_requests,
        ));

    Router::new()
        .route("/health", get(health::health))
        .merge(api)
        .with_state(state)
        .layer(api_cors())
        .layer(TraceLayer::new_for_http())
}
