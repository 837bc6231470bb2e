//! HTTP surface for the submission workflow: the public intake and registry
//! lookup endpoints, the guarded admin reporting endpoints, and the auth
//! gate. Handlers map domain errors onto the HTTP taxonomy here; production
//! runs never leak store error text.

use std::sync::Arc;

use axum::extract::{Path, Query, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::auth::{AuthError, AuthService};
use crate::config::AppEnvironment;
use crate::submissions::{
    export, ListRequest, NewSubmission, PageRequest, SortField, SortOrder, SubmissionError,
    SubmissionFilter, SubmissionKind, SubmissionService,
};

/// Shared state for every API handler.
pub struct ApiContext {
    pub submissions: Arc<SubmissionService>,
    pub auth: Arc<AuthService>,
    pub environment: AppEnvironment,
}

/// Build the `/api` router. Admin reporting routes are wrapped by the
/// bearer-token guard; signup and login stay outside it.
pub fn api_router(ctx: Arc<ApiContext>) -> Router {
    let admin = Router::new()
        .route("/dashboard", get(dashboard))
        .route("/submissions", get(list_form_submissions))
        .route("/submissions/:id", get(get_form_submission))
        .route("/submissions/:id/status", patch(update_submission_status))
        .route("/export", get(export_form_submissions))
        .route("/rights-submissions", get(list_rights_submissions))
        .route("/rights-submissions/:id", get(get_rights_submission))
        .route("/export-rights", get(export_rights_submissions))
        .route_layer(middleware::from_fn_with_state(ctx.clone(), require_admin))
        .route("/admin-signup", post(admin_signup))
        .route("/admin-login", post(admin_login));

    Router::new()
        .nest("/api/admin", admin)
        .route(
            "/api/shareholders/:reg_account_number",
            get(lookup_shareholder),
        )
        .route("/api/rights-submissions", post(create_rights_submission))
        .with_state(ctx)
}

/// Uniform guard for admin routes: a missing, malformed, expired, or
/// unknown bearer token is a 401 with one generic message.
async fn require_admin(
    State(ctx): State<Arc<ApiContext>>,
    request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match token.and_then(|token| ctx.auth.authorize(token)) {
        Some(_) => next.run(request).await,
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "message": "Authentication required" })),
        )
            .into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct Credentials {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

async fn admin_signup(
    State(ctx): State<Arc<ApiContext>>,
    Json(credentials): Json<Credentials>,
) -> Response {
    match ctx
        .auth
        .signup(&credentials.email, &credentials.password)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "success": true, "message": "Admin signup successful" })),
        )
            .into_response(),
        Err(AuthError::MissingFields) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "message": AuthError::MissingFields.to_string() })),
        )
            .into_response(),
        Err(AuthError::DuplicateEmail) => (
            StatusCode::CONFLICT,
            Json(json!({ "success": false, "message": AuthError::DuplicateEmail.to_string() })),
        )
            .into_response(),
        Err(err) => internal_error(&ctx, "Failed to signup", &err),
    }
}

async fn admin_login(
    State(ctx): State<Arc<ApiContext>>,
    Json(credentials): Json<Credentials>,
) -> Response {
    match ctx
        .auth
        .login(&credentials.email, &credentials.password)
        .await
    {
        Ok(session) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Admin login successful",
                "token": session.token,
                "expiresAt": session.expires_at,
            })),
        )
            .into_response(),
        Err(AuthError::InvalidCredentials) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "message": "Invalid email or password" })),
        )
            .into_response(),
        Err(err) => internal_error(&ctx, "Failed to log in", &err),
    }
}

async fn dashboard(State(ctx): State<Arc<ApiContext>>) -> Response {
    match ctx.submissions.dashboard().await {
        Ok(totals) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": totals })),
        )
            .into_response(),
        Err(err) => internal_error(&ctx, "Failed to get dashboard statistics", &err),
    }
}

/// Query parameters accepted by both listing endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    page: Option<u64>,
    limit: Option<u64>,
    search: Option<String>,
    status: Option<String>,
    sort_by: Option<String>,
    sort_order: Option<String>,
    rights_claiming: Option<String>,
}

impl ListParams {
    fn into_request(self, kind: SubmissionKind) -> ListRequest {
        ListRequest {
            filter: SubmissionFilter::for_kind(kind)
                .with_search(self.search)
                .with_status(self.status)
                .with_claiming(self.rights_claiming.as_deref()),
            sort: SortField::parse_or_default(self.sort_by.as_deref()),
            order: SortOrder::parse_or_default(self.sort_order.as_deref()),
            page: PageRequest::new(self.page, self.limit),
        }
    }
}

async fn list_form_submissions(
    State(ctx): State<Arc<ApiContext>>,
    Query(params): Query<ListParams>,
) -> Response {
    list_submissions(&ctx, params, SubmissionKind::Form).await
}

async fn list_rights_submissions(
    State(ctx): State<Arc<ApiContext>>,
    Query(params): Query<ListParams>,
) -> Response {
    list_submissions(&ctx, params, SubmissionKind::Rights).await
}

async fn list_submissions(
    ctx: &Arc<ApiContext>,
    params: ListParams,
    kind: SubmissionKind,
) -> Response {
    match ctx.submissions.list(params.into_request(kind)).await {
        Ok(page) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": page.items,
                "pagination": page.pagination,
            })),
        )
            .into_response(),
        Err(err) => internal_error(ctx, "Failed to get submissions", &err),
    }
}

async fn get_form_submission(
    State(ctx): State<Arc<ApiContext>>,
    Path(id): Path<i64>,
) -> Response {
    get_submission(&ctx, id, SubmissionKind::Form).await
}

async fn get_rights_submission(
    State(ctx): State<Arc<ApiContext>>,
    Path(id): Path<i64>,
) -> Response {
    get_submission(&ctx, id, SubmissionKind::Rights).await
}

async fn get_submission(ctx: &Arc<ApiContext>, id: i64, kind: SubmissionKind) -> Response {
    match ctx.submissions.get(id).await {
        Ok(submission) if submission.kind == kind => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": submission.view() })),
        )
            .into_response(),
        Ok(_) | Err(SubmissionError::NotFound) => not_found("Submission not found"),
        Err(err) => internal_error(ctx, "Failed to get submission details", &err),
    }
}

#[derive(Debug, Deserialize)]
struct StatusUpdate {
    #[serde(default)]
    status: String,
}

async fn update_submission_status(
    State(ctx): State<Arc<ApiContext>>,
    Path(id): Path<i64>,
    Json(update): Json<StatusUpdate>,
) -> Response {
    match ctx.submissions.update_status(id, &update.status).await {
        Ok(submission) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Submission status updated successfully",
                "data": submission.view(),
            })),
        )
            .into_response(),
        Err(SubmissionError::NotFound) => not_found("Submission not found"),
        Err(err @ SubmissionError::InvalidStatus(_)) => bad_request(&err),
        Err(err) => internal_error(&ctx, "Failed to update submission status", &err),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportParams {
    format: Option<String>,
    rights_claiming: Option<String>,
}

async fn export_form_submissions(
    State(ctx): State<Arc<ApiContext>>,
    Query(params): Query<ExportParams>,
) -> Response {
    let filter = SubmissionFilter::for_kind(SubmissionKind::Form);
    export_submissions(&ctx, params, filter, export::form_columns(), "submissions.csv").await
}

async fn export_rights_submissions(
    State(ctx): State<Arc<ApiContext>>,
    Query(params): Query<ExportParams>,
) -> Response {
    let filter = SubmissionFilter::for_kind(SubmissionKind::Rights)
        .with_claiming(params.rights_claiming.as_deref());
    export_submissions(
        &ctx,
        params,
        filter,
        export::rights_columns(),
        "rights_submissions.csv",
    )
    .await
}

async fn export_submissions(
    ctx: &Arc<ApiContext>,
    params: ExportParams,
    filter: SubmissionFilter,
    columns: Vec<export::ExportColumn>,
    filename: &str,
) -> Response {
    let rows = match ctx.submissions.export(&filter).await {
        Ok(rows) => rows,
        Err(err) => return internal_error(ctx, "Failed to export data", &err),
    };

    if params.format.as_deref() == Some("csv") {
        let csv = match export::write_csv(&columns, &rows) {
            Ok(csv) => csv,
            Err(err) => return internal_error(ctx, "Failed to export data", &err),
        };
        (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename={filename}"),
                ),
            ],
            csv,
        )
            .into_response()
    } else {
        let views: Vec<_> = rows.iter().map(|row| row.view()).collect();
        (
            StatusCode::OK,
            Json(json!({ "success": true, "data": views, "count": views.len() })),
        )
            .into_response()
    }
}

async fn lookup_shareholder(
    State(ctx): State<Arc<ApiContext>>,
    Path(reg_account_number): Path<String>,
) -> Response {
    match ctx.submissions.find_shareholder(&reg_account_number).await {
        Ok(holder) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": holder })),
        )
            .into_response(),
        Err(SubmissionError::UnknownShareholder) => not_found("Shareholder not found"),
        Err(err) => internal_error(&ctx, "Failed to get shareholder", &err),
    }
}

async fn create_rights_submission(
    State(ctx): State<Arc<ApiContext>>,
    Json(payload): Json<NewSubmission>,
) -> Response {
    match ctx
        .submissions
        .submit(SubmissionKind::Rights, payload)
        .await
    {
        Ok(submission) => (
            StatusCode::CREATED,
            Json(json!({ "success": true, "data": submission.view() })),
        )
            .into_response(),
        Err(SubmissionError::UnknownShareholder) => not_found("Shareholder not found"),
        Err(
            err @ (SubmissionError::InvalidAction(_)
            | SubmissionError::RenunciationMismatch
            | SubmissionError::NegativeQuantity),
        ) => bad_request(&err),
        Err(err) => internal_error(&ctx, "Failed to create submission", &err),
    }
}

fn bad_request(err: &SubmissionError) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "error": err.to_string() })),
    )
        .into_response()
}

fn not_found(message: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "error": message })),
    )
        .into_response()
}

/// 500s log the underlying error and, outside production, echo it in the
/// response body for debugging.
fn internal_error<E: std::fmt::Display>(
    ctx: &Arc<ApiContext>,
    context: &str,
    err: &E,
) -> Response {
    error!(error = %err, "{context}");
    let message = if ctx.environment.is_production() {
        "Internal server error".to_string()
    } else {
        err.to_string()
    };
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": false, "error": context, "message": message })),
    )
        .into_response()
}
