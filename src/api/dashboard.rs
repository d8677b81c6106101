use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::service::dashboard::{self, session_profile};
use crate::service::{AttendanceService, FeedbackService};
use crate::view::DashboardView;
use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DashboardQuery {
    /// Staff: dashboard, check_in, history, messages. Admin: dashboard, attendance, feedback.
    #[param(example = "history")]
    pub view: Option<String>,
}

/// Content for the current session's dashboard view
#[utoipa::path(
    get,
    path = "/api/dashboard",
    params(DashboardQuery),
    responses(
        (status = 200, description = "View tagged content", body = Object, example = json!({
            "view": "staff_dashboard",
            "data": {
                "name": "John Doe",
                "staff_id": "ICP/2024/001",
                "department": "Computer Science",
                "is_checked_in": false,
                "unread_messages": 0
            }
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Dashboard"
)]
pub async fn dashboard(
    auth: AuthUser,
    attendance: web::Data<AttendanceService>,
    feedback: web::Data<FeedbackService>,
    query: web::Query<DashboardQuery>,
) -> Result<impl Responder, AppError> {
    let view = DashboardView::resolve(auth.role, query.view.as_deref());
    let profile = session_profile(&attendance, auth.user_id).await?;

    let payload =
        dashboard::build(view, &auth, profile, &attendance, &feedback, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(payload))
}
